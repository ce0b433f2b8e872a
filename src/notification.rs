// ABOUTME: Configurable set of URC prefixes and a parser for their payloads
// ABOUTME: Registration URCs double as query responses and are routed by in-flight state

/// Line prefixes identifying unsolicited result codes.
///
/// A line matching one of these never belongs to a pending command's
/// response, with one exception: the registration prefixes (`+CREG:`,
/// `+CGREG:`, `+CEREG:`) are also the solicited responses to the matching
/// query commands. Those are listed in `solicited_overlap` and are only
/// treated as URCs while no command is collecting a response.
#[derive(Debug, Clone)]
pub struct NotificationSet {
    pub ring: String,
    pub sms_received: String,
    pub sms_content: String,
    pub sms_status_report: String,
    pub cell_broadcast: String,
    pub call_ring: String,
    pub caller_id: String,
    pub call_waiting: String,
    pub network_registration: String,
    pub gprs_registration: String,
    pub eps_registration: String,
    pub ussd: String,
    pub indicator_change: String,
    /// Additional vendor-specific URC prefixes
    pub custom: Vec<String>,
    /// Prefixes that are solicited responses while a command is in flight
    pub solicited_overlap: Vec<String>,
}

impl Default for NotificationSet {
    fn default() -> Self {
        NotificationSet {
            ring: "RING".into(),
            sms_received: "+CMTI:".into(),
            sms_content: "+CMT:".into(),
            sms_status_report: "+CDS:".into(),
            cell_broadcast: "+CBM:".into(),
            call_ring: "+CRING:".into(),
            caller_id: "+CLIP:".into(),
            call_waiting: "+CCWA:".into(),
            network_registration: "+CREG:".into(),
            gprs_registration: "+CGREG:".into(),
            eps_registration: "+CEREG:".into(),
            ussd: "+CUSD:".into(),
            indicator_change: "+CIEV:".into(),
            custom: Vec::new(),
            solicited_overlap: vec!["+CREG:".into(), "+CGREG:".into(), "+CEREG:".into()],
        }
    }
}

impl NotificationSet {
    fn all(&self) -> impl Iterator<Item = &str> {
        [
            self.ring.as_str(),
            self.sms_received.as_str(),
            self.sms_content.as_str(),
            self.sms_status_report.as_str(),
            self.cell_broadcast.as_str(),
            self.call_ring.as_str(),
            self.caller_id.as_str(),
            self.call_waiting.as_str(),
            self.network_registration.as_str(),
            self.gprs_registration.as_str(),
            self.eps_registration.as_str(),
            self.ussd.as_str(),
            self.indicator_change.as_str(),
        ]
        .into_iter()
        .chain(self.custom.iter().map(String::as_str))
    }

    /// Classify `line` given whether a command is currently collecting
    /// its response.
    pub fn is_notification(&self, line: &str, command_in_flight: bool) -> bool {
        let matched = self
            .all()
            .any(|prefix| !prefix.is_empty() && line.starts_with(prefix));
        if !matched {
            return false;
        }
        if command_in_flight
            && self
                .solicited_overlap
                .iter()
                .any(|prefix| !prefix.is_empty() && line.starts_with(prefix))
        {
            return false;
        }
        true
    }
}

/// A URC split into its kind and comma-separated parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Prefix before the colon, e.g. `+CMTI`, or the whole line for
    /// bare URCs like `RING`
    pub kind: String,
    /// Trimmed parameters with surrounding quotes removed
    pub params: Vec<String>,
}

impl Notification {
    /// Parse a raw URC line.
    pub fn parse(line: &str) -> Notification {
        match line.split_once(':') {
            Some((kind, rest)) => Notification {
                kind: kind.trim().to_owned(),
                params: rest
                    .split(',')
                    .map(|p| p.trim().trim_matches('"').to_owned())
                    .filter(|p| !p.is_empty())
                    .collect(),
            },
            None => Notification {
                kind: line.trim().to_owned(),
                params: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_default_urcs() {
        let set = NotificationSet::default();
        for line in ["RING", "+CMTI: \"SM\",3", "+CLIP: \"+49170\",145", "+CIEV: 1,1"] {
            assert!(set.is_notification(line, false), "{line}");
            assert!(set.is_notification(line, true), "{line}");
        }
    }

    #[test]
    fn response_lines_are_not_urcs() {
        let set = NotificationSet::default();
        assert!(!set.is_notification("+CSQ: 20,99", false));
        assert!(!set.is_notification("OK", false));
        assert!(!set.is_notification("07911326040000F0", false));
    }

    #[test]
    fn registration_lines_follow_in_flight_state() {
        let set = NotificationSet::default();
        // Idle: an unsolicited registration change is a URC.
        assert!(set.is_notification("+CREG: 1", false));
        // While AT+CREG? is collecting, the same prefix is its response.
        assert!(!set.is_notification("+CREG: 0,1", true));
    }

    #[test]
    fn parses_parameters() {
        let n = Notification::parse("+CMTI: \"SM\",3");
        assert_eq!(n.kind, "+CMTI");
        assert_eq!(n.params, ["SM", "3"]);

        let bare = Notification::parse("RING");
        assert_eq!(bare.kind, "RING");
        assert!(bare.params.is_empty());
    }
}
