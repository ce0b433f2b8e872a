// ABOUTME: Configurable set of final-response tokens terminating a command
// ABOUTME: Prefix matching avoids misclassifying payload lines that mention OK

/// Line prefixes that terminate the response to a pending command.
///
/// Matching is by **prefix**: a `+CMGL` payload line that happens to
/// contain `OK` in its hex must not end collection early.
#[derive(Debug, Clone)]
pub struct ResponseSet {
    pub ok: String,
    pub error: String,
    pub no_carrier: String,
    pub no_answer: String,
    pub no_dialtone: String,
    pub busy: String,
    pub connect: String,
    pub cme_error: String,
    pub cms_error: String,
    /// SMS payload prompt emitted after `AT+CMGS=<n>`
    pub prompt: String,
    /// Additional vendor-specific final responses
    pub custom_final: Vec<String>,
}

impl Default for ResponseSet {
    fn default() -> Self {
        ResponseSet {
            ok: "OK".into(),
            error: "ERROR".into(),
            no_carrier: "NO CARRIER".into(),
            no_answer: "NO ANSWER".into(),
            no_dialtone: "NO DIALTONE".into(),
            busy: "BUSY".into(),
            connect: "CONNECT".into(),
            cme_error: "+CME ERROR:".into(),
            cms_error: "+CMS ERROR:".into(),
            prompt: ">".into(),
            custom_final: Vec::new(),
        }
    }
}

impl ResponseSet {
    fn all_final(&self) -> impl Iterator<Item = &str> {
        [
            self.ok.as_str(),
            self.error.as_str(),
            self.no_carrier.as_str(),
            self.no_answer.as_str(),
            self.no_dialtone.as_str(),
            self.busy.as_str(),
            self.connect.as_str(),
            self.cme_error.as_str(),
            self.cms_error.as_str(),
            self.prompt.as_str(),
        ]
        .into_iter()
        .chain(self.custom_final.iter().map(String::as_str))
    }

    /// True when `line` terminates a command response.
    pub fn is_final(&self, line: &str) -> bool {
        self.all_final()
            .any(|token| !token.is_empty() && line.starts_with(token))
    }

    /// True when `line` reports success.
    pub fn is_success(&self, line: &str) -> bool {
        !self.ok.is_empty() && line.starts_with(&self.ok)
    }

    /// True when `line` reports a modem-side failure.
    pub fn is_error(&self, line: &str) -> bool {
        [&self.error, &self.cme_error, &self.cms_error]
            .into_iter()
            .any(|token| !token.is_empty() && line.starts_with(token))
    }
}
