// ABOUTME: Configurable set of AT command strings for named operations
// ABOUTME: Vendor-neutral defaults, overridable for non-conformant modems

/// The AT strings a [`Modem`](crate::Modem) sends for each named operation.
///
/// Defaults follow 3GPP TS 27.005/27.007 and work on mainstream modules
/// (SIMCom, Quectel, Huawei, u-blox). Override individual fields for
/// vendors that deviate.
#[derive(Debug, Clone)]
pub struct CommandSet {
    // Basic
    pub test: String,
    pub echo_off: String,
    pub echo_on: String,
    pub reset: String,
    pub factory_reset: String,
    pub save_settings: String,

    // Identification
    pub manufacturer: String,
    pub model: String,
    pub revision: String,
    pub serial_number: String,
    pub imsi: String,
    pub iccid: String,

    // Radio
    pub signal_quality: String,
    pub network_registration: String,
    pub gprs_registration: String,

    // SMS
    pub sms_format: String,
    pub list_sms: String,
    pub read_sms: String,
    pub delete_sms: String,
    pub send_sms: String,

    // Call control
    pub dial: String,
    pub answer: String,
    pub hangup: String,
    pub caller_id: String,
}

impl Default for CommandSet {
    fn default() -> Self {
        CommandSet {
            test: "AT".into(),
            echo_off: "ATE0".into(),
            echo_on: "ATE1".into(),
            reset: "ATZ".into(),
            factory_reset: "AT&F".into(),
            save_settings: "AT&W".into(),

            manufacturer: "AT+CGMI".into(),
            model: "AT+CGMM".into(),
            revision: "AT+CGMR".into(),
            serial_number: "AT+CGSN".into(),
            imsi: "AT+CIMI".into(),
            iccid: "AT+CCID".into(),

            signal_quality: "AT+CSQ".into(),
            network_registration: "AT+CREG".into(),
            gprs_registration: "AT+CGREG".into(),

            sms_format: "AT+CMGF".into(),
            list_sms: "AT+CMGL".into(),
            read_sms: "AT+CMGR".into(),
            delete_sms: "AT+CMGD".into(),
            send_sms: "AT+CMGS".into(),

            dial: "ATD".into(),
            answer: "ATA".into(),
            hangup: "ATH".into(),
            caller_id: "AT+CLIP".into(),
        }
    }
}
