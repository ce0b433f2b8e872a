// ABOUTME: SMS PDU codec per 3GPP TS 23.040 / TS 23.038, pure and I/O-free
// ABOUTME: Message model, wire constants and submodule re-exports

//! Encoding and decoding of SMS PDUs (3GPP TS 23.040 §9.2, TS 23.038 §6).
//!
//! The codec is pure: it converts between [`Message`] values and the hex
//! strings exchanged with a modem in PDU mode (`AT+CMGF=0`), and holds no
//! state apart from the reassembly buffers in [`ConcatManager`].
//!
//! ```
//! use atmodem::pdu::{self, Message};
//!
//! let msg = Message::submit("+8613800138000", "Hello");
//! let parts = pdu::encode(&msg).unwrap();
//! assert_eq!(parts.len(), 1);
//!
//! let decoded = pdu::decode(&parts[0].data).unwrap();
//! assert_eq!(decoded.text, "Hello");
//! ```

pub mod address;
pub mod concat;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod gsm7;
pub mod hex;
pub mod timestamp;
pub mod ucs2;

pub use address::{decode_phone_number, encode_phone_number, validate_phone_number, AddressType};
pub use concat::{ConcatBuffer, ConcatManager};
pub use decoder::decode;
pub use encoder::{calculate_parts, encode, message_length};
pub use error::{PduError, PduResult};
pub use gsm7::is_gsm7_compatible;
pub use timestamp::Timestamp;

use num_enum::TryFromPrimitive;

/// Transfer direction / kind of a short message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MessageType {
    /// SMS-DELIVER: network to mobile
    Deliver = 0x00,
    /// SMS-SUBMIT: mobile to network
    Submit = 0x01,
    /// SMS-STATUS-REPORT: delivery outcome for an earlier submit
    StatusReport = 0x02,
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Deliver
    }
}

/// User data alphabet, as carried in the DCS low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MessageEncoding {
    /// GSM 03.38 7-bit default alphabet, packed
    Gsm7Bit = 0x00,
    /// Transparent 8-bit data
    EightBit = 0x04,
    /// UCS-2 (UTF-16 big-endian)
    Ucs2 = 0x08,
}

impl Default for MessageEncoding {
    fn default() -> Self {
        MessageEncoding::Gsm7Bit
    }
}

/// Relative validity period octet (TS 23.040 §9.2.3.12.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityPeriod(pub u8);

impl ValidityPeriod {
    pub const ONE_HOUR: Self = Self(0x0B);
    pub const SIX_HOURS: Self = Self(0x47);
    pub const ONE_DAY: Self = Self(0xA7);
    pub const ONE_WEEK: Self = Self(0xAD);
    /// 63 weeks, the largest relative value
    pub const MAXIMUM: Self = Self(0xFF);
}

/// Delivery outcome from an SMS-STATUS-REPORT (TS 23.040 §9.2.3.15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStatus(pub u8);

impl DeliveryStatus {
    /// Message reached the recipient (or was replaced by the SC).
    pub fn is_success(self) -> bool {
        self.0 <= 0x02
    }

    /// Temporary failure; the service centre keeps retrying.
    pub fn is_temporary_error(self) -> bool {
        (0x20..=0x3F).contains(&self.0)
    }

    /// Permanent failure; no further delivery attempts.
    pub fn is_permanent_error(self) -> bool {
        (0x40..=0x6F).contains(&self.0)
    }
}

/// Capacity of a single SMS in 7-bit septets.
pub const MAX_SINGLE_7BIT: usize = 160;
/// Capacity of a single SMS in 8-bit octets.
pub const MAX_SINGLE_8BIT: usize = 140;
/// Capacity of a single SMS in UCS-2 code units.
pub const MAX_SINGLE_UCS2: usize = 70;
/// Per-part 7-bit capacity after the 6-byte concatenation UDH.
pub const MAX_CONCAT_7BIT: usize = 153;
/// Per-part 8-bit capacity after the 6-byte concatenation UDH.
pub const MAX_CONCAT_8BIT: usize = 134;
/// Per-part UCS-2 capacity after the 6-byte concatenation UDH.
pub const MAX_CONCAT_UCS2: usize = 67;

/// A short message, the central value of the codec.
///
/// Produced by [`decode`] for inbound PDUs and consumed by [`encode`] for
/// outbound ones; immutable once constructed. `parts == 0` means the
/// message is not concatenated; otherwise `1 <= part <= parts` and all
/// fragments share `reference`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub message_type: MessageType,
    /// Peer phone number, optionally `+`-prefixed (E.164)
    pub phone_number: String,
    pub text: String,
    pub encoding: MessageEncoding,
    /// Service centre address; empty means "use the modem default"
    pub smsc: String,
    /// Service centre timestamp (deliver and status-report only)
    pub timestamp: Option<Timestamp>,
    /// Relative validity period (submit only); `None` omits the octet
    pub validity_period: Option<ValidityPeriod>,
    /// Ask the network for an SMS-STATUS-REPORT
    pub request_status_report: bool,
    /// Class-0 flash message, shown immediately and not stored
    pub flash: bool,
    /// Raw user data header bytes, excluding the leading length octet
    pub udh: Vec<u8>,
    /// Concatenation reference shared by all fragments
    pub reference: u8,
    /// Total fragment count; 0 for a single-part message
    pub parts: u8,
    /// 1-based fragment index
    pub part: u8,
    /// Delivery outcome (status-report only)
    pub delivery_status: Option<DeliveryStatus>,
}

impl Message {
    /// Build an SMS-SUBMIT with the encoding picked from the text: the
    /// 7-bit alphabet when it suffices, UCS-2 otherwise.
    pub fn submit(phone_number: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let encoding = if is_gsm7_compatible(&text) {
            MessageEncoding::Gsm7Bit
        } else {
            MessageEncoding::Ucs2
        };
        Message {
            message_type: MessageType::Submit,
            phone_number: phone_number.into(),
            text,
            encoding,
            ..Message::default()
        }
    }

    /// Check the structural invariants before encoding.
    pub fn validate(&self) -> PduResult<()> {
        if !validate_phone_number(&self.phone_number) {
            return Err(PduError::InvalidPhoneNumber(self.phone_number.clone()));
        }
        if !self.smsc.is_empty() && !validate_phone_number(&self.smsc) {
            return Err(PduError::InvalidSmsc(self.smsc.clone()));
        }
        if self.text.is_empty() && self.message_type == MessageType::Submit {
            return Err(PduError::InvalidPdu("submit requires message text"));
        }
        if self.parts > 0 && (self.part < 1 || self.part > self.parts) {
            return Err(PduError::InvalidUdh("part index outside 1..=parts"));
        }
        Ok(())
    }
}

/// An encoded PDU ready for `AT+CMGS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    /// Uppercase hex, SMSC prefix included
    pub data: String,
    /// Byte count after the SMSC prefix, the `AT+CMGS=<n>` argument
    pub tpdu_length: usize,
}
