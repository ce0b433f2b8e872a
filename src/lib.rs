// ABOUTME: Crate root for the AT modem session library and SMS PDU codec
// ABOUTME: Declares modules and re-exports the public API surface

//! AT command session layer and 3GPP TS 23.040 SMS PDU codec for cellular
//! modems (SIMCom, Quectel, Huawei, u-blox and friends) on a serial link.
//!
//! Two subsystems make up the crate:
//!
//! * **Session layer** ([`Session`]): a duplex, line-oriented engine over
//!   one serial byte stream. A single reader task classifies every inbound
//!   line as either a response to the command in flight or an unsolicited
//!   result code (`RING`, `+CMTI:` …), which is dispatched to a handler on
//!   its own task. Commands serialize on an internal mutex, so concurrent
//!   callers never interleave on the wire.
//! * **PDU codec** ([`pdu`]): pure, bit-exact encode/decode of SMS PDUs:
//!   GSM 7-bit packing, UCS-2, swapped-nibble phone numbers, service
//!   centre timestamps, and UDH-based concatenation with reassembly.
//!
//! [`Modem`] ties the two together with typed wrappers for the everyday
//! operations.
//!
//! ## Sending a message
//!
//! ```rust,no_run
//! use atmodem::ModemBuilder;
//!
//! # async fn example() -> Result<(), atmodem::AtError> {
//! let modem = ModemBuilder::new("/dev/ttyUSB0").open()?;
//! modem.echo_off().await?;
//! modem.set_sms_format_pdu().await?;
//! modem.send_sms("+8613800138000", "hello").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Watching for unsolicited events
//!
//! ```rust,no_run
//! use atmodem::{ModemBuilder, Notification};
//!
//! # async fn example() -> Result<(), atmodem::AtError> {
//! let modem = ModemBuilder::new("/dev/ttyUSB0").open()?;
//! modem.set_notification_handler(|line| {
//!     let urc = Notification::parse(&line);
//!     if urc.kind == "+CMTI" {
//!         println!("new message in slot {:?}", urc.params.last());
//!     }
//! });
//! # Ok(())
//! # }
//! ```
//!
//! The codec is usable on its own, without a modem:
//!
//! ```rust
//! use atmodem::pdu::{self, Message};
//!
//! let parts = pdu::encode(&Message::submit("+8613800138000", "Hello")).unwrap();
//! assert_eq!(parts[0].tpdu_length, 19);
//! ```

pub mod command;
pub mod error;
pub mod framer;
pub mod modem;
pub mod notification;
pub mod pdu;
pub mod response;
pub mod session;


pub use command::CommandSet;
pub use error::{AtError, AtResult};
pub use modem::{
    Modem, ModemBuilder, Registration, SerialConfig, SignalQuality, SmsListFilter, SmsRecord,
    SmsStatus,
};
pub use notification::{Notification, NotificationSet};
pub use response::ResponseSet;
pub use session::{NotificationHandler, Session, SessionConfig};
