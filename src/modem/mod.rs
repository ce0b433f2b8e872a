// ABOUTME: High-level modem facade composing the session layer and PDU codec
// ABOUTME: Exports the builder, command wrappers and SMS record types

//! Modem facade.
//!
//! [`Modem`] wraps a [`Session`] with typed wrappers for the common AT
//! operations: identification queries, signal and registration state, SMS
//! in PDU mode, and basic call control.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use atmodem::ModemBuilder;
//!
//! # async fn example() -> Result<(), atmodem::AtError> {
//! let modem = ModemBuilder::new("/dev/ttyUSB0").baud_rate(115200).open()?;
//!
//! modem.test().await?;
//! modem.echo_off().await?;
//! modem.set_sms_format_pdu().await?;
//!
//! let signal = modem.signal_quality().await?;
//! println!("rssi {} ber {}", signal.rssi, signal.ber);
//!
//! modem.send_sms("+8613800138000", "hello from rust").await?;
//! modem.close();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod commands;
pub mod sms;

pub use builder::{ModemBuilder, SerialConfig};
pub use commands::{Registration, SignalQuality};
pub use sms::{SmsListFilter, SmsRecord, SmsStatus};

use crate::command::CommandSet;
use crate::error::AtResult;
use crate::session::{Session, SessionConfig};
use tokio::io::{AsyncRead, AsyncWrite};

/// A cellular modem reached over an AT session.
pub struct Modem {
    session: Session,
    commands: CommandSet,
}

impl std::fmt::Debug for Modem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modem").finish_non_exhaustive()
    }
}

impl Modem {
    /// Build a modem over an already-open byte stream.
    ///
    /// [`ModemBuilder`] is the usual entry point; this constructor exists
    /// for custom transports (USB CDC gadgets, TCP-to-serial bridges,
    /// in-memory test streams).
    pub fn from_stream<S>(stream: S, commands: CommandSet, config: SessionConfig) -> Modem
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Modem {
            session: Session::spawn(stream, config),
            commands,
        }
    }

    /// The underlying session, for raw `send_command` access.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Install a handler for unsolicited result codes (`RING`, `+CMTI:` …).
    ///
    /// The handler runs on its own task per URC and must not issue
    /// commands on this modem from inside the callback.
    pub fn set_notification_handler<F>(&self, handler: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.session.set_notification_handler(handler);
    }

    /// Remove the URC handler.
    pub fn clear_notification_handler(&self) {
        self.session.clear_notification_handler();
    }

    /// Send a raw AT command, returning all response lines.
    pub async fn send_command(&self, command: &str) -> AtResult<Vec<String>> {
        self.session.send_command(command).await
    }

    /// Close the connection. Idempotent.
    pub fn close(&self) {
        self.session.close();
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }
}
