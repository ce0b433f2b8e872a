// ABOUTME: Serial transport configuration and modem construction
// ABOUTME: Opens the port via tokio-serial and wires up the session

use crate::command::CommandSet;
use crate::error::{AtError, AtResult};
use crate::modem::Modem;
use crate::notification::NotificationSet;
use crate::response::ResponseSet;
use crate::session::SessionConfig;
use std::time::Duration;
use tokio_serial::SerialPortBuilderExt;

pub use tokio_serial::{DataBits, Parity, StopBits};

/// Serial port parameters for the modem link.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port path, e.g. `/dev/ttyUSB0` or `COM3`
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port_name: String::new(),
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            read_timeout: Duration::from_millis(100),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Builder for a [`Modem`] over a serial port.
///
/// ```rust,no_run
/// use atmodem::ModemBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), atmodem::AtError> {
/// let modem = ModemBuilder::new("/dev/ttyUSB0")
///     .baud_rate(115200)
///     .default_timeout(Duration::from_secs(10))
///     .open()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ModemBuilder {
    serial: SerialConfig,
    commands: CommandSet,
    session: SessionConfig,
}

impl ModemBuilder {
    pub fn new(port_name: impl Into<String>) -> Self {
        ModemBuilder {
            serial: SerialConfig {
                port_name: port_name.into(),
                ..SerialConfig::default()
            },
            ..ModemBuilder::default()
        }
    }

    /// Start from a complete [`SerialConfig`].
    pub fn from_config(serial: SerialConfig) -> Self {
        ModemBuilder {
            serial,
            ..ModemBuilder::default()
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.serial.baud_rate = baud_rate;
        self
    }

    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.serial.data_bits = data_bits;
        self
    }

    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.serial.stop_bits = stop_bits;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.serial.parity = parity;
        self
    }

    /// Serial read pacing; also bounds how quickly close() is observed on
    /// an idle line.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.serial.read_timeout = timeout;
        self.session.read_idle = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.serial.write_timeout = timeout;
        self.session.write_timeout = timeout;
        self
    }

    /// Deadline used by commands that are not given an explicit one.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.session.default_timeout = timeout;
        self
    }

    /// Override the AT strings sent for named operations.
    pub fn command_set(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }

    /// Override the final-response tokens.
    pub fn response_set(mut self, responses: ResponseSet) -> Self {
        self.session.responses = responses;
        self
    }

    /// Override the URC prefixes.
    pub fn notification_set(mut self, notifications: NotificationSet) -> Self {
        self.session.notifications = notifications;
        self
    }

    /// Open the serial port and start the session.
    ///
    /// Must be called from within a tokio runtime, which the reader task
    /// is spawned onto.
    pub fn open(self) -> AtResult<Modem> {
        if self.serial.port_name.is_empty() {
            return Err(AtError::InvalidConfig("port name is empty".into()));
        }
        if self.serial.baud_rate == 0 {
            return Err(AtError::InvalidConfig("baud rate must be non-zero".into()));
        }

        let stream = tokio_serial::new(&self.serial.port_name, self.serial.baud_rate)
            .data_bits(self.serial.data_bits)
            .stop_bits(self.serial.stop_bits)
            .parity(self.serial.parity)
            .timeout(self.serial.read_timeout)
            .open_native_async()?;

        Ok(Modem::from_stream(stream, self.commands, self.session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_port_name() {
        let err = ModemBuilder::new("").open().unwrap_err();
        assert!(matches!(err, AtError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn rejects_zero_baud_rate() {
        let err = ModemBuilder::new("/dev/ttyUSB0")
            .baud_rate(0)
            .open()
            .unwrap_err();
        assert!(matches!(err, AtError::InvalidConfig(_)));
    }
}
