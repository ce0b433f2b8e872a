// ABOUTME: Error types for AT session and command operations
// ABOUTME: Separates connection, command and response failures from PDU codec errors

use crate::pdu::PduError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error type for session and command operations.
#[derive(Debug, Error)]
pub enum AtError {
    /// The session has been closed; all further operations fail with this
    #[error("connection is closed")]
    ConnectionClosed,

    /// Serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Port(#[from] tokio_serial::Error),

    /// Invalid transport configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error on the underlying byte stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No final response arrived within the deadline; any late lines are
    /// drained by the next command
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The expected token was absent from the response
    #[error("expected {expected:?} not found in response {responses:?}")]
    UnexpectedResponse {
        expected: String,
        responses: Vec<String>,
    },

    /// The modem terminated the response with `ERROR`, `+CME ERROR:` or
    /// `+CMS ERROR:`
    #[error("modem returned error response: {0}")]
    ErrorResponse(String),

    /// The command produced no response lines at all
    #[error("no response from modem")]
    NoResponse,

    /// A response line did not have the expected shape
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// SMS PDU codec failure
    #[error(transparent)]
    Pdu(#[from] PduError),
}

/// Result type alias for session and command operations.
pub type AtResult<T> = Result<T, AtError>;
