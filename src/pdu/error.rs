// ABOUTME: Error types for SMS PDU encoding and decoding failures
// ABOUTME: Distinguishes malformed wire data from unsupported or oversized input

use thiserror::Error;

/// Error type for PDU codec operations.
///
/// Decoding arbitrary bytes must never panic; every malformed input maps to
/// one of these variants instead.
#[derive(Debug, Error)]
pub enum PduError {
    /// Structurally malformed PDU (truncated field, bad hex, inconsistent lengths)
    #[error("invalid PDU: {0}")]
    InvalidPdu(&'static str),

    /// Unknown or unusable data coding scheme, or text outside the selected alphabet
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Phone number fails the 4-15 digit / optional `+` form
    #[error("invalid phone number: {0:?}")]
    InvalidPhoneNumber(String),

    /// Service centre address fails validation
    #[error("invalid SMSC address: {0:?}")]
    InvalidSmsc(String),

    /// Message exceeds what the concatenation scheme can carry (255 parts)
    #[error("message too long: {0} parts required")]
    MessageTooLong(usize),

    /// Recognized but unimplemented PDU feature
    #[error("unsupported feature: {0}")]
    Unsupported(&'static str),

    /// Malformed user data header
    #[error("invalid user data header: {0}")]
    InvalidUdh(&'static str),

    /// Malformed service centre timestamp
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(&'static str),
}

/// Result type alias for PDU codec operations.
pub type PduResult<T> = Result<T, PduError>;
