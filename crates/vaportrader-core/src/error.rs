//! Shared error type across vaportrader crates.

use thiserror::Error;

/// Stable error codes, used in logs and asserted on by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Dial, handshake or authentication failure.
    Connection,
    /// Malformed inbound frame or payload.
    Decode,
    /// Outbound data could not be serialized.
    Encode,
    /// The outbound queue is gone (client shut down).
    QueueClosed,
    /// Invalid caller input or configuration value.
    BadRequest,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Connection => "CONNECTION",
            ErrorCode::Decode => "DECODE",
            ErrorCode::Encode => "ENCODE",
            ErrorCode::QueueClosed => "QUEUE_CLOSED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VaporError>;

/// Unified error type used by core and the socket client.
///
/// A confirmed send that is never acknowledged is *not* an error: it resolves
/// to a negative `Acknowledgment`.
#[derive(Debug, Error)]
pub enum VaporError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("outbound queue closed")]
    QueueClosed,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl VaporError {
    pub fn code(&self) -> ErrorCode {
        match self {
            VaporError::Connection(_) => ErrorCode::Connection,
            VaporError::Decode(_) => ErrorCode::Decode,
            VaporError::Encode(_) => ErrorCode::Encode,
            VaporError::QueueClosed => ErrorCode::QueueClosed,
            VaporError::BadRequest(_) => ErrorCode::BadRequest,
            VaporError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            VaporError::Internal(_) => ErrorCode::Internal,
        }
    }
}
