//! Shared error type across tally crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Increment attempted at the maximum value.
    Overflow,
    /// Decrement attempted at zero.
    Underflow,
    /// Set value does not fit the counter width.
    OutOfRange,
    /// Invalid input / malformed message.
    BadRequest,
    /// Unknown counter id.
    NotFound,
    /// Counter id already taken.
    AlreadyExists,
    /// Registry capacity reached.
    RegistryFull,
    /// Payload too large.
    PayloadTooLarge,
    /// Unsupported protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::Overflow => "OVERFLOW",
            ClientCode::Underflow => "UNDERFLOW",
            ClientCode::OutOfRange => "OUT_OF_RANGE",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::AlreadyExists => "ALREADY_EXISTS",
            ClientCode::RegistryFull => "REGISTRY_FULL",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// Status byte used in Hot Lane replies. `0` is reserved for success.
    pub fn status_byte(self) -> u8 {
        match self {
            ClientCode::BadRequest => 1,
            ClientCode::Overflow => 2,
            ClientCode::Underflow => 3,
            ClientCode::OutOfRange => 4,
            ClientCode::NotFound => 5,
            ClientCode::AlreadyExists => 6,
            ClientCode::RegistryFull => 7,
            ClientCode::PayloadTooLarge => 8,
            ClientCode::UnsupportedVersion => 9,
            ClientCode::Internal => 10,
        }
    }

    /// Inverse of [`ClientCode::status_byte`]. Returns `None` for `0` and unknown bytes.
    pub fn from_status_byte(b: u8) -> Option<Self> {
        let code = match b {
            1 => ClientCode::BadRequest,
            2 => ClientCode::Overflow,
            3 => ClientCode::Underflow,
            4 => ClientCode::OutOfRange,
            5 => ClientCode::NotFound,
            6 => ClientCode::AlreadyExists,
            7 => ClientCode::RegistryFull,
            8 => ClientCode::PayloadTooLarge,
            9 => ClientCode::UnsupportedVersion,
            10 => ClientCode::Internal,
            _ => return None,
        };
        Some(code)
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    #[error("counter overflow")]
    Overflow,
    #[error("counter underflow")]
    Underflow,
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("counter not found: {0}")]
    NotFound(String),
    #[error("counter already exists: {0}")]
    AlreadyExists(String),
    #[error("registry full")]
    RegistryFull,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TallyError::Overflow => ClientCode::Overflow,
            TallyError::Underflow => ClientCode::Underflow,
            TallyError::OutOfRange(_) => ClientCode::OutOfRange,
            TallyError::BadRequest(_) => ClientCode::BadRequest,
            TallyError::NotFound(_) => ClientCode::NotFound,
            TallyError::AlreadyExists(_) => ClientCode::AlreadyExists,
            TallyError::RegistryFull => ClientCode::RegistryFull,
            TallyError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            TallyError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            TallyError::Internal(_) => ClientCode::Internal,
        }
    }
}
