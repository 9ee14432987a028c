//! Error handling for the vanswitch core.

/// A specialized `Result` type for vanswitch operations.
pub type Result<T> = std::result::Result<T, SwitchError>;

/// The main error type for vanswitch operations.
///
/// No variant here is fatal to the process: every call site degrades to a
/// diagnostic message and a retry on the next natural cycle (next poll tick,
/// next manual scan, next user action).
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Board request failed at the transport level (timeout, refused, DNS)
    #[error("Board unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// Board answered with a non-200 status
    #[error("Board {address} answered {status}")]
    BadStatus { address: String, status: u16 },

    /// Board answered 200 but the body was not a JSON status map
    #[error("Malformed status response from {address}: {reason}")]
    MalformedResponse { address: String, reason: String },

    /// Persistence read/write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A command was refused because its preconditions do not hold
    #[error("Command rejected: {0}")]
    Rejected(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SwitchError {
    /// Create a new bad-status error
    pub fn bad_status(address: impl Into<String>, status: u16) -> Self {
        Self::BadStatus {
            address: address.into(),
            status,
        }
    }

    /// Create a new malformed-response error
    pub fn malformed(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Create a new storage error
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new rejected-command error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
