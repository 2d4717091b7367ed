//! Oracle error types

use thiserror::Error;

/// Result type alias for oracle operations
pub type Result<T> = std::result::Result<T, OracleError>;

/// Reasons a live block-time or epoch lookup failed.
///
/// None of these reach the calculator's caller: the oracle degrades to a
/// cached or default value instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Request did not complete within the configured timeout
    #[error("Block-time request timed out")]
    Timeout,

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// Payload missing the expected field or not a positive number
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// HTTP client could not be constructed
    #[error("Client setup failed: {0}")]
    Client(String),

    /// Source has nothing to offer
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    pub fn code(&self) -> u32 {
        match self {
            Self::Timeout => 4001,
            Self::Network(_) => 4002,
            Self::HttpStatus(_) => 4003,
            Self::MalformedPayload(_) => 4004,
            Self::Client(_) => 4005,
            Self::Unavailable(_) => 4006,
        }
    }

    /// Whether retrying later might succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network(_) | Self::HttpStatus(_) | Self::Unavailable(_)
        )
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            Self::MalformedPayload(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
