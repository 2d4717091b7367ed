//! Error types for NPRO core value types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, NproError>;

/// Errors raised by the amount codec and time conversions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NproError {
    // === Amount Codec ===
    /// Input is not a non-negative decimal number
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Value does not fit in 128-bit base units
    #[error("Amount overflows base-unit range: {0}")]
    AmountOverflow(String),

    // === Time Conversions ===
    /// Block time must be finite and strictly positive
    #[error("Invalid block time: {0} seconds")]
    InvalidBlockTime(String),

    /// Date falls outside the representable calendar range
    #[error("Date out of range for epoch {0}")]
    DateOutOfRange(u64),
}

impl NproError {
    /// Stable error code for CLI/JSON output
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidAmount(_) => 2001,
            Self::AmountOverflow(_) => 2002,
            Self::InvalidBlockTime(_) => 2101,
            Self::DateOutOfRange(_) => 2102,
        }
    }

    /// Whether the orchestration layer may substitute a safe default
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidAmount(_) | Self::InvalidBlockTime(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(NproError::InvalidAmount("abc".into()).code(), 2001);
        assert_eq!(NproError::DateOutOfRange(7).code(), 2102);
    }

    #[test]
    fn test_error_display() {
        let msg = format!("{}", NproError::InvalidAmount("12x".into()));
        assert!(msg.contains("Invalid amount"));
        assert!(msg.contains("12x"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(NproError::InvalidAmount(String::new()).is_recoverable());
        assert!(!NproError::AmountOverflow("1e40".into()).is_recoverable());
    }
}
