//! Calculator and configuration errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalculatorError>;

/// The only failure a caller of the calculator ever sees.
///
/// Malformed amounts, oracle outages and empty ranges all degrade to a
/// usable estimate instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    /// Stake or pool total left blank
    #[error("enter valid amounts to see rewards")]
    MissingInput,
}

impl CalculatorError {
    pub fn code(&self) -> u32 {
        match self {
            Self::MissingInput => 5001,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        true
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File unreadable, bad TOML, or a value of the wrong type
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// Value parsed but out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> u32 {
        match self {
            Self::Load(_) => 5101,
            Self::Invalid(_) => 5102,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        false
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load(err.to_string())
    }
}
