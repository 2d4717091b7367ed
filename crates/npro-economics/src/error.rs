//! Error types for emission and reward calculations

use npro_core::NproError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EconomicsError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomicsError {
    /// Curve or schedule parameter out of its valid range
    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error(transparent)]
    Core(#[from] NproError),
}

impl EconomicsError {
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidParameter { .. } => 3001,
            Self::Core(inner) => inner.code(),
        }
    }
}
