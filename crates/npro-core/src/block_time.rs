//! Average block production time

use crate::constants::DEFAULT_BLOCK_TIME_SECS;
use crate::error::{NproError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed average seconds per block, always finite and positive
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BlockTime(f64);

impl BlockTime {
    /// Fallback used before the oracle has a value, or when it cannot get one
    pub const DEFAULT: BlockTime = BlockTime(DEFAULT_BLOCK_TIME_SECS);

    pub fn new(seconds: f64) -> Result<Self> {
        if seconds.is_finite() && seconds > 0.0 {
            Ok(Self(seconds))
        } else {
            Err(NproError::InvalidBlockTime(seconds.to_string()))
        }
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

impl Default for BlockTime {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for BlockTime {
    type Error = NproError;

    fn try_from(seconds: f64) -> Result<Self> {
        Self::new(seconds)
    }
}

impl From<BlockTime> for f64 {
    fn from(block_time: BlockTime) -> f64 {
        block_time.0
    }
}

impl fmt::Display for BlockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}
