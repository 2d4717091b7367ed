//! Current-epoch sources
//!
//! When the chain can tell us its epoch directly we use that and skip the
//! wall-clock estimate.

use crate::error::Result;
use async_trait::async_trait;

/// Reports the network's current reward epoch
#[async_trait]
pub trait ChainEpochSource: Send + Sync {
    async fn current_epoch(&self) -> Result<u64>;
}

/// Fixed epoch, e.g. supplied on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedEpochSource(pub u64);

#[async_trait]
impl ChainEpochSource for FixedEpochSource {
    async fn current_epoch(&self) -> Result<u64> {
        Ok(self.0)
    }
}
