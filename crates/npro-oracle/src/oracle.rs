//! # Block-Time Oracle
//!
//! Answers "how long is a block right now" without ever failing:
//!
//! ```text
//! cache fresh? ──yes──▶ Cached
//!      │no
//!      ▼
//! fetch live  ──ok───▶ Live        (cache refreshed for ttl)
//!      │err
//!      ▼
//! last good value? ──yes──▶ StaleCache
//!      │no
//!      ▼
//!   Default (0.6s)
//! ```
//!
//! At most one refresh is in flight; concurrent callers wait for it and then
//! read the refreshed cache. The reading carries its origin so callers and
//! tests can tell a degraded answer from a live one.

use crate::cache::BlockTimeCache;
use crate::source::BlockTimeSource;
use npro_core::{BlockTime, Clock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Where a block-time reading came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockTimeOrigin {
    /// Unexpired cached value
    Cached,
    /// Fetched during this call
    Live,
    /// Fetch failed; last known value returned
    StaleCache,
    /// Fetch failed and nothing cached; protocol default returned
    Default,
}

/// Block time plus provenance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockTimeReading {
    pub block_time: BlockTime,
    pub origin: BlockTimeOrigin,
}

impl BlockTimeReading {
    /// True when the live source could not be used
    pub fn is_degraded(&self) -> bool {
        matches!(self.origin, BlockTimeOrigin::StaleCache | BlockTimeOrigin::Default)
    }
}

/// Cached, fail-safe view of the network's average block time
pub struct BlockTimeOracle {
    source: Option<Arc<dyn BlockTimeSource>>,
    clock: Arc<dyn Clock>,
    cache: BlockTimeCache,
    fallback: BlockTime,
    refresh: AsyncMutex<()>,
}

impl BlockTimeOracle {
    pub fn new(
        source: Arc<dyn BlockTimeSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        fallback: BlockTime,
    ) -> Self {
        Self {
            source: Some(source),
            clock,
            cache: BlockTimeCache::new(ttl),
            fallback,
            refresh: AsyncMutex::new(()),
        }
    }

    /// Oracle that never goes to the network
    pub fn offline(clock: Arc<dyn Clock>, fallback: BlockTime) -> Self {
        Self {
            source: None,
            clock,
            cache: BlockTimeCache::new(Duration::ZERO),
            fallback,
            refresh: AsyncMutex::new(()),
        }
    }

    pub fn cache(&self) -> &BlockTimeCache {
        &self.cache
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current block time, refreshing the cache when it has expired
    pub async fn current_block_time(&self) -> BlockTimeReading {
        if let Some(block_time) = self.cache.get_fresh(self.clock.now()) {
            debug!(%block_time, "block time cache hit");
            return self.reading(block_time, BlockTimeOrigin::Cached);
        }

        let Some(source) = self.source.as_ref() else {
            return self.fallback_reading();
        };

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the guard
        if let Some(block_time) = self.cache.get_fresh(self.clock.now()) {
            return self.reading(block_time, BlockTimeOrigin::Cached);
        }

        match source.fetch_block_time().await {
            Ok(block_time) => {
                let cached = self.cache.store(block_time, self.clock.now());
                info!(
                    %block_time,
                    source = source.name(),
                    expires_at = %cached.expires_at,
                    "block time refreshed"
                );
                self.reading(block_time, BlockTimeOrigin::Live)
            }
            Err(err) => {
                let reading = self.fallback_reading();
                warn!(
                    error = %err,
                    source = source.name(),
                    fallback = %reading.block_time,
                    "block time fetch failed, using fallback"
                );
                reading
            }
        }
    }

    /// Best value available without any I/O
    pub fn peek(&self) -> BlockTimeReading {
        match self.cache.get_fresh(self.clock.now()) {
            Some(block_time) => self.reading(block_time, BlockTimeOrigin::Cached),
            None => self.fallback_reading(),
        }
    }

    fn fallback_reading(&self) -> BlockTimeReading {
        match self.cache.last_good() {
            Some(cached) => self.reading(cached.value, BlockTimeOrigin::StaleCache),
            None => self.reading(self.fallback, BlockTimeOrigin::Default),
        }
    }

    fn reading(&self, block_time: BlockTime, origin: BlockTimeOrigin) -> BlockTimeReading {
        BlockTimeReading { block_time, origin }
    }
}
