//! Block-time cache cell
//!
//! One value plus its expiry. Reads and writes take a short `parking_lot`
//! lock; deciding *who* refreshes is the oracle's job, not the cache's.

use chrono::{DateTime, Duration, Utc};
use npro_core::BlockTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Last successfully fetched block time
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedBlockTime {
    pub value: BlockTime,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedBlockTime {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug)]
pub struct BlockTimeCache {
    ttl: Duration,
    entry: Mutex<Option<CachedBlockTime>>,
}

impl BlockTimeCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::seconds(ttl.as_secs().min(u32::MAX as u64) as i64),
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value if it has not expired at `now`
    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<BlockTime> {
        let entry = *self.entry.lock();
        entry
            .filter(|cached| cached.is_fresh(now))
            .map(|cached| cached.value)
    }

    /// Most recent value regardless of age
    pub fn last_good(&self) -> Option<CachedBlockTime> {
        *self.entry.lock()
    }

    /// Record a freshly fetched value
    pub fn store(&self, value: BlockTime, now: DateTime<Utc>) -> CachedBlockTime {
        let cached = CachedBlockTime {
            value,
            fetched_at: now,
            expires_at: now + self.ttl,
        };
        *self.entry.lock() = Some(cached);
        cached
    }

    pub fn clear(&self) {
        *self.entry.lock() = None;
    }
}
