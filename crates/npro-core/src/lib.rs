//! # NPRO Core
//!
//! Value types shared by the NPRO reward calculator:
//!
//! - [`Amount`] - fixed-point token amounts held as 10^24-scaled base units
//! - [`BlockTime`] - observed average seconds per block
//! - [`EpochClock`] - calendar date ↔ reward epoch mapping
//! - [`Clock`] - injectable wall clock
//!
//! ## Data Flow
//!
//! ```text
//!  "100" NEAR ──Amount::parse_decimal──▶ base units ──┐
//!                                                     ├──▶ reward accumulator ──▶ Amount ──▶ "12.345678"
//!  end date ──EpochClock(BlockTime)──▶ epoch range ───┘
//! ```

pub mod amount;
pub mod block_time;
pub mod clock;
pub mod epoch;
pub mod error;

pub use amount::Amount;
pub use block_time::BlockTime;
pub use clock::{Clock, ManualClock, SystemClock};
pub use epoch::EpochClock;
pub use error::{NproError, Result};

/// Protocol constants
pub mod constants {
    /// Reward token symbol
    pub const SYMBOL: &str = "NPRO";

    /// Decimal places of NPRO and NEAR (yocto units)
    pub const NPRO_DECIMALS: u32 = 24;

    /// One token in base units
    pub const ONE_NPRO: u128 = 1_000_000_000_000_000_000_000_000; // 10^24

    /// Fractional digits shown for reward totals
    pub const DISPLAY_PLACES: u32 = 6;

    /// Blocks per epoch on NEAR
    pub const BLOCKS_PER_EPOCH: u64 = 43_200;

    /// Fallback average block time in seconds
    pub const DEFAULT_BLOCK_TIME_SECS: f64 = 0.6;

    /// Epoch number at the reference date
    pub const START_EPOCH: u64 = 0;

    /// Reference date for epoch 0, the first emitting epoch: 2025-11-22T07:12:00Z.
    /// At the default block time the last emitting epoch begins on the
    /// distribution end date.
    pub const REFERENCE_DATE_UNIX: i64 = 1_763_795_520;

    /// Offset of the last emitting epoch; e^(-λ·5859) ≈ 0.25
    pub const SCHEDULE_HORIZON_EPOCHS: u64 = 5_859;

    /// Pre-staking period end: 2025-12-15T00:00:00Z
    pub const PRE_STAKING_END_UNIX: i64 = 1_765_756_800;

    /// Distribution end: 2030-09-15T00:00:00Z
    pub const STAKING_END_UNIX: i64 = 1_915_660_800;

    /// Share of the slider allotted to the pre-staking period
    pub const PRE_STAKING_RELEASE_PERCENT: f64 = 8.33;

    /// Block-time cache lifetime: 10 minutes
    pub const BLOCK_TIME_CACHE_TTL_SECS: u64 = 600;
}

pub use constants::*;
