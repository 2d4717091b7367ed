//! # NPRO Oracle
//!
//! Live network inputs for the reward calculator:
//!
//! - **Block time**: average seconds per block, fetched over HTTP and cached
//!   for ten minutes. Failures never surface; the oracle falls back to the
//!   last good value, then to the 0.6s protocol default.
//! - **Current epoch**: optional chain-reported epoch that takes precedence
//!   over the wall-clock estimate.

pub mod cache;
pub mod chain;
pub mod error;
pub mod oracle;
pub mod source;

pub use cache::{BlockTimeCache, CachedBlockTime};
pub use chain::{ChainEpochSource, FixedEpochSource};
pub use error::{OracleError, Result};
pub use oracle::{BlockTimeOracle, BlockTimeOrigin, BlockTimeReading};
pub use source::{
    parse_block_time, BlockTimeSource, HttpBlockTimeSource, StaticBlockTimeSource,
    DEFAULT_BLOCK_TIME_FIELD, DEFAULT_BLOCK_TIME_URL, DEFAULT_TIMEOUT,
};
