//! # NPRO Calculator
//!
//! Ties the amount codec, emission schedule, reward accumulator and
//! block-time oracle together into a single "how much NPRO will I earn by
//! this date" call.
//!
//! ```ignore
//! let config = CalculatorConfig::load(Some(Path::new("npro.toml")))?;
//! let calculator = StakingCalculator::from_config(&config, Arc::new(SystemClock), false)?;
//! let report = calculator
//!     .estimate(&CalculatorInput::new("100", "250000", end_date))
//!     .await?;
//! println!("{} NPRO", report.reward_display);
//! ```

pub mod calculator;
pub mod config;
pub mod error;
pub mod timeline;

pub use calculator::{
    AmountUnits, CalculatorInput, CalculatorReport, CurrentEpoch, EpochOrigin, PoolTotalMode,
    StakingCalculator,
};
pub use config::{CalculatorConfig, LoggingConfig};
pub use error::{CalculatorError, ConfigError, Result};
pub use timeline::{ReleaseTimeline, SLIDER_STEPS, SNAP_THRESHOLD};
