//! Calculator configuration
//!
//! Layered, lowest precedence first:
//!
//! 1. Built-in defaults (the protocol constants)
//! 2. Optional TOML file, `npro.toml` by default
//! 3. Environment variables: `NPRO_<SECTION>__<KEY>`, e.g. `NPRO_ORACLE__TIMEOUT_MS`
//! 4. Legacy `NPRO_R_ZERO` / `NPRO_LAMBDA` for the emission curve
//!
//! ```toml
//! [emission]
//! r0 = "1892.824882239740"
//! lambda = "0.00023664977144416"
//!
//! [oracle]
//! url = "https://api.nearblocks.io/v1/stats"
//! cache_ttl_secs = 600
//! ```

use crate::error::ConfigError;
use crate::timeline::ReleaseTimeline;
use chrono::{DateTime, Utc};
use config::{Config, Environment, File, FileFormat};
use npro_core::constants::{
    BLOCKS_PER_EPOCH, BLOCK_TIME_CACHE_TTL_SECS, DEFAULT_BLOCK_TIME_SECS, PRE_STAKING_END_UNIX,
    PRE_STAKING_RELEASE_PERCENT, REFERENCE_DATE_UNIX, SCHEDULE_HORIZON_EPOCHS, STAKING_END_UNIX,
    START_EPOCH,
};
use npro_core::{BlockTime, Clock, EpochClock};
use npro_economics::{EmissionCurve, EmissionSchedule, DEFAULT_LAMBDA, DEFAULT_R0};
use npro_oracle::{
    BlockTimeOracle, HttpBlockTimeSource, DEFAULT_BLOCK_TIME_FIELD, DEFAULT_BLOCK_TIME_URL,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Prefix of structured environment overrides
pub const ENV_PREFIX: &str = "NPRO";

/// Legacy override for the initial emission rate
pub const LEGACY_R0_VAR: &str = "NPRO_R_ZERO";

/// Legacy override for the decay constant
pub const LEGACY_LAMBDA_VAR: &str = "NPRO_LAMBDA";

/// Complete calculator configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Bonding-curve parameters
    #[serde(default)]
    pub emission: EmissionSettings,

    /// Date ↔ epoch mapping
    #[serde(default)]
    pub epochs: EpochSettings,

    /// Block-time oracle
    #[serde(default)]
    pub oracle: OracleSettings,

    /// Release slider anchors
    #[serde(default)]
    pub timeline: TimelineSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Emission curve and schedule window
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmissionSettings {
    /// Initial per-epoch emission, in whole NPRO
    #[serde(default = "default_r0")]
    pub r0: Decimal,

    /// Decay constant per epoch
    #[serde(default = "default_lambda")]
    pub lambda: Decimal,

    /// Epoch at which the curve starts (t = 0)
    #[serde(default = "default_start_epoch")]
    pub start_epoch: u64,

    /// Offset of the last emitting epoch
    #[serde(default = "default_horizon_epochs")]
    pub horizon_epochs: u64,
}

fn default_r0() -> Decimal {
    DEFAULT_R0
}

fn default_lambda() -> Decimal {
    DEFAULT_LAMBDA
}

fn default_start_epoch() -> u64 {
    START_EPOCH
}

fn default_horizon_epochs() -> u64 {
    SCHEDULE_HORIZON_EPOCHS
}

impl Default for EmissionSettings {
    fn default() -> Self {
        Self {
            r0: default_r0(),
            lambda: default_lambda(),
            start_epoch: default_start_epoch(),
            horizon_epochs: default_horizon_epochs(),
        }
    }
}

/// Epoch clock settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochSettings {
    /// Wall-clock instant of the start epoch
    #[serde(default = "default_reference_date")]
    pub reference_date: DateTime<Utc>,

    /// Blocks per epoch
    #[serde(default = "default_blocks_per_epoch")]
    pub blocks_per_epoch: u64,
}

fn default_reference_date() -> DateTime<Utc> {
    timestamp(REFERENCE_DATE_UNIX)
}

fn default_blocks_per_epoch() -> u64 {
    BLOCKS_PER_EPOCH
}

impl Default for EpochSettings {
    fn default() -> Self {
        Self {
            reference_date: default_reference_date(),
            blocks_per_epoch: default_blocks_per_epoch(),
        }
    }
}

/// Block-time oracle settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Stats endpoint
    #[serde(default = "default_oracle_url")]
    pub url: String,

    /// Dotted path of the block-time field in the response
    #[serde(default = "default_oracle_field")]
    pub field: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long a fetched value stays fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Seconds per block when nothing better is known
    #[serde(default = "default_block_time")]
    pub default_block_time: f64,
}

fn default_oracle_url() -> String {
    DEFAULT_BLOCK_TIME_URL.to_string()
}

fn default_oracle_field() -> String {
    DEFAULT_BLOCK_TIME_FIELD.to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_cache_ttl_secs() -> u64 {
    BLOCK_TIME_CACHE_TTL_SECS
}

fn default_block_time() -> f64 {
    DEFAULT_BLOCK_TIME_SECS
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            url: default_oracle_url(),
            field: default_oracle_field(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            default_block_time: default_block_time(),
        }
    }
}

/// Release slider anchors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineSettings {
    #[serde(default = "default_pre_staking_end")]
    pub pre_staking_end: DateTime<Utc>,

    #[serde(default = "default_staking_end")]
    pub staking_end: DateTime<Utc>,

    /// Slider position of the pre-staking end date
    #[serde(default = "default_pre_staking_release_percent")]
    pub pre_staking_release_percent: f64,
}

fn default_pre_staking_end() -> DateTime<Utc> {
    timestamp(PRE_STAKING_END_UNIX)
}

fn default_staking_end() -> DateTime<Utc> {
    timestamp(STAKING_END_UNIX)
}

fn default_pre_staking_release_percent() -> f64 {
    PRE_STAKING_RELEASE_PERCENT
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            pre_staking_end: default_pre_staking_end(),
            staking_end: default_staking_end(),
            pre_staking_release_percent: default_pre_staking_release_percent(),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl CalculatorConfig {
    /// Load from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with legacy variables resolved through `lookup`
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("emission.r0", lookup(LEGACY_R0_VAR))?
            .set_override_option("emission.lambda", lookup(LEGACY_LAMBDA_VAR))?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on its own, without environment overrides
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Load(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.emission_schedule()?;
        self.default_block_time()?;

        if self.epochs.blocks_per_epoch == 0 {
            return Err(ConfigError::Invalid("epochs.blocks_per_epoch must be positive".into()));
        }
        if self.oracle.timeout_ms == 0 {
            return Err(ConfigError::Invalid("oracle.timeout_ms must be positive".into()));
        }
        if self.timeline.staking_end <= self.timeline.pre_staking_end {
            return Err(ConfigError::Invalid(
                "timeline.staking_end must be after timeline.pre_staking_end".into(),
            ));
        }

        let percent = self.timeline.pre_staking_release_percent;
        if !(percent > 0.0 && percent < 100.0) {
            return Err(ConfigError::Invalid(format!(
                "timeline.pre_staking_release_percent must be within (0, 100), got {percent}"
            )));
        }

        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!("unknown logging.format {other:?}"))),
        }
    }

    pub fn emission_schedule(&self) -> Result<EmissionSchedule, ConfigError> {
        let curve = EmissionCurve::new(self.emission.r0, self.emission.lambda)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(EmissionSchedule::new(
            curve,
            self.emission.start_epoch,
            self.emission.horizon_epochs,
        ))
    }

    pub fn epoch_clock(&self) -> EpochClock {
        EpochClock::new(
            self.epochs.reference_date,
            self.emission.start_epoch,
            self.epochs.blocks_per_epoch,
        )
    }

    pub fn release_timeline(&self) -> ReleaseTimeline {
        ReleaseTimeline::new(
            self.timeline.pre_staking_end,
            self.timeline.staking_end,
            self.timeline.pre_staking_release_percent,
        )
    }

    pub fn default_block_time(&self) -> Result<BlockTime, ConfigError> {
        BlockTime::new(self.oracle.default_block_time).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Block-time oracle; `offline` skips the HTTP source entirely
    pub fn block_time_oracle(
        &self,
        clock: Arc<dyn Clock>,
        offline: bool,
    ) -> Result<BlockTimeOracle, ConfigError> {
        let fallback = self.default_block_time()?;
        if offline {
            return Ok(BlockTimeOracle::offline(clock, fallback));
        }

        let source = HttpBlockTimeSource::new(
            self.oracle.url.clone(),
            self.oracle.field.clone(),
            Duration::from_millis(self.oracle.timeout_ms),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(BlockTimeOracle::new(
            Arc::new(source),
            clock,
            Duration::from_secs(self.oracle.cache_ttl_secs),
            fallback,
        ))
    }
}
