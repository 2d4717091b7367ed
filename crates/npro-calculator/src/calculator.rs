//! # Staking Calculator
//!
//! One estimate, start to finish:
//!
//! ```text
//! inputs ──parse──▶ stake, pool (base units)      malformed → 0, warn
//!    │
//!    ├── oracle ──▶ block time                      never fails
//!    ├── chain / wall clock ──▶ current epoch      chain preferred
//!    └── end date ──EpochClock──▶ end epoch         clamped to horizon
//!                          │
//!                          ▼
//!            RewardAccumulator (exact per-epoch sum)
//!                          │
//!                          ▼
//!                   CalculatorReport
//! ```
//!
//! The only error is [`CalculatorError::MissingInput`]. Everything else
//! degrades to a usable number.

use crate::config::CalculatorConfig;
use crate::error::{CalculatorError, ConfigError, Result};
use crate::timeline::ReleaseTimeline;
use chrono::{DateTime, Utc};
use npro_core::constants::DISPLAY_PLACES;
use npro_core::{Amount, Clock, EpochClock};
use npro_economics::{RewardAccumulator, RewardEstimate, StakingPosition};
use npro_oracle::{BlockTimeOracle, BlockTimeReading, ChainEpochSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// What the entered pool total means
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolTotalMode {
    /// Pool as it stands today; the previewed stake is added on top
    #[default]
    ExcludesStake,
    /// Pool already counts the previewed stake
    IncludesStake,
}

/// How stake and pool strings are denominated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountUnits {
    /// Human decimals, e.g. "100.5"
    #[default]
    Tokens,
    /// Integer base units as returned by wallet queries
    BaseUnits,
}

/// Where the current epoch came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochOrigin {
    /// Reported by the chain
    Chain,
    /// Estimated from the wall clock and block time
    WallClock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentEpoch {
    pub epoch: u64,
    pub origin: EpochOrigin,
}

/// Inputs as a user or wallet supplies them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorInput {
    pub stake: String,
    pub pool_total: String,
    #[serde(default)]
    pub pool_mode: PoolTotalMode,
    #[serde(default)]
    pub units: AmountUnits,
    /// Last day of staking
    pub end_date: DateTime<Utc>,
    /// Rewards already earned, in base units
    #[serde(default)]
    pub earned: Option<String>,
}

impl CalculatorInput {
    pub fn new(stake: impl Into<String>, pool_total: impl Into<String>, end_date: DateTime<Utc>) -> Self {
        Self {
            stake: stake.into(),
            pool_total: pool_total.into(),
            pool_mode: PoolTotalMode::default(),
            units: AmountUnits::default(),
            end_date,
            earned: None,
        }
    }

    pub fn with_pool_mode(mut self, mode: PoolTotalMode) -> Self {
        self.pool_mode = mode;
        self
    }

    pub fn with_units(mut self, units: AmountUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_earned(mut self, earned: impl Into<String>) -> Self {
        self.earned = Some(earned.into());
        self
    }

    fn is_missing(&self) -> bool {
        self.stake.trim().is_empty() || self.pool_total.trim().is_empty()
    }
}

/// Everything the UI shows for one estimate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatorReport {
    /// Epoch range and exact reward
    #[serde(flatten)]
    pub estimate: RewardEstimate,

    /// Reward rounded for display
    pub reward_display: String,

    /// Stake as parsed
    pub stake: Amount,

    /// Pool total the reward was divided by
    pub pool_total: Amount,

    /// Rewards already earned
    pub earned: Amount,

    /// `earned + reward`
    pub projected_total: Amount,

    /// Epochs from now until the end date, rounded up
    pub epochs_until_end: u64,

    /// End date lay beyond the schedule and was pulled back
    pub horizon_clamped: bool,

    /// Share of the whole schedule released by the end epoch
    pub percent_released: Decimal,

    pub block_time: BlockTimeReading,

    pub current_epoch: CurrentEpoch,

    /// End date falls inside the pre-staking period
    pub pre_staking: bool,
}

impl CalculatorReport {
    pub fn reward(&self) -> Amount {
        self.estimate.reward
    }
}

/// Reward calculator wired to an oracle and clock
pub struct StakingCalculator {
    accumulator: RewardAccumulator,
    epochs: EpochClock,
    timeline: ReleaseTimeline,
    oracle: Arc<BlockTimeOracle>,
    clock: Arc<dyn Clock>,
    chain: Option<Arc<dyn ChainEpochSource>>,
}

impl StakingCalculator {
    pub fn new(
        accumulator: RewardAccumulator,
        epochs: EpochClock,
        timeline: ReleaseTimeline,
        oracle: Arc<BlockTimeOracle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accumulator,
            epochs,
            timeline,
            oracle,
            clock,
            chain: None,
        }
    }

    /// Calculator built from configuration
    pub fn from_config(
        config: &CalculatorConfig,
        clock: Arc<dyn Clock>,
        offline: bool,
    ) -> std::result::Result<Self, ConfigError> {
        let oracle = config.block_time_oracle(clock.clone(), offline)?;
        Ok(Self::new(
            RewardAccumulator::new(config.emission_schedule()?),
            config.epoch_clock(),
            config.release_timeline(),
            Arc::new(oracle),
            clock,
        ))
    }

    /// Prefer an authoritative epoch over the wall-clock estimate
    pub fn with_chain_epochs(mut self, chain: Arc<dyn ChainEpochSource>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn accumulator(&self) -> &RewardAccumulator {
        &self.accumulator
    }

    pub fn epoch_clock(&self) -> &EpochClock {
        &self.epochs
    }

    pub fn timeline(&self) -> &ReleaseTimeline {
        &self.timeline
    }

    pub fn oracle(&self) -> &BlockTimeOracle {
        &self.oracle
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolve block time and current epoch afresh, then estimate
    pub async fn estimate(&self, input: &CalculatorInput) -> Result<CalculatorReport> {
        if input.is_missing() {
            return Err(CalculatorError::MissingInput);
        }

        let block_time = self.oracle.current_block_time().await;
        let now = self.clock.now();
        let current = self.current_epoch(now, block_time).await;
        self.estimate_with(input, now, block_time, current)
    }

    /// Current epoch from the chain if configured, else the wall clock
    pub async fn current_epoch(&self, now: DateTime<Utc>, block_time: BlockTimeReading) -> CurrentEpoch {
        if let Some(chain) = &self.chain {
            match chain.current_epoch().await {
                Ok(epoch) => {
                    return CurrentEpoch {
                        epoch,
                        origin: EpochOrigin::Chain,
                    }
                }
                Err(err) => warn!(error = %err, "chain epoch unavailable, estimating from wall clock"),
            }
        }

        CurrentEpoch {
            epoch: self.epochs.date_to_epoch(now, block_time.block_time),
            origin: EpochOrigin::WallClock,
        }
    }

    /// Pure estimate against an explicit time, block time and current epoch
    pub fn estimate_with(
        &self,
        input: &CalculatorInput,
        now: DateTime<Utc>,
        block_time: BlockTimeReading,
        current: CurrentEpoch,
    ) -> Result<CalculatorReport> {
        if input.is_missing() {
            return Err(CalculatorError::MissingInput);
        }

        let stake = parse_amount("stake", &input.stake, input.units);
        let entered_pool = parse_amount("pool_total", &input.pool_total, input.units);
        let pool_total = match input.pool_mode {
            PoolTotalMode::ExcludesStake => entered_pool.saturating_add(stake),
            PoolTotalMode::IncludesStake => entered_pool,
        };
        let earned = input
            .earned
            .as_deref()
            .map(|raw| parse_amount("earned", raw, AmountUnits::BaseUnits))
            .unwrap_or(Amount::ZERO);

        let schedule = self.accumulator.schedule();
        let target_epoch = self.epochs.date_to_epoch(input.end_date, block_time.block_time);
        let horizon_clamped = target_epoch > schedule.final_epoch();
        let end_epoch = target_epoch.min(schedule.final_epoch());

        let position = StakingPosition::new(stake, pool_total, current.epoch, end_epoch);
        let estimate = self.accumulator.estimate(&position);

        debug!(
            start_epoch = estimate.start_epoch,
            end_epoch = estimate.end_epoch,
            epochs = estimate.epochs,
            reward = %estimate.reward,
            block_time = %block_time.block_time,
            "reward estimated"
        );

        Ok(CalculatorReport {
            reward_display: estimate.reward.to_decimal_string(DISPLAY_PLACES),
            projected_total: earned.saturating_add(estimate.reward),
            percent_released: self.accumulator.percent_released(end_epoch),
            epochs_until_end: self.epochs.epochs_until(now, input.end_date, block_time.block_time),
            pre_staking: self.timeline.is_pre_staking(input.end_date),
            estimate,
            stake,
            pool_total,
            earned,
            horizon_clamped,
            block_time,
            current_epoch: current,
        })
    }
}

/// Parse an amount, treating anything unparseable as zero
fn parse_amount(field: &'static str, raw: &str, units: AmountUnits) -> Amount {
    let parsed = match units {
        AmountUnits::Tokens => Amount::parse_decimal(raw),
        AmountUnits::BaseUnits => Amount::parse_base_units(raw.trim()),
    };

    parsed.unwrap_or_else(|err| {
        warn!(field, input = raw, error = %err, "unparseable amount treated as zero");
        Amount::ZERO
    })
}
