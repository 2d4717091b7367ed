//! # Reward Accumulation
//!
//! A staker earns the pool's per-epoch emission in proportion to its stake:
//!
//! ```text
//! reward(e) = floor( R(e − start) × stake / pool_total )
//! total     = Σ reward(e)   for e in [start_epoch, end_epoch]
//! ```
//!
//! Each epoch is floored to whole base units before summing. Partial base
//! units are never distributed, so the estimate can under-credit by at most
//! one base unit per epoch but never over-credits.
//!
//! The product `R × stake` reaches ~10^62 for large pools, so the pro-rata
//! step runs in 256-bit integers.

use crate::emission::EmissionSchedule;
use npro_core::Amount;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inputs for one reward projection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPosition {
    /// Staker's balance in base units
    pub stake: Amount,

    /// Pool total in base units, as the accumulator should divide by
    pub pool_total: Amount,

    /// First epoch counted (inclusive)
    pub start_epoch: u64,

    /// Last epoch counted (inclusive)
    pub end_epoch: u64,
}

impl StakingPosition {
    pub fn new(stake: Amount, pool_total: Amount, start_epoch: u64, end_epoch: u64) -> Self {
        Self {
            stake,
            pool_total,
            start_epoch,
            end_epoch,
        }
    }

    /// Number of epochs in the range; 0 when it is empty
    pub fn epoch_count(&self) -> u64 {
        if self.start_epoch > self.end_epoch {
            0
        } else {
            self.end_epoch - self.start_epoch + 1
        }
    }
}

/// Projected reward for a [`StakingPosition`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEstimate {
    /// First epoch counted
    pub start_epoch: u64,

    /// Last epoch counted
    pub end_epoch: u64,

    /// Epochs in the range
    pub epochs: u64,

    /// Total reward in base units
    pub reward: Amount,
}

/// Sums a staker's share of the emission schedule over epoch ranges
#[derive(Clone, Debug, Default)]
pub struct RewardAccumulator {
    schedule: EmissionSchedule,
}

impl RewardAccumulator {
    pub fn new(schedule: EmissionSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    /// Staker's reward for a single epoch
    pub fn epoch_reward(&self, epoch: u64, stake: Amount, pool_total: Amount) -> Amount {
        pro_rata(self.schedule.emission_at_epoch(epoch), stake, pool_total)
    }

    /// Exact reward over `[start_epoch, end_epoch]`, one epoch at a time.
    ///
    /// Epochs outside the emission schedule contribute nothing and are skipped.
    pub fn total_reward(
        &self,
        stake: Amount,
        pool_total: Amount,
        start_epoch: u64,
        end_epoch: u64,
    ) -> Amount {
        if pool_total.is_zero() || stake.is_zero() || start_epoch > end_epoch {
            return Amount::ZERO;
        }

        let from = start_epoch.max(self.schedule.start_epoch);
        let to = end_epoch.min(self.schedule.final_epoch());
        if from > to {
            return Amount::ZERO;
        }

        debug!(from, to, "summing epoch rewards");
        (from..=to)
            .map(|epoch| self.epoch_reward(epoch, stake, pool_total))
            .sum()
    }

    /// Exact projection for a position
    pub fn estimate(&self, position: &StakingPosition) -> RewardEstimate {
        RewardEstimate {
            start_epoch: position.start_epoch,
            end_epoch: position.end_epoch,
            epochs: position.epoch_count(),
            reward: self.total_reward(
                position.stake,
                position.pool_total,
                position.start_epoch,
                position.end_epoch,
            ),
        }
    }

    /// Network-wide emission over `[from, to]` from the closed-form integral.
    ///
    /// Approximate; see [`EmissionSchedule::cumulative_emission`].
    pub fn cumulative_emission(&self, from: u64, to: u64) -> Amount {
        self.schedule.cumulative_emission(from, to)
    }

    /// Percent of the whole schedule released by the end of `epoch`
    pub fn percent_released(&self, epoch: u64) -> Decimal {
        self.schedule.percent_released(epoch)
    }
}

/// floor(emission × stake / pool_total), zero for an empty pool
fn pro_rata(emission: Amount, stake: Amount, pool_total: Amount) -> Amount {
    if pool_total.is_zero() {
        return Amount::ZERO;
    }

    let share = U256::from(emission.base_units()) * U256::from(stake.base_units())
        / U256::from(pool_total.base_units());

    if share > U256::from(u128::MAX) {
        Amount::from_base_units(u128::MAX)
    } else {
        Amount::from_base_units(share.low_u128())
    }
}
