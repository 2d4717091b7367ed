//! # NPRO Economics - Bonding Curve & Staking Rewards
//!
//! Projects how much NPRO a staker accrues over a window of epochs.
//!
//! ## Key Pieces
//!
//! - **Emission curve**: R(t) = R0 · e^(−λt), evaluated in 28-digit decimals
//! - **Emission schedule**: curve anchored at a start epoch, bounded by a horizon
//! - **Reward accumulator**: pro-rata share of each epoch's emission, floored
//!   to base units and summed exactly; plus a closed-form integral for cheap
//!   "percent released" figures
//!
//! ## Schedule Shape (defaults)
//!
//! | Offset t | Emission / epoch | Released so far |
//! |----------|------------------|-----------------|
//! | 0 | 1892.82 NPRO | 0.03% |
//! | 1000 | 1493.95 NPRO | 28.1% |
//! | 2929 | 946.41 NPRO | 66.7% |
//! | 5859 | 473.09 NPRO | 100% |

pub mod emission;
pub mod error;
pub mod rewards;

pub use emission::{EmissionCurve, EmissionSchedule, DEFAULT_LAMBDA, DEFAULT_R0};
pub use error::{EconomicsError, Result};
pub use rewards::{RewardAccumulator, RewardEstimate, StakingPosition};
