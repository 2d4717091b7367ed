//! # Emission Schedule
//!
//! NPRO is released network-wide along an exponential-decay bonding curve:
//!
//! ```text
//! R(t) = R0 · e^(−λ·t)        t = epoch − start_epoch
//!
//! R0 = 1892.824882239740 NPRO/epoch
//! λ  = 0.00023664977144416 per epoch
//!
//! t = 0     → 1892.82 NPRO   (100%)
//! t = 2929  →  946.41 NPRO   (~50%)
//! t = 5859  →  473.09 NPRO   (~25%, end of schedule)
//! ```
//!
//! The curve is evaluated in [`Decimal`] arithmetic end to end and only
//! converted to integer base units at the last step. Summing thousands of
//! per-epoch values built from `f64` drifts visibly; 28-digit decimals keep
//! each term exact to the base unit.
//!
//! ## Closed Form
//!
//! [`EmissionSchedule::cumulative_emission`] integrates the continuous curve
//! instead of summing epochs:
//!
//! ```text
//! ∫[a, b+1) R(t) dt = (R0/λ) · (e^(−λ·a) − e^(−λ·(b+1)))
//! ```
//!
//! The discrete sum is a left Riemann sum of a decreasing function, so it
//! exceeds the integral by a relative margin of about λ/2 (≈0.012%). The
//! closed form is for progress indicators; quoted rewards use the exact sum.

use crate::error::{EconomicsError, Result};
use npro_core::constants::SCHEDULE_HORIZON_EPOCHS;
use npro_core::Amount;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default initial emission per epoch, in whole NPRO
pub const DEFAULT_R0: Decimal = dec!(1892.824882239740);

/// Default per-epoch decay constant
pub const DEFAULT_LAMBDA: Decimal = dec!(0.00023664977144416);

/// Upper bound on R0 so that per-epoch base units stay well inside u128
const MAX_R0: Decimal = dec!(1000000000000);

/// Stop the exp series once terms drop below the last representable digit
const EXP_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 28);

/// Exponential-decay emission curve R(t) = R0 · e^(−λt)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionCurve {
    /// Emission at t = 0, in whole tokens
    pub r0: Decimal,
    /// Decay constant per epoch
    pub lambda: Decimal,
}

impl Default for EmissionCurve {
    fn default() -> Self {
        Self {
            r0: DEFAULT_R0,
            lambda: DEFAULT_LAMBDA,
        }
    }
}

impl EmissionCurve {
    pub fn new(r0: Decimal, lambda: Decimal) -> Result<Self> {
        if r0 <= Decimal::ZERO || r0 > MAX_R0 {
            return Err(EconomicsError::InvalidParameter {
                name: "emission r0",
                value: r0.to_string(),
            });
        }
        if lambda <= Decimal::ZERO || lambda > Decimal::ONE {
            return Err(EconomicsError::InvalidParameter {
                name: "emission lambda",
                value: lambda.to_string(),
            });
        }
        Ok(Self { r0, lambda })
    }

    /// e^(−λt), or zero once it falls below Decimal's range
    pub fn decay_factor(&self, t: u64) -> Decimal {
        if t == 0 {
            return Decimal::ONE;
        }
        self.lambda
            .checked_mul(Decimal::from(t))
            .and_then(|exponent| (-exponent).checked_exp_with_tolerance(EXP_TOLERANCE))
            .unwrap_or(Decimal::ZERO)
    }

    /// R(t) in whole tokens
    pub fn rate_at(&self, t: u64) -> Decimal {
        self.r0 * self.decay_factor(t)
    }

    /// R(t) in base units, floored
    pub fn emission_at(&self, t: u64) -> Amount {
        // r0 is bounded by MAX_R0 and the decay factor by 1, so this cannot overflow
        Amount::from_decimal(self.rate_at(t)).unwrap_or(Amount::ZERO)
    }

    /// (R0/λ) · (e^(−λa) − e^(−λb)) in whole tokens, for offsets a <= b
    pub fn integral(&self, a: u64, b: u64) -> Decimal {
        if a >= b {
            return Decimal::ZERO;
        }
        let span = self.decay_factor(a) - self.decay_factor(b);
        self.r0
            .checked_div(self.lambda)
            .and_then(|scale| scale.checked_mul(span))
            .unwrap_or(Decimal::MAX)
    }
}

/// Emission curve bound to its position on the epoch axis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    pub curve: EmissionCurve,
    /// Epoch at which t = 0
    pub start_epoch: u64,
    /// Offset of the last emitting epoch; the schedule covers t ∈ [0, horizon_epochs]
    pub horizon_epochs: u64,
}

impl Default for EmissionSchedule {
    fn default() -> Self {
        Self {
            curve: EmissionCurve::default(),
            start_epoch: npro_core::constants::START_EPOCH,
            horizon_epochs: SCHEDULE_HORIZON_EPOCHS,
        }
    }
}

impl EmissionSchedule {
    pub fn new(curve: EmissionCurve, start_epoch: u64, horizon_epochs: u64) -> Self {
        Self {
            curve,
            start_epoch,
            horizon_epochs,
        }
    }

    /// Last epoch that emits anything
    pub fn final_epoch(&self) -> u64 {
        self.start_epoch.saturating_add(self.horizon_epochs)
    }

    /// Clamp an epoch into the emitting window
    pub fn clamp_epoch(&self, epoch: u64) -> u64 {
        epoch.clamp(self.start_epoch, self.final_epoch())
    }

    /// Curve offset of `epoch`, or `None` outside the schedule window
    pub fn offset_of(&self, epoch: u64) -> Option<u64> {
        if epoch > self.final_epoch() {
            return None;
        }
        epoch.checked_sub(self.start_epoch)
    }

    /// Network-wide emission for `epoch`, zero outside the schedule window
    pub fn emission_at_epoch(&self, epoch: u64) -> Amount {
        match self.offset_of(epoch) {
            Some(t) => self.curve.emission_at(t),
            None => Amount::ZERO,
        }
    }

    /// Exact emission over `[from, to]`, summed epoch by epoch
    pub fn total_emission(&self, from: u64, to: u64) -> Amount {
        match self.window(from, to) {
            Some((lo, hi)) => (lo..=hi).map(|t| self.curve.emission_at(t)).sum(),
            None => Amount::ZERO,
        }
    }

    /// Closed-form approximation of [`Self::total_emission`] over `[from, to]`
    pub fn cumulative_emission(&self, from: u64, to: u64) -> Amount {
        let Some((lo, hi)) = self.window(from, to) else {
            return Amount::ZERO;
        };

        let tokens = self.curve.integral(lo, hi.saturating_add(1));
        Amount::from_decimal(tokens).unwrap_or_else(|err| {
            warn!("cumulative emission saturated: {}", err);
            Amount::from_base_units(u128::MAX)
        })
    }

    /// Share of the whole schedule released by the end of `epoch`, in [0, 1]
    pub fn released_fraction(&self, epoch: u64) -> Decimal {
        if epoch < self.start_epoch {
            return Decimal::ZERO;
        }
        if epoch >= self.final_epoch() {
            return Decimal::ONE;
        }

        let elapsed = epoch - self.start_epoch + 1;
        let released = Decimal::ONE - self.curve.decay_factor(elapsed);
        let total = Decimal::ONE - self.curve.decay_factor(self.horizon_epochs.saturating_add(1));

        if total.is_zero() {
            return Decimal::ONE;
        }
        (released / total).min(Decimal::ONE)
    }

    /// [`Self::released_fraction`] as a percentage rounded to 4 places
    pub fn percent_released(&self, epoch: u64) -> Decimal {
        (self.released_fraction(epoch) * Decimal::ONE_HUNDRED).round_dp(4)
    }

    /// Curve offsets covered by `[from, to]` after clamping to the schedule
    fn window(&self, from: u64, to: u64) -> Option<(u64, u64)> {
        let from = from.max(self.start_epoch);
        let to = to.min(self.final_epoch());
        if from > to {
            return None;
        }
        Some((from - self.start_epoch, to - self.start_epoch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npro_core::constants::ONE_NPRO;
    use proptest::prelude::*;

    fn schedule() -> EmissionSchedule {
        EmissionSchedule::default()
    }

    #[test]
    fn test_emission_at_zero_is_r0() {
        let curve = EmissionCurve::default();
        assert_eq!(curve.rate_at(0), dec!(1892.824882239740));
        assert_eq!(
            curve.emission_at(0).base_units(),
            1_892_824_882_239_740_000_000_000_000
        );
    }

    #[test]
    fn test_emission_decays_to_quarter_at_horizon() {
        let curve = EmissionCurve::default();
        let ratio = curve.rate_at(SCHEDULE_HORIZON_EPOCHS) / curve.r0;
        assert!(ratio > dec!(0.2499) && ratio < dec!(0.2501), "ratio {ratio}");
    }

    #[test]
    fn test_half_life() {
        let curve = EmissionCurve::default();
        // ln 2 / λ ≈ 2929.03
        let ratio = curve.rate_at(2929) / curve.r0;
        assert!((ratio - dec!(0.5)).abs() < dec!(0.0001), "ratio {ratio}");
    }

    #[test]
    fn test_curve_validation() {
        assert!(EmissionCurve::new(Decimal::ZERO, DEFAULT_LAMBDA).is_err());
        assert!(EmissionCurve::new(dec!(-1), DEFAULT_LAMBDA).is_err());
        assert!(EmissionCurve::new(DEFAULT_R0, Decimal::ZERO).is_err());
        assert!(EmissionCurve::new(DEFAULT_R0, dec!(2)).is_err());
        assert!(EmissionCurve::new(dec!(10), dec!(0.01)).is_ok());
    }

    #[test]
    fn test_schedule_window() {
        let sched = EmissionSchedule::new(EmissionCurve::default(), 100, 10);
        assert_eq!(sched.final_epoch(), 110);
        assert_eq!(sched.emission_at_epoch(99), Amount::ZERO);
        assert_eq!(sched.emission_at_epoch(100), sched.curve.emission_at(0));
        assert_eq!(sched.emission_at_epoch(110), sched.curve.emission_at(10));
        assert_eq!(sched.emission_at_epoch(111), Amount::ZERO);
        assert_eq!(sched.clamp_epoch(5), 100);
        assert_eq!(sched.clamp_epoch(500), 110);
    }

    #[test]
    fn test_cumulative_matches_exact_sum() {
        let sched = schedule();
        for (from, to) in [(0, 299), (1_000, 1_999), (0, SCHEDULE_HORIZON_EPOCHS)] {
            let exact = sched.total_emission(from, to).base_units() as f64;
            let approx = sched.cumulative_emission(from, to).base_units() as f64;
            let rel = (exact - approx).abs() / exact;
            assert!(rel < 0.01, "[{from}, {to}] relative gap {rel}");
            // Left Riemann sum of a decreasing curve overshoots the integral
            assert!(exact > approx);
        }
    }

    #[test]
    fn test_cumulative_empty_range() {
        let sched = schedule();
        assert_eq!(sched.cumulative_emission(10, 9), Amount::ZERO);
        assert_eq!(sched.total_emission(10, 9), Amount::ZERO);
    }

    #[test]
    fn test_whole_schedule_total() {
        // (R0/λ)·(1 − e^(−λ·5860)) ≈ 5.998M NPRO
        let total = schedule().cumulative_emission(0, u64::MAX);
        let whole = total.base_units() / ONE_NPRO;
        assert!((5_990_000..6_010_000).contains(&whole), "total {whole}");
    }

    #[test]
    fn test_released_fraction() {
        let sched = schedule();
        assert_eq!(sched.percent_released(sched.final_epoch()), dec!(100));
        assert_eq!(sched.percent_released(u64::MAX), dec!(100));

        let first = sched.percent_released(0);
        assert!(first > Decimal::ZERO && first < dec!(0.1), "first {first}");

        let halfway = sched.percent_released(2_929);
        assert!(halfway > dec!(60) && halfway < dec!(70), "halfway {halfway}");

        let late = EmissionSchedule::new(EmissionCurve::default(), 50, 100);
        assert_eq!(late.released_fraction(49), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn emission_strictly_decreasing(a in 0u64..SCHEDULE_HORIZON_EPOCHS, b in 0u64..SCHEDULE_HORIZON_EPOCHS) {
            prop_assume!(a != b);
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            let curve = EmissionCurve::default();
            let early = curve.emission_at(lo);
            let late = curve.emission_at(hi);
            prop_assert!(early > late, "R({})={} <= R({})={}", lo, early, hi, late);
            prop_assert!(!late.is_zero());
        }

        #[test]
        fn released_fraction_monotonic(a in 0u64..=SCHEDULE_HORIZON_EPOCHS, b in 0u64..=SCHEDULE_HORIZON_EPOCHS) {
            let sched = EmissionSchedule::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(sched.released_fraction(lo) <= sched.released_fraction(hi));
        }
    }
}
