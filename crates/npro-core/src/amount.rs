//! # Fixed-Point Amount Codec
//!
//! Token quantities are carried as integer base units (10^24 per NPRO/NEAR)
//! and only turned into human decimals at the display boundary.
//!
//! ```text
//! "1.5"  ──parse_decimal──▶  1_500_000_000_000_000_000_000_000
//!                                          │
//! "1.500000" ◀──to_decimal_string(6)───────┘
//! ```
//!
//! Parsing scales the digit strings straight into `u128`, never through
//! binary floating point. [`Amount::from_decimal`] takes curve values computed
//! in [`rust_decimal::Decimal`].

use crate::constants::{DISPLAY_PLACES, NPRO_DECIMALS, ONE_NPRO};
use crate::error::{NproError, Result};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Non-negative token amount in base units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    /// Zero base units
    pub const ZERO: Amount = Amount(0);

    /// Wrap a raw base-unit value
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Whole tokens, saturating at the base-unit ceiling
    pub fn from_whole(tokens: u64) -> Self {
        Self((tokens as u128).saturating_mul(ONE_NPRO))
    }

    /// Raw base-unit value
    pub const fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a human-decimal string ("12.5") into base units.
    ///
    /// Only plain ASCII digits with an optional single `.` are accepted.
    /// Fractional digits beyond 24 places are truncated.
    pub fn parse_decimal(input: &str) -> Result<Self> {
        let invalid = || NproError::InvalidAmount(input.to_string());
        let overflow = || NproError::AmountOverflow(input.to_string());

        let trimmed = input.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction) {
            return Err(invalid());
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| overflow())?
        }
        .checked_mul(ONE_NPRO)
        .ok_or_else(overflow)?;

        let kept = &fraction[..fraction.len().min(NPRO_DECIMALS as usize)];
        let fraction_units = if kept.is_empty() {
            0
        } else {
            kept.parse::<u128>().map_err(|_| invalid())? * 10u128.pow(NPRO_DECIMALS - kept.len() as u32)
        };

        whole_units
            .checked_add(fraction_units)
            .map(Self)
            .ok_or_else(overflow)
    }

    /// Parse an integer base-unit string as supplied by the wallet layer
    pub fn parse_base_units(input: &str) -> Result<Self> {
        input
            .trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|_| NproError::InvalidAmount(input.to_string()))
    }

    /// Convert a display-unit decimal (curve output) to base units, flooring partial units
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(NproError::InvalidAmount(value.to_string()));
        }

        let mantissa = value.mantissa().unsigned_abs();
        let scale = value.scale();

        let units = if scale <= NPRO_DECIMALS {
            10u128
                .checked_pow(NPRO_DECIMALS - scale)
                .and_then(|factor| mantissa.checked_mul(factor))
                .ok_or_else(|| NproError::AmountOverflow(value.to_string()))?
        } else {
            mantissa / 10u128.pow(scale - NPRO_DECIMALS)
        };

        Ok(Self(units))
    }

    /// Render as a human decimal with `places` fractional digits (half-up)
    pub fn to_decimal_string(&self, places: u32) -> String {
        let places = places.min(NPRO_DECIMALS);
        let divisor = 10u128.pow(NPRO_DECIMALS - places);

        let mut rounded = self.0 / divisor;
        if divisor > 1 && self.0 % divisor >= divisor / 2 {
            rounded += 1;
        }

        if places == 0 {
            return rounded.to_string();
        }

        let unit = 10u128.pow(places);
        format!(
            "{}.{:0width$}",
            rounded / unit,
            rounded % unit,
            width = places as usize
        )
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        self.saturating_add(rhs)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string(DISPLAY_PLACES))
    }
}

impl FromStr for Amount {
    type Err = NproError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_decimal(s)
    }
}

// Base units go over the wire as decimal-integer strings; u128 does not
// survive a round trip through JSON numbers in most consumers.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse_base_units(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(Amount::parse_decimal("1").unwrap(), Amount::from_base_units(ONE_NPRO));
        assert_eq!(
            Amount::parse_decimal("1.5").unwrap().base_units(),
            1_500_000_000_000_000_000_000_000
        );
        assert_eq!(Amount::parse_decimal(" 0.000000000000000000000001 ").unwrap().base_units(), 1);
    }

    #[test]
    fn test_parse_large_pool_total() {
        // A million tokens is 10^30 base units, far beyond Decimal's mantissa
        let pool = Amount::parse_decimal("1000000").unwrap();
        assert_eq!(pool.base_units(), 1_000_000 * ONE_NPRO);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "   ", ".", "abc", "12x", "1.2.3", "-5", "-0.1", "+5", "1_000", "1e3", "1 000"] {
            assert!(
                matches!(Amount::parse_decimal(bad), Err(NproError::InvalidAmount(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_keeps_every_digit() {
        // 30 significant digits, more than a Decimal mantissa holds
        let amount = Amount::parse_decimal("123456.123456789012345678901234").unwrap();
        assert_eq!(amount.base_units(), 123_456_123_456_789_012_345_678_901_234);

        let max_fraction = Amount::parse_decimal("99999.999999999999999999999999").unwrap();
        assert_eq!(max_fraction.base_units(), 99_999_999_999_999_999_999_999_999_999);
    }

    #[test]
    fn test_parse_truncates_past_24_places() {
        let amount = Amount::parse_decimal("0.0000000000000000000000019").unwrap();
        assert_eq!(amount.base_units(), 1);
        let amount = Amount::parse_decimal("7.9999999999999999999999999999").unwrap();
        assert_eq!(amount.base_units(), 8 * ONE_NPRO - 1);
    }

    #[test]
    fn test_parse_partial_forms() {
        assert_eq!(Amount::parse_decimal(".5").unwrap().base_units(), ONE_NPRO / 2);
        assert_eq!(Amount::parse_decimal("5.").unwrap(), Amount::from_whole(5));
        assert_eq!(Amount::parse_decimal("007.50").unwrap().base_units(), 7 * ONE_NPRO + ONE_NPRO / 2);
    }

    #[test]
    fn test_parse_overflow() {
        // u128::MAX / 10^24 is roughly 3.4 * 10^14 tokens
        let err = Amount::parse_decimal("1000000000000000").unwrap_err();
        assert!(matches!(err, NproError::AmountOverflow(_)));
    }

    #[test]
    fn test_from_decimal_floors() {
        let amount = Amount::from_decimal(dec!(0.0000000000000000000000019)).unwrap();
        assert_eq!(amount.base_units(), 1);
    }

    #[test]
    fn test_parse_base_units() {
        assert_eq!(Amount::parse_base_units("42").unwrap().base_units(), 42);
        assert!(Amount::parse_base_units("4.2").is_err());
        assert!(Amount::parse_base_units("-1").is_err());
    }

    #[test]
    fn test_display_rounding() {
        let amount = Amount::parse_decimal("1892.8248825").unwrap();
        assert_eq!(amount.to_decimal_string(6), "1892.824883");
        assert_eq!(amount.to_decimal_string(2), "1892.82");
        assert_eq!(amount.to_decimal_string(0), "1893");
        assert_eq!(Amount::ZERO.to_decimal_string(2), "0.00");
        assert_eq!(Amount::from_base_units(1).to_decimal_string(24), "0.000000000000000000000001");
        assert_eq!(format!("{}", Amount::from_whole(3)), "3.000000");
    }

    #[test]
    fn test_saturating_sum() {
        let total: Amount = [Amount::from_base_units(u128::MAX), Amount::from_base_units(1)]
            .into_iter()
            .sum();
        assert_eq!(total.base_units(), u128::MAX);
        assert!(Amount::from_base_units(u128::MAX).checked_add(Amount::from_base_units(1)).is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let amount = Amount::from_base_units(1_000_000_000_000_000_000_000_000_000);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000000000000000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    proptest! {
        #[test]
        fn display_round_trip_within_tolerance(units in 0u128..(1u128 << 100)) {
            let amount = Amount::from_base_units(units);
            let shown = amount.to_decimal_string(DISPLAY_PLACES);
            let back = Amount::parse_decimal(&shown).unwrap();
            let half_step = 10u128.pow(NPRO_DECIMALS - DISPLAY_PLACES) / 2;
            prop_assert!(back.base_units().abs_diff(units) <= half_step);
        }
    }
}
