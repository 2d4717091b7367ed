//! # Epoch Clock
//!
//! Maps calendar dates to reward epochs and back, using the protocol
//! reference date and the current block-time estimate:
//!
//! ```text
//! epoch_duration = blocks_per_epoch × block_time
//! epoch(date)    = start_epoch + floor((date − reference_date) / epoch_duration)
//! ```
//!
//! Dates before the reference date clamp to `start_epoch`; the curve is never
//! evaluated at negative offsets.
//!
//! The mapping is a wall-clock approximation: its error grows as the live
//! block time drifts away from the estimate passed in. An authoritative
//! on-chain epoch should be preferred when one is available.

use crate::block_time::BlockTime;
use crate::clock::Clock;
use crate::constants::{BLOCKS_PER_EPOCH, REFERENCE_DATE_UNIX, START_EPOCH};
use crate::error::{NproError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// Roughly 31,000 years in milliseconds; keeps chrono arithmetic in range.
const MAX_OFFSET_MS: f64 = 1e15;

/// Date ↔ epoch conversion anchored at a fixed reference date
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochClock {
    /// Wall-clock instant of `start_epoch`
    pub reference_date: DateTime<Utc>,
    /// Epoch number at the reference date
    pub start_epoch: u64,
    /// Blocks produced per epoch
    pub blocks_per_epoch: u64,
}

impl Default for EpochClock {
    fn default() -> Self {
        Self {
            reference_date: DateTime::from_timestamp(REFERENCE_DATE_UNIX, 0)
                .unwrap_or_default(),
            start_epoch: START_EPOCH,
            blocks_per_epoch: BLOCKS_PER_EPOCH,
        }
    }
}

impl EpochClock {
    pub fn new(reference_date: DateTime<Utc>, start_epoch: u64, blocks_per_epoch: u64) -> Self {
        Self {
            reference_date,
            start_epoch,
            blocks_per_epoch,
        }
    }

    /// Length of one epoch in seconds for the given block time
    pub fn epoch_duration_secs(&self, block_time: BlockTime) -> f64 {
        self.blocks_per_epoch.max(1) as f64 * block_time.seconds()
    }

    /// Epoch containing `date`
    pub fn date_to_epoch(&self, date: DateTime<Utc>, block_time: BlockTime) -> u64 {
        let elapsed_ms = (date - self.reference_date).num_milliseconds();
        if elapsed_ms <= 0 {
            return self.start_epoch;
        }

        let elapsed_secs = elapsed_ms as f64 / 1000.0;
        let epochs = (elapsed_secs / self.epoch_duration_secs(block_time)).floor();
        self.start_epoch.saturating_add(epochs as u64)
    }

    /// Wall-clock instant at which `epoch` begins
    pub fn epoch_to_date(&self, epoch: u64, block_time: BlockTime) -> Result<DateTime<Utc>> {
        let offset = epoch as f64 - self.start_epoch as f64;
        let offset_ms = (offset * self.epoch_duration_secs(block_time) * 1000.0).round();

        if !offset_ms.is_finite() || offset_ms.abs() > MAX_OFFSET_MS {
            return Err(NproError::DateOutOfRange(epoch));
        }

        self.reference_date
            .checked_add_signed(Duration::milliseconds(offset_ms as i64))
            .ok_or(NproError::DateOutOfRange(epoch))
    }

    /// Whole epochs (rounded up) between `now` and `target`; 0 if `target` has passed
    pub fn epochs_until(&self, now: DateTime<Utc>, target: DateTime<Utc>, block_time: BlockTime) -> u64 {
        let remaining_ms = (target - now).num_milliseconds();
        if remaining_ms <= 0 {
            return 0;
        }
        let remaining_secs = remaining_ms as f64 / 1000.0;
        (remaining_secs / self.epoch_duration_secs(block_time)).ceil() as u64
    }

    /// Wall-clock estimate of the current epoch
    pub fn estimate_current_epoch(&self, clock: &dyn Clock, block_time: BlockTime) -> u64 {
        self.date_to_epoch(clock.now(), block_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn clock() -> EpochClock {
        EpochClock::default()
    }

    #[test]
    fn test_defaults() {
        let ec = clock();
        assert_eq!(ec.reference_date, Utc.with_ymd_and_hms(2025, 11, 22, 7, 12, 0).unwrap());
        assert_eq!(ec.start_epoch, 0);
        assert_eq!(ec.blocks_per_epoch, 43_200);
    }

    #[test]
    fn test_epoch_duration() {
        let ec = clock();
        assert!((ec.epoch_duration_secs(BlockTime::DEFAULT) - 25_920.0).abs() < 1e-9);
        let slow = BlockTime::new(1.0).unwrap();
        assert!((ec.epoch_duration_secs(slow) - 43_200.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_date_is_start_epoch() {
        let ec = EpochClock::new(clock().reference_date, 17, 43_200);
        for secs in [0.3, 0.6, 1.0, 1.3, 12.0] {
            let bt = BlockTime::new(secs).unwrap();
            assert_eq!(ec.date_to_epoch(ec.reference_date, bt), 17);
        }
    }

    #[test]
    fn test_epoch_boundaries() {
        let ec = clock();
        let bt = BlockTime::DEFAULT;
        let boundary = ec.reference_date + Duration::seconds(25_920);

        assert_eq!(ec.date_to_epoch(boundary - Duration::milliseconds(1), bt), 0);
        assert_eq!(ec.date_to_epoch(boundary, bt), 1);
        assert_eq!(ec.epoch_to_date(1, bt).unwrap(), boundary);
    }

    #[test]
    fn test_dates_before_reference_clamp() {
        let ec = EpochClock::new(clock().reference_date, 5, 43_200);
        let early = ec.reference_date - Duration::days(30);
        assert_eq!(ec.date_to_epoch(early, BlockTime::DEFAULT), 5);
    }

    #[test]
    fn test_round_trip() {
        let ec = clock();
        let bt = BlockTime::DEFAULT;
        for epoch in [0, 1, 100, 5_859, 10_000] {
            let date = ec.epoch_to_date(epoch, bt).unwrap();
            assert_eq!(ec.date_to_epoch(date, bt), epoch);
        }
    }

    #[test]
    fn test_staking_end_is_last_schedule_epoch() {
        use crate::constants::{SCHEDULE_HORIZON_EPOCHS, STAKING_END_UNIX};

        let ec = clock();
        let staking_end = Utc.timestamp_opt(STAKING_END_UNIX, 0).unwrap();
        assert_eq!(
            ec.date_to_epoch(staking_end, BlockTime::DEFAULT),
            START_EPOCH + SCHEDULE_HORIZON_EPOCHS
        );
        assert_eq!(
            ec.date_to_epoch(staking_end - Duration::seconds(1), BlockTime::DEFAULT),
            START_EPOCH + SCHEDULE_HORIZON_EPOCHS - 1
        );
    }

    #[test]
    fn test_epoch_to_date_before_start() {
        let ec = EpochClock::new(clock().reference_date, 10, 43_200);
        let date = ec.epoch_to_date(9, BlockTime::DEFAULT).unwrap();
        assert_eq!(date, ec.reference_date - Duration::seconds(25_920));
    }

    #[test]
    fn test_epoch_to_date_out_of_range() {
        let ec = clock();
        assert!(matches!(
            ec.epoch_to_date(u64::MAX, BlockTime::DEFAULT),
            Err(NproError::DateOutOfRange(_))
        ));
    }

    #[test]
    fn test_epochs_until_rounds_up() {
        let ec = clock();
        let bt = BlockTime::DEFAULT;
        let now = ec.reference_date;

        assert_eq!(ec.epochs_until(now, now, bt), 0);
        assert_eq!(ec.epochs_until(now, now - Duration::days(1), bt), 0);
        assert_eq!(ec.epochs_until(now, now + Duration::seconds(1), bt), 1);
        assert_eq!(ec.epochs_until(now, now + Duration::seconds(25_920), bt), 1);
        assert_eq!(ec.epochs_until(now, now + Duration::seconds(25_921), bt), 2);
    }

    #[test]
    fn test_estimate_current_epoch() {
        let ec = clock();
        let manual = ManualClock::new(ec.reference_date + Duration::days(3));
        // 3 days = 259,200s = 10 epochs of 25,920s
        assert_eq!(ec.estimate_current_epoch(&manual, BlockTime::DEFAULT), 10);
    }
}
