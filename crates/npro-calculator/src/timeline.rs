//! # Release Timeline
//!
//! Maps a 0–100 "percent of NPRO released" slider onto calendar dates. The
//! scale is piecewise linear with a marker at the end of pre-staking:
//!
//! ```text
//!  0%            8.33%                                      100%
//!  |──────────────|──────────────────────────────────────────|
//!  now     pre-staking end                            staking end
//!          (2025-12-15)                               (2030-09-15)
//! ```
//!
//! The slider moves in 1824 discrete steps and snaps onto the pre-staking
//! marker when released within half a percent of it. Once pre-staking has
//! ended the first segment collapses and every position at or below the
//! marker maps to the pre-staking end date.

use chrono::{DateTime, Duration, Utc};
use npro_core::constants::{PRE_STAKING_END_UNIX, PRE_STAKING_RELEASE_PERCENT, STAKING_END_UNIX};
use serde::{Deserialize, Serialize};

/// Discrete positions on the slider
pub const SLIDER_STEPS: u32 = 1824;

/// Distance (in percent) within which the slider snaps to the pre-staking marker
pub const SNAP_THRESHOLD: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReleaseTimeline {
    pub pre_staking_end: DateTime<Utc>,
    pub staking_end: DateTime<Utc>,
    /// Slider position of `pre_staking_end`
    pub pre_staking_percent: f64,
}

impl Default for ReleaseTimeline {
    fn default() -> Self {
        Self {
            pre_staking_end: DateTime::from_timestamp(PRE_STAKING_END_UNIX, 0).unwrap_or_default(),
            staking_end: DateTime::from_timestamp(STAKING_END_UNIX, 0).unwrap_or_default(),
            pre_staking_percent: PRE_STAKING_RELEASE_PERCENT,
        }
    }
}

impl ReleaseTimeline {
    pub fn new(pre_staking_end: DateTime<Utc>, staking_end: DateTime<Utc>, pre_staking_percent: f64) -> Self {
        Self {
            pre_staking_end,
            staking_end,
            pre_staking_percent,
        }
    }

    /// Target date for a slider position
    pub fn date_for_position(&self, now: DateTime<Utc>, percent: f64) -> DateTime<Utc> {
        let percent = clamp_percent(percent);
        let marker = self.pre_staking_percent;

        if percent <= marker {
            let start = now.min(self.pre_staking_end);
            let ratio = if marker > 0.0 { percent / marker } else { 1.0 };
            interpolate(start, self.pre_staking_end, ratio)
        } else {
            let ratio = (percent - marker) / (100.0 - marker);
            interpolate(self.pre_staking_end, self.staking_end, ratio)
        }
    }

    /// Slider position for a target date, clamped to [0, 100]
    pub fn position_for_date(&self, now: DateTime<Utc>, date: DateTime<Utc>) -> f64 {
        let marker = self.pre_staking_percent;

        let percent = if date <= self.pre_staking_end {
            let span = (self.pre_staking_end - now).num_milliseconds();
            if span <= 0 {
                marker
            } else {
                let ratio = (date - now).num_milliseconds() as f64 / span as f64;
                (ratio * marker).clamp(0.0, marker)
            }
        } else {
            let span = (self.staking_end - self.pre_staking_end).num_milliseconds();
            if span <= 0 {
                100.0
            } else {
                let ratio = (date - self.pre_staking_end).num_milliseconds() as f64 / span as f64;
                marker + ratio * (100.0 - marker)
            }
        };

        clamp_percent(percent)
    }

    /// Pull positions close to the pre-staking marker onto it
    pub fn snap(&self, percent: f64) -> f64 {
        if (percent - self.pre_staking_percent).abs() <= SNAP_THRESHOLD {
            self.pre_staking_percent
        } else {
            percent
        }
    }

    /// Nearest slider step for a position
    pub fn slider_step(&self, percent: f64) -> u32 {
        (clamp_percent(percent) / 100.0 * SLIDER_STEPS as f64).round() as u32
    }

    /// Position of a slider step, snapped
    pub fn percent_for_step(&self, step: u32) -> f64 {
        let percent = step.min(SLIDER_STEPS) as f64 / SLIDER_STEPS as f64 * 100.0;
        self.snap(percent)
    }

    /// Whether `date` falls before the end of pre-staking
    pub fn is_pre_staking(&self, date: DateTime<Utc>) -> bool {
        date <= self.pre_staking_end
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

fn interpolate(from: DateTime<Utc>, to: DateTime<Utc>, ratio: f64) -> DateTime<Utc> {
    let span_ms = (to - from).num_milliseconds() as f64;
    from + Duration::milliseconds((span_ms * ratio.clamp(0.0, 1.0)).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_anchor_positions() {
        let timeline = ReleaseTimeline::default();
        assert_eq!(timeline.date_for_position(now(), 0.0), now());
        assert_eq!(
            timeline.date_for_position(now(), PRE_STAKING_RELEASE_PERCENT),
            timeline.pre_staking_end
        );
        assert_eq!(timeline.date_for_position(now(), 100.0), timeline.staking_end);
        assert_eq!(timeline.date_for_position(now(), 250.0), timeline.staking_end);
    }

    #[test]
    fn test_position_round_trip() {
        let timeline = ReleaseTimeline::default();
        for percent in [0.0, 2.5, 8.33, 20.0, 54.321, 99.9, 100.0] {
            let date = timeline.date_for_position(now(), percent);
            let back = timeline.position_for_date(now(), date);
            assert!((back - percent).abs() < 1e-6, "{percent} -> {back}");
        }
    }

    #[test]
    fn test_position_clamps() {
        let timeline = ReleaseTimeline::default();
        let past = now() - Duration::days(30);
        let far = timeline.staking_end + Duration::days(365);
        assert_eq!(timeline.position_for_date(now(), past), 0.0);
        assert_eq!(timeline.position_for_date(now(), far), 100.0);
    }

    #[test]
    fn test_snap_to_marker() {
        let timeline = ReleaseTimeline::default();
        assert_eq!(timeline.snap(8.0), 8.33);
        assert_eq!(timeline.snap(8.8), 8.33);
        assert_eq!(timeline.snap(9.0), 9.0);
        assert_eq!(timeline.snap(7.5), 7.5);
    }

    #[test]
    fn test_slider_steps() {
        let timeline = ReleaseTimeline::default();
        assert_eq!(timeline.slider_step(0.0), 0);
        assert_eq!(timeline.slider_step(100.0), SLIDER_STEPS);
        assert_eq!(timeline.slider_step(50.0), 912);
        assert_eq!(timeline.percent_for_step(SLIDER_STEPS), 100.0);
        // Step 152 sits at 8.33% give or take rounding and snaps onto the marker
        assert_eq!(timeline.percent_for_step(152), 8.33);
        assert_eq!(timeline.percent_for_step(5_000), 100.0);
    }

    #[test]
    fn test_after_pre_staking_ends() {
        let timeline = ReleaseTimeline::default();
        let later = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(timeline.date_for_position(later, 0.0), timeline.pre_staking_end);
        assert_eq!(
            timeline.position_for_date(later, timeline.pre_staking_end - Duration::days(1)),
            8.33
        );
        assert!(!timeline.is_pre_staking(later));
        assert!(timeline.is_pre_staking(now()));
    }
}
