//! End-to-end estimates through configuration, oracle and accumulator

use chrono::{DateTime, Duration, TimeZone, Utc};
use npro_calculator::{
    CalculatorConfig, CalculatorError, CalculatorInput, EpochOrigin, PoolTotalMode,
    StakingCalculator,
};
use npro_core::{Amount, ManualClock};
use npro_oracle::BlockTimeOrigin;
use std::io::Write;
use std::sync::Arc;

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 22, 7, 12, 0).unwrap()
}

fn offline_calculator(config: &CalculatorConfig, now: DateTime<Utc>) -> StakingCalculator {
    StakingCalculator::from_config(config, Arc::new(ManualClock::new(now)), true).unwrap()
}

#[tokio::test]
async fn full_schedule_for_sole_staker_matches_total_emission() {
    let config = CalculatorConfig::default();
    let calculator = offline_calculator(&config, reference());
    let input = CalculatorInput::new("500", "0", Utc.with_ymd_and_hms(2035, 1, 1, 0, 0, 0).unwrap());

    let report = calculator.estimate(&input).await.unwrap();

    // Pool excludes the stake, so the staker holds the whole pool
    assert_eq!(report.pool_total, report.stake);
    assert_eq!(report.estimate.start_epoch, 0);
    assert_eq!(report.estimate.end_epoch, 5_859);
    assert!(report.horizon_clamped);
    assert_eq!(
        report.reward(),
        calculator.accumulator().schedule().total_emission(0, 5_859)
    );

    // Roughly 6M NPRO over the whole schedule
    let whole = report.reward().base_units() / 10u128.pow(24);
    assert!((5_990_000..6_010_000).contains(&whole), "{whole}");
}

#[tokio::test]
async fn distribution_end_date_pays_the_final_epoch() {
    let config = CalculatorConfig::default();
    let calculator = offline_calculator(&config, reference());
    let staking_end = config.timeline.staking_end;

    let report = calculator
        .estimate(&CalculatorInput::new("500", "0", staking_end))
        .await
        .unwrap();

    assert_eq!(report.estimate.end_epoch, calculator.accumulator().schedule().final_epoch());
    assert!(!report.horizon_clamped);
    assert_eq!(report.reward(), calculator.accumulator().schedule().total_emission(0, 5_859));
}

#[tokio::test]
async fn reward_scales_with_pool_share() {
    let calculator = offline_calculator(&CalculatorConfig::default(), reference());
    let end = reference() + Duration::days(90);

    let small = CalculatorInput::new("100", "1000000", end).with_pool_mode(PoolTotalMode::IncludesStake);
    let large = CalculatorInput::new("200", "1000000", end).with_pool_mode(PoolTotalMode::IncludesStake);

    let small = calculator.estimate(&small).await.unwrap().reward().base_units();
    let large = calculator.estimate(&large).await.unwrap().reward().base_units();

    // Per-epoch flooring can cost at most one base unit per epoch
    let epochs = 301;
    assert!(large >= 2 * small);
    assert!(large - 2 * small <= epochs);
}

#[tokio::test]
async fn configured_curve_flows_into_estimates() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[emission]
r0 = "1000"
lambda = "0.001"
horizon_epochs = 9

[oracle]
default_block_time = 1.2
"#
    )
    .unwrap();

    let config = CalculatorConfig::load_with(Some(file.path()), |_| None).unwrap();
    let calculator = offline_calculator(&config, reference());
    let input = CalculatorInput::new("1", "1", reference() + Duration::days(365))
        .with_pool_mode(PoolTotalMode::IncludesStake);

    let report = calculator.estimate(&input).await.unwrap();

    assert_eq!(report.block_time.block_time.seconds(), 1.2);
    assert_eq!(report.block_time.origin, BlockTimeOrigin::Default);
    assert_eq!(report.current_epoch.origin, EpochOrigin::WallClock);
    assert_eq!(report.estimate.end_epoch, 9);
    assert_eq!(report.estimate.epochs, 10);
    // Ten epochs, each slightly below r0
    assert!(report.reward() > Amount::from_whole(9_900));
    assert!(report.reward() < Amount::from_whole(10_000));
}

#[tokio::test]
async fn blank_inputs_ask_for_amounts() {
    let calculator = offline_calculator(&CalculatorConfig::default(), reference());
    let input = CalculatorInput::new(" ", "1000", reference() + Duration::days(1));

    let err = calculator.estimate(&input).await.unwrap_err();
    assert_eq!(err, CalculatorError::MissingInput);
    assert_eq!(err.to_string(), "enter valid amounts to see rewards");
}
