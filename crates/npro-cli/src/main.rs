//! NPRO CLI
//!
//! Command-line front end for the NPRO staking reward calculator.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use npro_calculator::{
    AmountUnits, CalculatorConfig, CalculatorInput, CalculatorReport, LoggingConfig,
    PoolTotalMode, StakingCalculator,
};
use npro_core::constants::{DISPLAY_PLACES, SYMBOL};
use npro_core::{Clock, SystemClock};
use npro_oracle::{BlockTimeReading, FixedEpochSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "npro")]
#[command(version)]
#[command(about = "NPRO staking reward calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (optional)
    #[arg(short, long, global = true, default_value = "npro.toml")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project rewards for a stake until a date
    Estimate(EstimateArgs),

    /// Show network-wide emission for an epoch or a range
    Emission {
        /// Single epoch
        #[arg(long, conflicts_with_all = ["from", "to"])]
        epoch: Option<u64>,

        /// First epoch of a range
        #[arg(long, requires = "to")]
        from: Option<u64>,

        /// Last epoch of a range (inclusive)
        #[arg(long, requires = "from")]
        to: Option<u64>,
    },

    /// Show the current average block time
    BlockTime {
        /// Skip the network and use the configured default
        #[arg(long)]
        offline: bool,
    },

    /// Convert between dates and epochs
    Epoch {
        /// Date to convert (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_date, conflicts_with = "epoch")]
        date: Option<DateTime<Utc>>,

        /// Epoch to convert
        #[arg(long)]
        epoch: Option<u64>,

        /// Skip the network and use the configured default block time
        #[arg(long)]
        offline: bool,
    },

    /// Map between release-slider positions and dates
    Timeline {
        /// Slider position in percent
        #[arg(long, conflicts_with = "date")]
        percent: Option<f64>,

        /// Target date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct EstimateArgs {
    /// Amount to stake
    #[arg(long)]
    stake: String,

    /// Pool total
    #[arg(long)]
    pool: String,

    /// Last day of staking (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_date)]
    until: DateTime<Utc>,

    /// The pool total already includes the stake
    #[arg(long)]
    pool_includes_stake: bool,

    /// Stake and pool are integer base units rather than tokens
    #[arg(long)]
    base_units: bool,

    /// Rewards already earned, in base units
    #[arg(long)]
    earned: Option<String>,

    /// Current epoch as reported by the chain
    #[arg(long)]
    current_epoch: Option<u64>,

    /// Skip the network and use the configured default block time
    #[arg(long)]
    offline: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date {raw:?}, expected YYYY-MM-DD or RFC 3339"))
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let json = logging.format == "json";
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
    });
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .init();
}

fn describe_block_time(reading: &BlockTimeReading) -> String {
    format!("{} ({:?})", reading.block_time, reading.origin)
}

fn print_report(report: &CalculatorReport) {
    println!("Estimated reward: {} {}", report.reward_display, SYMBOL);
    if !report.earned.is_zero() {
        println!("Already earned:   {} {}", report.earned, SYMBOL);
        println!("Projected total:  {} {}", report.projected_total, SYMBOL);
    }
    println!();
    println!(
        "Epochs:           {}..={} ({} epochs)",
        report.estimate.start_epoch, report.estimate.end_epoch, report.estimate.epochs
    );
    println!("Epochs until end: {}", report.epochs_until_end);
    println!("Schedule released by end: {}%", report.percent_released);
    println!("Current epoch:    {} ({:?})", report.current_epoch.epoch, report.current_epoch.origin);
    println!("Block time:       {}", describe_block_time(&report.block_time));
    println!("Pool total:       {}", report.pool_total);
    if report.horizon_clamped {
        println!("Note: end date lies beyond the distribution schedule; counted up to its last epoch");
    }
    if report.pre_staking {
        println!("Note: end date falls within the pre-staking period");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CalculatorConfig::load(Some(cli.config.as_path()))
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_logging(cli.verbose, &config.logging);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Commands::Estimate(args) => {
            let mut calculator = StakingCalculator::from_config(&config, clock, args.offline)?;
            if let Some(epoch) = args.current_epoch {
                calculator = calculator.with_chain_epochs(Arc::new(FixedEpochSource(epoch)));
            }

            let mut input = CalculatorInput::new(args.stake, args.pool, args.until);
            if args.pool_includes_stake {
                input = input.with_pool_mode(PoolTotalMode::IncludesStake);
            }
            if args.base_units {
                input = input.with_units(AmountUnits::BaseUnits);
            }
            if let Some(earned) = args.earned {
                input = input.with_earned(earned);
            }

            let report = calculator.estimate(&input).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Emission { epoch, from, to } => {
            let schedule = config.emission_schedule()?;
            match (epoch, from, to) {
                (Some(epoch), _, _) => {
                    println!(
                        "Epoch {}: {} {}",
                        epoch,
                        schedule.emission_at_epoch(epoch).to_decimal_string(DISPLAY_PLACES),
                        SYMBOL
                    );
                    println!("Released by end of epoch: {}%", schedule.percent_released(epoch));
                }
                (None, Some(from), Some(to)) => {
                    let exact = schedule.total_emission(from, to);
                    let approx = schedule.cumulative_emission(from, to);
                    println!("Epochs {from}..={to}");
                    println!("Exact sum:   {} {}", exact.to_decimal_string(DISPLAY_PLACES), SYMBOL);
                    println!("Closed form: {} {}", approx.to_decimal_string(DISPLAY_PLACES), SYMBOL);
                    if !exact.is_zero() {
                        let gap = (exact.base_units() as f64 - approx.base_units() as f64).abs()
                            / exact.base_units() as f64;
                        println!("Relative gap: {:.6}%", gap * 100.0);
                    }
                }
                _ => anyhow::bail!("pass --epoch, or --from together with --to"),
            }
        }

        Commands::BlockTime { offline } => {
            let oracle = config.block_time_oracle(clock, offline)?;
            let reading = oracle.current_block_time().await;
            println!("Average block time: {}", describe_block_time(&reading));
            println!(
                "Epoch duration: {:.1} hours",
                config.epoch_clock().epoch_duration_secs(reading.block_time) / 3600.0
            );
        }

        Commands::Epoch { date, epoch, offline } => {
            let oracle = config.block_time_oracle(clock.clone(), offline)?;
            let reading = oracle.current_block_time().await;
            let epochs = config.epoch_clock();

            match (date, epoch) {
                (Some(date), _) => {
                    println!("{} -> epoch {}", date.to_rfc3339(), epochs.date_to_epoch(date, reading.block_time));
                }
                (None, Some(epoch)) => {
                    let date = epochs.epoch_to_date(epoch, reading.block_time)?;
                    println!("Epoch {} -> {}", epoch, date.to_rfc3339());
                }
                (None, None) => {
                    let current = epochs.estimate_current_epoch(clock.as_ref(), reading.block_time);
                    println!("Current epoch (wall-clock estimate): {current}");
                }
            }
            println!("Block time: {}", describe_block_time(&reading));
        }

        Commands::Timeline { percent, date } => {
            let timeline = config.release_timeline();
            let now = clock.now();
            match (percent, date) {
                (Some(percent), _) => {
                    let snapped = timeline.snap(percent);
                    println!("{snapped:.2}% -> {}", timeline.date_for_position(now, snapped).to_rfc3339());
                }
                (None, Some(date)) => {
                    println!("{} -> {:.2}%", date.to_rfc3339(), timeline.position_for_date(now, date));
                }
                (None, None) => {
                    println!("Pre-staking ends:  {} ({}%)", timeline.pre_staking_end.to_rfc3339(), timeline.pre_staking_percent);
                    println!("Distribution ends: {} (100%)", timeline.staking_end.to_rfc3339());
                }
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
