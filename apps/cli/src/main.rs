#![deny(warnings)]

//! Headless driver: runs the stock trade-policy scenarios or a sampled
//! sensitivity sweep and prints the results as JSON or YAML.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trade_core::{CalibrationRecord, DynamicsParams, MetricWeights};
use trade_econ::SolverConfig;
use trade_runtime::{
    run_all, run_sweep, sampled_cases, summarize, Baseline, RunOptions, ScenarioConfig,
    StockPolicy, SweepRanges, DEFAULT_PERIODS,
};

#[derive(Parser, Debug)]
#[command(name = "chip-trade")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")"))]
#[command(about = "Semiconductor trade-policy scenario engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one stock scenario or all of them
    Run {
        /// Scenario name, or `all`
        #[arg(long, default_value = "all")]
        scenario: String,

        /// Print only the per-scenario summaries
        #[arg(long)]
        summary_only: bool,

        /// Fail on the first period whose equilibrium does not converge
        #[arg(long)]
        abort_on_nonconvergence: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run every stock scenario under seeded sensitivity cases
    Sweep {
        /// Seed for case sampling
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of sampled cases
        #[arg(long, default_value_t = 8)]
        cases: usize,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Number of yearly periods to simulate
    #[arg(long, default_value_t = DEFAULT_PERIODS)]
    periods: u32,

    /// Calibration record (YAML); defaults to the built-in reference calibration
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Per-period discount rate for the objective
    #[arg(long, default_value_t = 0.05)]
    discount_rate: f64,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn load_baseline(path: Option<&Path>) -> Result<Baseline> {
    let baseline = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading calibration {}", path.display()))?;
            let record: CalibrationRecord = serde_yaml::from_str(&text)
                .with_context(|| format!("parsing calibration {}", path.display()))?;
            Baseline::from_calibration(&record, DynamicsParams::default(), MetricWeights::default())
                .with_context(|| format!("invalid calibration {}", path.display()))?
        }
        None => Baseline::reference().context("reference calibration")?,
    };
    Ok(baseline)
}

fn select(baseline: &Baseline, scenario: &str, periods: u32) -> Result<Vec<ScenarioConfig>> {
    if scenario == "all" {
        return Ok(baseline.stock_scenarios(periods));
    }
    let Some(policy) = StockPolicy::from_name(scenario) else {
        let known: Vec<_> = StockPolicy::ALL.iter().map(|p| p.name()).collect();
        bail!("unknown scenario {scenario:?}; expected `all` or one of {}", known.join(", "));
    };
    Ok(vec![baseline.scenario(policy, periods)])
}

fn emit<T: Serialize>(value: &T, format: Format) -> Result<()> {
    let text = match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{text}");
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            summary_only,
            abort_on_nonconvergence,
            common,
        } => {
            let baseline = load_baseline(common.calibration.as_deref())?;
            let configs = select(&baseline, &scenario, common.periods)?;
            let options = RunOptions {
                solver: SolverConfig::default(),
                abort_on_nonconvergence,
                discount_rate: common.discount_rate,
            };
            info!(scenarios = configs.len(), periods = common.periods, "starting run");
            let series = run_all(&configs, &options)
                .into_iter()
                .collect::<Result<Vec<_>, _>>()
                .context("scenario run failed")?;
            if summary_only {
                let summaries: Vec<_> = series.iter().map(summarize).collect();
                emit(&summaries, common.format)?;
            } else {
                emit(&series, common.format)?;
            }
        }
        Commands::Sweep {
            seed,
            cases,
            common,
        } => {
            let baseline = load_baseline(common.calibration.as_deref())?;
            let configs = baseline.stock_scenarios(common.periods);
            let cases = sampled_cases(seed, cases, &SweepRanges::default());
            let options = RunOptions {
                discount_rate: common.discount_rate,
                ..RunOptions::default()
            };
            info!(seed, cases = cases.len(), periods = common.periods, "starting sweep");
            let outcomes = run_sweep(&configs, &cases, &options).context("sweep failed")?;
            emit(&outcomes, common.format)?;
        }
    }
    Ok(())
}
