#![deny(warnings)]

//! Scenario runtime: policy paths, the period loop, parallel batches and
//! sensitivity sweeps on top of the solver, dynamics and metrics crates.

pub mod driver;
pub mod policy_path;
pub mod presets;
pub mod sweep;

pub use driver::{
    run_all, run_scenario, summarize, PeriodRecord, RunError, RunOptions, ScenarioConfig,
    ScenarioSummary, ScenarioTimeSeries,
};
pub use policy_path::{OverriddenPath, PolicyOverrides, PolicyPath, StockPolicy, EMBARGO_TARIFF};
pub use presets::{reference_calibration, Baseline, DEFAULT_PERIODS};
pub use sweep::{run_sweep, sampled_cases, SensitivityCase, SweepOutcome, SweepRanges};
