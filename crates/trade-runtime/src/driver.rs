//! Scenario driver: threads state through solve → score → advance.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use trade_core::{
    validate_params, validate_state, ConvergenceFailure, EquilibriumResult, ParameterError,
    PeriodState, PolicyInputs, RegionTierGrid, ScenarioParams, Tier, TierValues,
};
use trade_dynamics::{advance, DegenerateStateWarning};
use trade_econ::{solve, SolverConfig};
use trade_metrics::{discount, rival_import_share, score, PeriodScore};

use crate::policy_path::PolicyPath;

/// Everything needed to run one scenario.
#[derive(Clone)]
pub struct ScenarioConfig {
    pub name: String,
    /// Calendar year of the first period.
    pub start_year: i32,
    pub periods: u32,
    pub initial_state: PeriodState,
    pub params: ScenarioParams,
    pub policy: Arc<dyn PolicyPath>,
}

impl fmt::Debug for ScenarioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioConfig")
            .field("name", &self.name)
            .field("start_year", &self.start_year)
            .field("periods", &self.periods)
            .field("initial_state", &self.initial_state)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Run-wide settings shared by every scenario in a batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    pub solver: SolverConfig,
    /// Fail the scenario on the first unconverged period instead of recording it.
    pub abort_on_nonconvergence: bool,
    /// Per-period discount rate for the objective, in [0, 1).
    pub discount_rate: f64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            abort_on_nonconvergence: false,
            discount_rate: 0.05,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("scenario {scenario}: invalid parameter in period {period}: {source}")]
    InvalidParameter {
        scenario: String,
        period: u32,
        #[source]
        source: ParameterError,
    },
    #[error("scenario {scenario}: {source}")]
    Convergence {
        scenario: String,
        #[source]
        source: ConvergenceFailure,
    },
    #[error("scenario {scenario} has no periods to run")]
    NoPeriods { scenario: String },
}

/// One simulated period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: u32,
    pub year: i32,
    /// State the period was solved from.
    pub state: PeriodState,
    pub policy: PolicyInputs,
    pub equilibrium: EquilibriumResult,
    pub investment: RegionTierGrid<f64>,
    pub score: PeriodScore,
    /// Share of Home consumption sourced from Rival, per tier.
    pub home_import_share_from_rival: TierValues<f64>,
    pub warnings: Vec<DegenerateStateWarning>,
}

/// Ordered, append-only record of a scenario run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTimeSeries {
    pub scenario: String,
    pub start_year: i32,
    pub discount_rate: f64,
    pub periods: Vec<PeriodRecord>,
    pub unconverged_periods: Vec<u32>,
    pub discounted_objective: f64,
    /// State after the last period's transition.
    pub final_state: PeriodState,
}

impl ScenarioTimeSeries {
    pub fn objectives(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.score.objective).collect()
    }
}

/// Headline numbers for comparing scenarios.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub discounted_objective: f64,
    pub end_nsi: f64,
    pub end_welfare: f64,
    pub unconverged_periods: usize,
}

/// Run one scenario to completion.
///
/// Parameter problems fail the run. Unconverged periods are logged and
/// recorded unless `options.abort_on_nonconvergence` is set; floor clamps are
/// logged and kept on the period record.
pub fn run_scenario(
    config: &ScenarioConfig,
    options: &RunOptions,
) -> Result<ScenarioTimeSeries, RunError> {
    let invalid = |period: u32| {
        let scenario = config.name.clone();
        move |source| RunError::InvalidParameter {
            scenario,
            period,
            source,
        }
    };
    let first = config.initial_state.period;
    if config.periods == 0 {
        return Err(RunError::NoPeriods {
            scenario: config.name.clone(),
        });
    }
    validate_params(&config.params).map_err(invalid(first))?;
    validate_state(&config.initial_state).map_err(invalid(first))?;
    options.solver.validate().map_err(invalid(first))?;

    info!(
        scenario = %config.name,
        periods = config.periods,
        start_year = config.start_year,
        "running scenario"
    );

    let mut state = config.initial_state.clone();
    let mut periods = Vec::with_capacity(config.periods as usize);
    let mut unconverged = Vec::new();

    for offset in 0..config.periods {
        let period = state.period;
        let year = config.start_year + offset as i32;
        let policy = config.policy.policy(period, year);

        let equilibrium =
            solve(&state, &policy, &config.params, &options.solver).map_err(invalid(period))?;
        if let Some(failure) = equilibrium.convergence_failure() {
            warn!(scenario = %config.name, year, %failure, "equilibrium did not converge");
            if options.abort_on_nonconvergence {
                return Err(RunError::Convergence {
                    scenario: config.name.clone(),
                    source: failure,
                });
            }
            unconverged.push(period);
        }

        let score = score(&state, &equilibrium, &config.params).map_err(invalid(period))?;
        let transition = advance(&state, &equilibrium, &policy, &config.params.dynamics)
            .map_err(invalid(period))?;
        for w in &transition.warnings {
            warn!(scenario = %config.name, year, warning = %w, "degenerate state replaced");
        }

        let home_import_share_from_rival =
            TierValues::from_fn(|t: Tier| rival_import_share(&equilibrium, t));
        periods.push(PeriodRecord {
            period,
            year,
            state,
            policy,
            equilibrium,
            investment: transition.investment,
            score,
            home_import_share_from_rival,
            warnings: transition.warnings,
        });
        state = transition.state;
    }

    let objectives: Vec<f64> = periods.iter().map(|p| p.score.objective).collect();
    let discounted_objective =
        discount(&objectives, options.discount_rate).map_err(invalid(first))?;
    info!(
        scenario = %config.name,
        discounted_objective,
        unconverged = unconverged.len(),
        "scenario finished"
    );

    Ok(ScenarioTimeSeries {
        scenario: config.name.clone(),
        start_year: config.start_year,
        discount_rate: options.discount_rate,
        periods,
        unconverged_periods: unconverged,
        discounted_objective,
        final_state: state,
    })
}

/// End-of-horizon summary of a finished run.
pub fn summarize(series: &ScenarioTimeSeries) -> ScenarioSummary {
    let (end_nsi, end_welfare) = series
        .periods
        .last()
        .map(|p| (p.score.security.index, p.score.welfare.total))
        .unwrap_or((0.0, 0.0));
    ScenarioSummary {
        scenario: series.scenario.clone(),
        discounted_objective: series.discounted_objective,
        end_nsi,
        end_welfare,
        unconverged_periods: series.unconverged_periods.len(),
    }
}

/// Run independent scenarios in parallel; results keep the input order.
pub fn run_all(
    configs: &[ScenarioConfig],
    options: &RunOptions,
) -> Vec<Result<ScenarioTimeSeries, RunError>> {
    configs
        .par_iter()
        .map(|config| run_scenario(config, options))
        .collect()
}
