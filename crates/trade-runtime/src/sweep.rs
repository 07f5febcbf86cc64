//! Sensitivity sweeps over scenario-level drivers.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trade_core::TierValues;

use crate::driver::{
    run_scenario, summarize, RunError, RunOptions, ScenarioConfig, ScenarioSummary,
};
use crate::policy_path::{OverriddenPath, PolicyOverrides};

/// One named set of overrides applied to every scenario in a sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCase {
    pub name: String,
    pub overrides: PolicyOverrides,
}

impl SensitivityCase {
    /// Run each scenario unchanged.
    pub fn unchanged() -> Self {
        Self {
            name: "central".into(),
            overrides: PolicyOverrides::default(),
        }
    }

    /// `config` with this case's overrides layered over its policy path.
    pub fn apply(&self, config: &ScenarioConfig) -> ScenarioConfig {
        let mut out = config.clone();
        if !self.overrides.is_empty() {
            let path = OverriddenPath::new(config.policy.clone(), self.overrides.clone());
            out.policy = Arc::new(path);
        }
        out
    }
}

/// Closed intervals sampled by [`sampled_cases`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepRanges {
    pub demand_growth: (f64, f64),
    pub tech_feedback: (f64, f64),
    pub home_high_rnd: (f64, f64),
    pub home_mid_rnd: (f64, f64),
}

impl Default for SweepRanges {
    fn default() -> Self {
        Self {
            demand_growth: (0.0, 0.04),
            tech_feedback: (0.5, 2.5),
            home_high_rnd: (0.6, 1.2),
            home_mid_rnd: (0.8, 1.1),
        }
    }
}

fn draw(rng: &mut ChaCha8Rng, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

/// Draw `n` cases reproducibly from `seed`.
///
/// Example:
/// let ranges = SweepRanges::default();
/// assert_eq!(sampled_cases(7, 4, &ranges), sampled_cases(7, 4, &ranges));
pub fn sampled_cases(seed: u64, n: usize, ranges: &SweepRanges) -> Vec<SensitivityCase> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let demand_growth = draw(&mut rng, ranges.demand_growth);
            let tech_feedback = draw(&mut rng, ranges.tech_feedback);
            let high = draw(&mut rng, ranges.home_high_rnd);
            let mid = draw(&mut rng, ranges.home_mid_rnd);
            SensitivityCase {
                name: format!("case_{i:03}"),
                overrides: PolicyOverrides {
                    demand_growth: Some(demand_growth),
                    tech_feedback: Some(tech_feedback),
                    home_rnd_multiplier: TierValues::new(Some(high), Some(mid), None),
                },
            }
        })
        .collect()
}

/// Summaries for every scenario under one case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub case: SensitivityCase,
    pub summaries: Vec<ScenarioSummary>,
}

/// Run every case against every scenario in parallel.
///
/// Output keeps case order, and scenario order within each case. The first
/// failing run fails the sweep.
pub fn run_sweep(
    configs: &[ScenarioConfig],
    cases: &[SensitivityCase],
    options: &RunOptions,
) -> Result<Vec<SweepOutcome>, RunError> {
    cases
        .par_iter()
        .map(|case| -> Result<SweepOutcome, RunError> {
            let summaries = configs
                .par_iter()
                .map(|config| run_scenario(&case.apply(config), options).map(|s| summarize(&s)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SweepOutcome {
                case: case.clone(),
                summaries,
            })
        })
        .collect()
}
