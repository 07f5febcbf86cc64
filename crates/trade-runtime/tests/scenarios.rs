use approx::assert_relative_eq;
use proptest::prelude::*;
use std::sync::Arc;
use trade_core::{DynamicsParams, PolicyInputs, Region, RegionTierGrid, Tier, TierValues};
use trade_econ::SolverConfig;
use trade_runtime::{
    run_all, run_scenario, summarize, Baseline, RunError, RunOptions, ScenarioConfig, StockPolicy,
};

fn reference() -> Baseline {
    Baseline::reference().unwrap()
}

#[test]
fn embargo_closes_route_and_home_high_technology_grows() {
    let config = reference().scenario(StockPolicy::Baseline, 1);
    let series = run_scenario(&config, &RunOptions::default()).unwrap();
    let record = &series.periods[0];
    let eq = &record.equilibrium;
    assert!(eq.converged);
    assert_eq!(eq.import_share[Region::Home][Region::Rival][Tier::High], 0.0);
    assert_eq!(eq.trade_quantity[Region::Home][Region::Rival][Tier::High], 0.0);
    assert!(record.investment[Region::Home][Tier::High] > 0.0);
    assert!(
        series.final_state.technology_factor[Region::Home][Tier::High]
            > config.initial_state.technology_factor[Region::Home][Tier::High]
    );
}

#[test]
fn reruns_are_identical() {
    let configs = reference().stock_scenarios(4);
    let options = RunOptions::default();
    let first = run_all(&configs, &options);
    let second = run_all(&configs, &options);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.as_ref().unwrap(), b.as_ref().unwrap());
    }
}

#[test]
fn parallel_batch_matches_sequential_runs_in_order() {
    let configs = reference().stock_scenarios(3);
    let options = RunOptions::default();
    let batch = run_all(&configs, &options);
    assert_eq!(batch.len(), configs.len());
    for (config, result) in configs.iter().zip(batch) {
        let alone = run_scenario(config, &options).unwrap();
        assert_eq!(result.unwrap(), alone);
    }
}

#[test]
fn stock_scenarios_converge_over_the_default_horizon() {
    let configs = reference().stock_scenarios(trade_runtime::DEFAULT_PERIODS);
    for result in run_all(&configs, &RunOptions::default()) {
        let series = result.unwrap();
        assert!(series.unconverged_periods.is_empty(), "{}", series.scenario);
        let summary = summarize(&series);
        assert!(summary.discounted_objective.is_finite());
        assert!(summary.end_nsi.is_finite());
    }
}

#[test]
fn zero_discount_rate_sums_objectives() {
    let config = reference().scenario(StockPolicy::DiffByTier, 3);
    let options = RunOptions {
        discount_rate: 0.0,
        ..RunOptions::default()
    };
    let series = run_scenario(&config, &options).unwrap();
    let total: f64 = series.objectives().iter().sum();
    assert_relative_eq!(series.discounted_objective, total, max_relative = 1e-12);
}

#[test]
fn iteration_cap_is_recorded_not_fatal() {
    let config = reference().scenario(StockPolicy::TariffOnly, 2);
    let options = RunOptions {
        solver: SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        },
        ..RunOptions::default()
    };
    let series = run_scenario(&config, &options).unwrap();
    assert_eq!(series.unconverged_periods, vec![0, 1]);
    assert_eq!(summarize(&series).unconverged_periods, 2);
}

#[test]
fn iteration_cap_aborts_when_requested() {
    let config = reference().scenario(StockPolicy::TariffOnly, 2);
    let options = RunOptions {
        solver: SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        },
        abort_on_nonconvergence: true,
        ..RunOptions::default()
    };
    match run_scenario(&config, &options) {
        Err(RunError::Convergence { scenario, source }) => {
            assert_eq!(scenario, "tariff_only");
            assert_eq!(source.period, 0);
        }
        other => panic!("expected convergence error, got {other:?}"),
    }
}

#[test]
fn collapsing_rival_is_clamped_to_floor() {
    let mut config = reference().scenario(StockPolicy::Baseline, 3);
    config.params.dynamics = DynamicsParams {
        rnd_decay: 1.0,
        tech_coefficient: RegionTierGrid::splat(TierValues::splat(5.0)),
        ..DynamicsParams::default()
    };
    config.policy = Arc::new(|_period: u32, _year: i32| {
        let mut p = PolicyInputs::free_trade();
        for tier in Tier::ALL {
            p = p.with_rnd_multiplier(Region::Rival, tier, 0.0);
        }
        p
    });
    let floor = config.params.dynamics.technology_floor;
    let series = run_scenario(&config, &RunOptions::default()).unwrap();
    assert!(!series.periods[0].warnings.is_empty());
    for record in &series.periods {
        assert!(record.state.technology_factor.cells().all(|(_, _, &t)| t >= floor));
    }
    assert_eq!(series.final_state.technology_factor.rival.high, floor);
}

#[test]
fn market_without_clearing_price_runs_to_completion() {
    let mut config = reference().scenario(StockPolicy::Baseline, 2);
    config.params.elasticities.demand = TierValues::splat(0.0);
    config.params.elasticities.supply = TierValues::splat(0.0);
    let options = RunOptions {
        solver: SolverConfig {
            max_iterations: 30_000,
            ..SolverConfig::default()
        },
        ..RunOptions::default()
    };
    let series = run_scenario(&config, &options).unwrap();
    assert_eq!(series.unconverged_periods, vec![0, 1]);
    for record in &series.periods {
        let eq = &record.equilibrium;
        assert!(!eq.convergence.high.converged);
        assert!(eq.producer_price.cells().all(|(_, _, p)| p.is_finite()));
        assert!(eq.revenue.cells().all(|(_, _, v)| v.is_finite()));
    }
    let end = &series.final_state;
    assert!(end.technology_factor.cells().all(|(_, _, v)| v.is_finite()));
    assert!(end.production_capacity_base.cells().all(|(_, _, v)| v.is_finite()));
    assert!(summarize(&series).discounted_objective.is_finite());
}

#[test]
fn invalid_params_fail_the_scenario() {
    let mut config = reference().scenario(StockPolicy::Baseline, 2);
    config.params.elasticities.armington.mid = 0.9;
    let err = run_scenario(&config, &RunOptions::default()).unwrap_err();
    assert!(matches!(err, RunError::InvalidParameter { period: 0, .. }));
}

#[test]
fn series_serializes_with_scenario_first() {
    let config = reference().scenario(StockPolicy::SubsidyOnly, 2);
    let series = run_scenario(&config, &RunOptions::default()).unwrap();
    let json = serde_json::to_string(&series).unwrap();
    assert!(json.starts_with("{\"scenario\":\"subsidy_only\""));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["periods"].as_array().map(Vec::len), Some(2));
}

fn tariff_path(rate: f64) -> impl Fn(u32, i32) -> PolicyInputs + Send + Sync {
    move |_period, _year| {
        PolicyInputs::free_trade().with_tariff(Region::Rival, Region::Home, Tier::Mid, rate)
    }
}

fn with_path(base: &ScenarioConfig, rate: f64) -> ScenarioConfig {
    let mut config = base.clone();
    config.policy = Arc::new(tariff_path(rate));
    config
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn higher_tariff_never_raises_rival_share(low in 0.0f64..0.5, bump in 0.0f64..0.5) {
        let base = reference().scenario(StockPolicy::Baseline, 1);
        let options = RunOptions::default();
        let a = run_scenario(&with_path(&base, low), &options).unwrap();
        let b = run_scenario(&with_path(&base, low + bump), &options).unwrap();
        let share =
            |s: &trade_runtime::ScenarioTimeSeries| s.periods[0].home_import_share_from_rival.mid;
        prop_assert!(share(&b) <= share(&a) + 1e-9);
    }
}
