//! Built-in calibration and the standard scenario set.

use rust_decimal::Decimal;
use std::sync::Arc;
use trade_core::{
    CalibrationRecord, DynamicsParams, ElasticityParams, MetricWeights, ParamResult, PeriodState,
    PriceBasis, RegionTierGrid, RegionValues, ScenarioParams, TierValues,
};

use crate::driver::ScenarioConfig;
use crate::policy_path::StockPolicy;

/// Default horizon for the stock scenarios.
pub const DEFAULT_PERIODS: u32 = 10;

/// Build a per-region, per-tier grid from tier rows of (home, rival, rest of world).
fn by_tier(high: [f64; 3], mid: [f64; 3], low: [f64; 3]) -> RegionTierGrid<f64> {
    let col = |i: usize| TierValues::new(high[i], mid[i], low[i]);
    RegionValues::new(col(0), col(1), col(2))
}

/// A plausible three-region calibration for demos, benches and tests.
///
/// Home leads the High tier on technology but is capacity-short there, Rival
/// is the low-cost Mid/Low producer, and the rest of the world carries the
/// bulk of High-tier capacity. Prices are in USD per chip.
pub fn reference_calibration() -> CalibrationRecord {
    CalibrationRecord {
        base_year: 2023,
        price_basis: PriceBasis::Observed,
        average_selling_price: TierValues::new(
            Decimal::new(100, 0),
            Decimal::new(10, 0),
            Decimal::new(1, 0),
        ),
        cost_index: by_tier([0.85, 1.0, 0.8], [0.9, 0.75, 0.8], [1.0, 0.7, 0.85]),
        tier_value_shares: TierValues::new(0.55, 0.30, 0.15),
        technology_factor: by_tier([1.3, 0.8, 1.2], [1.0, 0.95, 1.05], [1.0, 1.0, 1.0]),
        production_capacity: by_tier(
            [20.0, 15.0, 45.0],
            [60.0, 90.0, 100.0],
            [150.0, 350.0, 250.0],
        ),
        rnd_stock: by_tier(
            [1_500.0, 1_000.0, 3_000.0],
            [600.0, 700.0, 600.0],
            [100.0, 120.0, 100.0],
        ),
        demand_scale: by_tier([35.0, 25.0, 40.0], [90.0, 110.0, 80.0], [250.0, 300.0, 200.0]),
        elasticities: ElasticityParams::default(),
    }
}

/// Initial state and parameters derived from one calibration.
#[derive(Clone, Debug, PartialEq)]
pub struct Baseline {
    pub base_year: i32,
    pub state: PeriodState,
    pub params: ScenarioParams,
}

impl Baseline {
    /// Validate `record` and combine it with the given dynamics and metric settings.
    pub fn from_calibration(
        record: &CalibrationRecord,
        dynamics: DynamicsParams,
        metrics: MetricWeights,
    ) -> ParamResult<Self> {
        record.validate()?;
        Ok(Self {
            base_year: record.base_year,
            state: record.initial_state(),
            params: ScenarioParams {
                elasticities: record.elasticities.clone(),
                market: record.market_params()?,
                dynamics,
                metrics,
            },
        })
    }

    /// [`reference_calibration`] with default dynamics and weights.
    pub fn reference() -> ParamResult<Self> {
        Self::from_calibration(
            &reference_calibration(),
            DynamicsParams::default(),
            MetricWeights::default(),
        )
    }

    /// Scenario config for one stock policy starting at the base year.
    pub fn scenario(&self, policy: StockPolicy, periods: u32) -> ScenarioConfig {
        ScenarioConfig {
            name: policy.name().to_string(),
            start_year: self.base_year,
            periods,
            initial_state: self.state.clone(),
            params: self.params.clone(),
            policy: Arc::new(policy),
        }
    }

    /// Every stock scenario, in [`StockPolicy::ALL`] order.
    pub fn stock_scenarios(&self, periods: u32) -> Vec<ScenarioConfig> {
        StockPolicy::ALL
            .into_iter()
            .map(|p| self.scenario(p, periods))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trade_core::{Region, Tier};

    #[test]
    fn reference_calibration_validates() {
        assert!(reference_calibration().validate().is_ok());
    }

    #[test]
    fn baseline_carries_market_anchors() {
        let b = Baseline::reference().unwrap();
        assert_eq!(b.base_year, 2023);
        assert_eq!(b.state.period, 0);
        assert!((b.params.market.reference_price.high - 100.0).abs() < 1e-12);
        assert!((b.params.base_cost(Region::Rival, Tier::Low) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn stock_scenarios_are_named_in_order() {
        let b = Baseline::reference().unwrap();
        let names: Vec<_> = b.stock_scenarios(3).into_iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            ["baseline", "tariff_only", "tariff_plus_subsidy", "subsidy_only", "diff_by_tier"]
        );
    }

    #[test]
    fn invalid_calibration_is_rejected() {
        let mut record = reference_calibration();
        record.tier_value_shares.low = 0.5;
        let baseline = Baseline::from_calibration(
            &record,
            DynamicsParams::default(),
            MetricWeights::default(),
        );
        assert!(baseline.is_err());
    }
}
