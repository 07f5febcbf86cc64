//! Fixed per-scenario parameters: elasticities, market calibration, dynamics
//! coefficients and metric weights.

use serde::{Deserialize, Serialize};

use crate::error::{in_range, non_negative, positive, ParamResult, ParameterError};
use crate::grid::{Region, RegionTierGrid, Tier, TierValues};

/// Substitution and price elasticities per tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticityParams {
    /// Armington substitution elasticity between source regions (> 1).
    pub armington: TierValues<f64>,
    /// Demand price elasticity, as a positive magnitude (>= 0).
    pub demand: TierValues<f64>,
    /// Supply price elasticity (>= 0).
    pub supply: TierValues<f64>,
}

impl Default for ElasticityParams {
    fn default() -> Self {
        Self {
            armington: TierValues::new(3.0, 4.0, 6.0),
            demand: TierValues::new(0.6, 1.0, 1.3),
            supply: TierValues::new(0.8, 1.2, 1.5),
        }
    }
}

/// Validate elasticities. Armington elasticity must exceed one.
pub fn validate_elasticities(e: &ElasticityParams) -> ParamResult<()> {
    for (tier, &sigma) in e.armington.iter() {
        if !sigma.is_finite() || sigma <= 1.0 {
            return Err(ParameterError::ArmingtonElasticity { tier, value: sigma });
        }
    }
    for (tier, &v) in e.demand.iter() {
        non_negative(|| format!("demand_elasticity[{tier}]"), v)?;
    }
    for (tier, &v) in e.supply.iter() {
        non_negative(|| format!("supply_elasticity[{tier}]"), v)?;
    }
    Ok(())
}

/// Calibrated cost and price anchors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Marginal cost per unit before technology and subsidies (> 0).
    pub base_cost: RegionTierGrid<f64>,
    /// Price at which `PeriodState::demand_scale` is quoted (> 0).
    pub reference_price: TierValues<f64>,
}

pub fn validate_market(m: &MarketParams) -> ParamResult<()> {
    for (r, t, &v) in m.base_cost.cells() {
        positive(|| format!("base_cost[{r},{t}]"), v)?;
    }
    for (t, &v) in m.reference_price.iter() {
        positive(|| format!("reference_price[{t}]"), v)?;
    }
    Ok(())
}

/// Coefficients of the R&D → technology → capacity transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynamicsParams {
    /// Share of realized revenue reinvested in R&D, in [0, 1].
    pub rnd_intensity: RegionTierGrid<f64>,
    /// Per-period depreciation of the R&D stock, in [0, 1].
    pub rnd_decay: f64,
    /// R&D-to-technology coefficient φ (>= 0).
    pub tech_coefficient: RegionTierGrid<f64>,
    /// Capacity response to technology growth, scaled by the policy's
    /// tech-feedback strength (>= 0).
    pub capacity_feedback: f64,
    /// Additive floor in the R&D growth denominator (> 0).
    pub rnd_stock_floor: f64,
    /// Lower bound on the technology factor (> 0).
    pub technology_floor: f64,
    /// Lower bound on production capacity (> 0).
    pub capacity_floor: f64,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        let intensity = TierValues::new(0.15, 0.10, 0.05);
        Self {
            rnd_intensity: RegionTierGrid::splat(intensity),
            rnd_decay: 0.10,
            tech_coefficient: RegionTierGrid::splat(TierValues::new(0.08, 0.05, 0.03)),
            capacity_feedback: 0.5,
            rnd_stock_floor: 1.0,
            technology_floor: 1e-3,
            capacity_floor: 1e-6,
        }
    }
}

pub fn validate_dynamics(d: &DynamicsParams) -> ParamResult<()> {
    for (r, t, &v) in d.rnd_intensity.cells() {
        in_range(|| format!("rnd_intensity[{r},{t}]"), v, "[0, 1]", |x| {
            (0.0..=1.0).contains(&x)
        })?;
    }
    in_range(|| "rnd_decay".to_string(), d.rnd_decay, "[0, 1]", |x| {
        (0.0..=1.0).contains(&x)
    })?;
    for (r, t, &v) in d.tech_coefficient.cells() {
        non_negative(|| format!("tech_coefficient[{r},{t}]"), v)?;
    }
    non_negative(|| "capacity_feedback".to_string(), d.capacity_feedback)?;
    positive(|| "rnd_stock_floor".to_string(), d.rnd_stock_floor)?;
    positive(|| "technology_floor".to_string(), d.technology_floor)?;
    positive(|| "capacity_floor".to_string(), d.capacity_floor)?;
    Ok(())
}

/// Weights for the national-security index and the period objective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    /// Weight of Home's self-sufficiency per tier; High weighs most.
    pub tier_weights: TierValues<f64>,
    /// Penalty per unit of Home's High-tier consumption imported from Rival.
    pub rival_dependence_penalty: f64,
    /// Weight of ln(T_home,high / T_rival,high). Zero disables the term.
    pub tech_gap_weight: f64,
    /// Self-sufficiency ratios are capped here before weighting (> 0).
    pub self_sufficiency_cap: f64,
    /// Objective weight on welfare.
    pub welfare_weight: f64,
    /// Objective weight on the security index.
    pub security_weight: f64,
    /// Floor applied to demand elasticity in the consumer-surplus proxy (> 0).
    pub surplus_elasticity_floor: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            tier_weights: TierValues::new(0.5, 0.3, 0.2),
            rival_dependence_penalty: 0.5,
            tech_gap_weight: 0.2,
            self_sufficiency_cap: 1.0,
            welfare_weight: 1.0,
            security_weight: 1_000.0,
            surplus_elasticity_floor: 0.1,
        }
    }
}

pub fn validate_metric_weights(w: &MetricWeights) -> ParamResult<()> {
    for (t, &v) in w.tier_weights.iter() {
        non_negative(|| format!("tier_weights[{t}]"), v)?;
    }
    non_negative(
        || "rival_dependence_penalty".to_string(),
        w.rival_dependence_penalty,
    )?;
    non_negative(|| "tech_gap_weight".to_string(), w.tech_gap_weight)?;
    positive(|| "self_sufficiency_cap".to_string(), w.self_sufficiency_cap)?;
    crate::error::finite(|| "welfare_weight".to_string(), w.welfare_weight)?;
    crate::error::finite(|| "security_weight".to_string(), w.security_weight)?;
    positive(
        || "surplus_elasticity_floor".to_string(),
        w.surplus_elasticity_floor,
    )?;
    Ok(())
}

/// Everything fixed for the lifetime of a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub elasticities: ElasticityParams,
    pub market: MarketParams,
    pub dynamics: DynamicsParams,
    pub metrics: MetricWeights,
}

/// Validate all scenario parameters.
pub fn validate_params(p: &ScenarioParams) -> ParamResult<()> {
    validate_elasticities(&p.elasticities)?;
    validate_market(&p.market)?;
    validate_dynamics(&p.dynamics)?;
    validate_metric_weights(&p.metrics)?;
    Ok(())
}

impl ScenarioParams {
    /// Base marginal cost for one producer and tier.
    pub fn base_cost(&self, region: Region, tier: Tier) -> f64 {
        self.market.base_cost[region][tier]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_validate() {
        validate_elasticities(&ElasticityParams::default()).unwrap();
        validate_dynamics(&DynamicsParams::default()).unwrap();
        validate_metric_weights(&MetricWeights::default()).unwrap();
    }

    #[test]
    fn armington_of_one_is_rejected() {
        let mut e = ElasticityParams::default();
        e.armington.mid = 1.0;
        assert_eq!(
            validate_elasticities(&e),
            Err(ParameterError::ArmingtonElasticity {
                tier: Tier::Mid,
                value: 1.0
            })
        );
    }

    #[test]
    fn decay_above_one_is_rejected() {
        let d = DynamicsParams {
            rnd_decay: 1.5,
            ..DynamicsParams::default()
        };
        assert!(matches!(
            validate_dynamics(&d),
            Err(ParameterError::OutOfRange { .. })
        ));
    }

    proptest! {
        #[test]
        fn armington_above_one_accepted(sigma in 1.0001f64..50.0) {
            let mut e = ElasticityParams::default();
            e.armington = TierValues::splat(sigma);
            prop_assert!(validate_elasticities(&e).is_ok());
        }

        #[test]
        fn armington_at_or_below_one_rejected(sigma in -5.0f64..=1.0) {
            let mut e = ElasticityParams::default();
            e.armington.high = sigma;
            prop_assert!(validate_elasticities(&e).is_err());
        }
    }
}
