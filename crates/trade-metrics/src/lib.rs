#![deny(warnings)]

//! Scenario scoring: national-security index, welfare proxy, the period
//! objective and exponential discounting.
//!
//! Welfare here is an approximation, not a surplus integral over the true
//! demand system. Consumer surplus is the triangle under a linear demand
//! curve with the observed point elasticity, producer surplus is the area
//! above the isoelastic supply curve, and fiscal flows are added at face
//! value. Use it to rank scenarios, not as a level forecast.

use serde::{Deserialize, Serialize};
use trade_core::{
    validate_metric_weights, ElasticityParams, EquilibriumResult, MetricWeights, ParamResult,
    ParameterError, PeriodState, Region, RegionValues, ScenarioParams, Tier, TierValues,
};

/// Components of the national-security index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecurityBreakdown {
    /// Home production over Home consumption per tier, capped.
    pub self_sufficiency: TierValues<f64>,
    /// Share of Home High-tier consumption imported from Rival.
    pub rival_dependence: f64,
    /// ln(T_home,high / T_rival,high).
    pub tech_gap: f64,
    pub index: f64,
}

/// Welfare proxy components by region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WelfareBreakdown {
    pub consumer_surplus: RegionValues<f64>,
    pub producer_surplus: RegionValues<f64>,
    pub subsidy_cost: RegionValues<f64>,
    pub tariff_revenue: RegionValues<f64>,
    /// Sum over regions of CS + PS - subsidy cost + tariff revenue.
    pub total: f64,
}

impl WelfareBreakdown {
    /// Welfare accruing to one region.
    pub fn region_total(&self, region: Region) -> f64 {
        self.consumer_surplus[region] + self.producer_surplus[region] - self.subsidy_cost[region]
            + self.tariff_revenue[region]
    }
}

/// Everything the metrics engine reports for one period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodScore {
    pub security: SecurityBreakdown,
    pub welfare: WelfareBreakdown,
    pub objective: f64,
}

/// Score one solved period.
pub fn score(
    state: &PeriodState,
    result: &EquilibriumResult,
    params: &ScenarioParams,
) -> ParamResult<PeriodScore> {
    validate_metric_weights(&params.metrics)?;
    let security = national_security_index(state, result, &params.metrics);
    let welfare = welfare(result, &params.elasticities, &params.metrics);
    let objective = objective(security.index, welfare.total, &params.metrics);
    Ok(PeriodScore {
        security,
        welfare,
        objective,
    })
}

/// Weighted Home self-sufficiency, less the High-tier dependence on Rival,
/// plus the High-tier technology gap term.
pub fn national_security_index(
    state: &PeriodState,
    result: &EquilibriumResult,
    weights: &MetricWeights,
) -> SecurityBreakdown {
    let self_sufficiency = TierValues::from_fn(|t| {
        let consumed = result.consumption[Region::Home][t];
        if consumed > 0.0 {
            (result.production[Region::Home][t] / consumed).min(weights.self_sufficiency_cap)
        } else {
            weights.self_sufficiency_cap
        }
    });
    let rival_dependence = rival_import_share(result, Tier::High);
    let tech_gap = (state.technology_factor[Region::Home][Tier::High]
        / state.technology_factor[Region::Rival][Tier::High])
        .ln();
    let weighted: f64 = self_sufficiency
        .iter()
        .map(|(t, s)| weights.tier_weights[t] * s)
        .sum();
    let index = weighted - weights.rival_dependence_penalty * rival_dependence
        + weights.tech_gap_weight * tech_gap;
    SecurityBreakdown {
        self_sufficiency,
        rival_dependence,
        tech_gap,
        index,
    }
}

/// Share of Home consumption in `tier` sourced from Rival.
pub fn rival_import_share(result: &EquilibriumResult, tier: Tier) -> f64 {
    let consumed = result.consumption[Region::Home][tier];
    if consumed > 0.0 {
        result.trade_quantity[Region::Rival][Region::Home][tier] / consumed
    } else {
        0.0
    }
}

/// Approximate welfare; see the crate docs for what the proxy covers.
pub fn welfare(
    result: &EquilibriumResult,
    elasticities: &ElasticityParams,
    weights: &MetricWeights,
) -> WelfareBreakdown {
    let consumer_surplus: RegionValues<f64> = RegionValues::from_fn(|r| {
        Tier::ALL
            .iter()
            .map(|&t| {
                let eps = elasticities.demand[t].max(weights.surplus_elasticity_floor);
                0.5 * result.price_index[r][t] * result.consumption[r][t] / eps
            })
            .sum()
    });
    let producer_surplus: RegionValues<f64> = RegionValues::from_fn(|r| {
        Tier::ALL
            .iter()
            .map(|&t| result.revenue[r][t] / (1.0 + elasticities.supply[t]))
            .sum()
    });
    let subsidy_cost: RegionValues<f64> =
        RegionValues::from_fn(|r| result.subsidy_cost[r].iter().map(|(_, v)| v).sum());
    let tariff_revenue: RegionValues<f64> =
        RegionValues::from_fn(|r| result.tariff_revenue[r].iter().map(|(_, v)| v).sum());
    let mut out = WelfareBreakdown {
        consumer_surplus,
        producer_surplus,
        subsidy_cost,
        tariff_revenue,
        total: 0.0,
    };
    out.total = Region::ALL.iter().map(|&r| out.region_total(r)).sum();
    out
}

/// Single-period policy trade-off between welfare and security.
pub fn objective(nsi: f64, welfare: f64, weights: &MetricWeights) -> f64 {
    weights.welfare_weight * welfare + weights.security_weight * nsi
}

/// Present value of a per-period objective series: Σ obj_t / (1 + rate)^t.
///
/// `rate` must be in [0, 1) and every value finite.
///
/// Example:
/// assert_eq!(discount(&[1.0, 1.0], 0.0).unwrap(), 2.0);
pub fn discount(series: &[f64], rate: f64) -> ParamResult<f64> {
    if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
        return Err(ParameterError::OutOfRange {
            field: "discount_rate".into(),
            range: "[0, 1)",
            value: rate,
        });
    }
    let beta = 1.0 / (1.0 + rate);
    let mut factor = 1.0;
    let mut total = 0.0;
    for (t, &value) in series.iter().enumerate() {
        if !value.is_finite() {
            return Err(ParameterError::NonFinite {
                field: format!("objective[{t}]"),
                value,
            });
        }
        total += factor * value;
        factor *= beta;
    }
    Ok(total)
}
