#![deny(warnings)]

//! Inter-period state transition: realized revenue funds R&D, the R&D stock
//! drives technology growth, and technology growth expands capacity.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trade_core::{
    validate_dynamics, DynamicsParams, EquilibriumResult, ParamResult, PeriodState,
    PolicyInputs, Region, RegionTierGrid, Tier, TierValues,
};

/// Which state variable was replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateQuantity {
    RndStock,
    TechnologyFactor,
    ProductionCapacity,
}

/// A computed state value was below its floor or not finite, and `applied`
/// was stored instead.
///
/// Non-fatal: the caller logs it and the run continues.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[error("{quantity:?} for {region}/{tier} replaced {computed} with {applied} in period {period}")]
pub struct DegenerateStateWarning {
    pub period: u32,
    pub region: Region,
    pub tier: Tier,
    pub quantity: DegenerateQuantity,
    pub computed: f64,
    pub applied: f64,
}

/// Replacement for a computed value that is NaN, below `floor`, or infinite.
///
/// Overflow keeps the previous value; everything else falls to the floor.
fn replacement(computed: f64, previous: f64, floor: f64) -> Option<f64> {
    if computed.is_finite() && computed >= floor {
        None
    } else if computed == f64::INFINITY {
        Some(previous.max(floor))
    } else {
        Some(floor)
    }
}

/// Outcome of [`advance`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// State for the next period.
    pub state: PeriodState,
    /// R&D spending this period.
    pub investment: RegionTierGrid<f64>,
    pub warnings: Vec<DegenerateStateWarning>,
}

/// Advance the state by one period.
///
/// Returns a new state; the input is untouched. Per region and tier:
/// investment = intensity × revenue × multiplier; the R&D stock decays and
/// absorbs the investment; technology grows by φ × Δstock / (stock + floor);
/// capacity grows with the technology ratio scaled by the policy's
/// tech-feedback strength. Technology only declines when the policy applies
/// an R&D penalty (multiplier below one).
pub fn advance(
    state: &PeriodState,
    result: &EquilibriumResult,
    policy: &PolicyInputs,
    params: &DynamicsParams,
) -> ParamResult<StateTransition> {
    validate_dynamics(params)?;
    trade_core::validate_policy(policy)?;

    let mut next = state.clone();
    next.period = state.period + 1;
    let mut investment = RegionTierGrid::splat(TierValues::splat(0.0));
    let mut warnings = Vec::new();

    for (region, tier, &revenue) in result.revenue.cells() {
        let mut settle = |quantity: DegenerateQuantity, computed: f64, previous: f64, floor: f64| {
            let Some(applied) = replacement(computed, previous, floor) else {
                return computed;
            };
            warnings.push(DegenerateStateWarning {
                period: state.period,
                region,
                tier,
                quantity,
                computed,
                applied,
            });
            applied
        };

        let multiplier = policy.rnd_multiplier[region][tier];
        let spend = params.rnd_intensity[region][tier] * revenue.max(0.0) * multiplier;
        investment[region][tier] = spend;

        let stock = state.rnd_stock[region][tier];
        let new_stock = settle(
            DegenerateQuantity::RndStock,
            (stock * (1.0 - params.rnd_decay) + spend).max(0.0),
            stock,
            0.0,
        );
        next.rnd_stock[region][tier] = new_stock;

        let mut growth = params.tech_coefficient[region][tier] * (new_stock - stock)
            / (stock + params.rnd_stock_floor);
        if growth < 0.0 && multiplier >= 1.0 {
            growth = 0.0;
        }
        let tech = state.technology_factor[region][tier];
        let new_tech = settle(
            DegenerateQuantity::TechnologyFactor,
            tech * (1.0 + growth),
            tech,
            params.technology_floor,
        );
        next.technology_factor[region][tier] = new_tech;

        let ratio = new_tech / tech;
        let capacity = state.production_capacity_base[region][tier];
        next.production_capacity_base[region][tier] = settle(
            DegenerateQuantity::ProductionCapacity,
            capacity * (1.0 + policy.tech_feedback * params.capacity_feedback * (ratio - 1.0)),
            capacity,
            params.capacity_floor,
        );

        next.demand_scale[region][tier] =
            state.demand_scale[region][tier] * (1.0 + policy.demand_growth);
    }

    Ok(StateTransition {
        state: next,
        investment,
        warnings,
    })
}
