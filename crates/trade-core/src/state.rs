use serde::{Deserialize, Serialize};

use crate::error::{non_negative, positive, ParamResult};
use crate::grid::RegionTierGrid;

/// Evolving model state for one scenario.
///
/// The scenario driver owns the single authoritative value and threads it
/// through the period loop; the solver and metrics only ever see a shared
/// reference, and the state updater returns a fresh value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodState {
    /// Zero-based period index.
    pub period: u32,
    /// Multiplicative productivity shifter (> 0).
    pub technology_factor: RegionTierGrid<f64>,
    /// Supply scale: quantity offered when price equals marginal cost (> 0).
    pub production_capacity_base: RegionTierGrid<f64>,
    /// Cumulative R&D investment net of decay (>= 0).
    pub rnd_stock: RegionTierGrid<f64>,
    /// Quantity demanded at the tier reference price (> 0). Compounds the
    /// demand-growth driver period by period.
    pub demand_scale: RegionTierGrid<f64>,
}

/// Validate a state snapshot before it enters the solver.
pub fn validate_state(state: &PeriodState) -> ParamResult<()> {
    for (r, t, &v) in state.technology_factor.cells() {
        positive(|| format!("technology_factor[{r},{t}]"), v)?;
    }
    for (r, t, &v) in state.production_capacity_base.cells() {
        positive(|| format!("production_capacity_base[{r},{t}]"), v)?;
    }
    for (r, t, &v) in state.rnd_stock.cells() {
        non_negative(|| format!("rnd_stock[{r},{t}]"), v)?;
    }
    for (r, t, &v) in state.demand_scale.cells() {
        positive(|| format!("demand_scale[{r},{t}]"), v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParameterError;
    use crate::grid::{Region, Tier};

    fn state() -> PeriodState {
        PeriodState {
            period: 0,
            technology_factor: RegionTierGrid::splat(crate::TierValues::splat(1.0)),
            production_capacity_base: RegionTierGrid::splat(crate::TierValues::splat(10.0)),
            rnd_stock: RegionTierGrid::splat(crate::TierValues::splat(0.0)),
            demand_scale: RegionTierGrid::splat(crate::TierValues::splat(10.0)),
        }
    }

    #[test]
    fn zero_rnd_stock_is_valid() {
        validate_state(&state()).unwrap();
    }

    #[test]
    fn zero_technology_is_rejected() {
        let mut s = state();
        s.technology_factor[Region::Rival][Tier::High] = 0.0;
        let err = validate_state(&s).unwrap_err();
        assert_eq!(
            err,
            ParameterError::NonPositive {
                field: "technology_factor[rival,high]".into(),
                value: 0.0
            }
        );
    }

    #[test]
    fn nan_capacity_is_rejected() {
        let mut s = state();
        s.production_capacity_base[Region::Home][Tier::Low] = f64::NAN;
        assert!(matches!(
            validate_state(&s),
            Err(ParameterError::NonFinite { .. })
        ));
    }
}
