//! Baseline calibration handed over by the calibration collaborators.
//!
//! The engine treats a [`CalibrationRecord`] as opaque initial values. It never
//! re-derives prices from trade data; the [`PriceBasis`] only records where
//! the price baseline came from.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{in_range, non_negative, positive, ParamResult, ParameterError};
use crate::grid::{RegionTierGrid, TierValues};
use crate::params::{validate_elasticities, ElasticityParams, MarketParams};
use crate::state::{validate_state, PeriodState};

/// Origin of the calibrated price baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    /// Average selling prices estimated from value and quantity data.
    Observed,
    /// Duty/MFN rates used as a price proxy where direct prices were missing.
    TariffProxy,
}

/// Initial values for a scenario family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub base_year: i32,
    pub price_basis: PriceBasis,
    /// Average selling price per tier in USD; also the demand reference price.
    pub average_selling_price: TierValues<Decimal>,
    /// Producer cost relative to the tier ASP (> 0).
    pub cost_index: RegionTierGrid<f64>,
    /// Tier shares of baseline trade value; must sum to one.
    pub tier_value_shares: TierValues<f64>,
    pub technology_factor: RegionTierGrid<f64>,
    pub production_capacity: RegionTierGrid<f64>,
    pub rnd_stock: RegionTierGrid<f64>,
    pub demand_scale: RegionTierGrid<f64>,
    pub elasticities: ElasticityParams,
}

impl CalibrationRecord {
    /// Check every field; the first violation is returned.
    pub fn validate(&self) -> ParamResult<()> {
        self.asp_f64()?;
        for (r, t, &v) in self.cost_index.cells() {
            positive(|| format!("cost_index[{r},{t}]"), v)?;
        }
        let mut total = 0.0;
        for (t, &v) in self.tier_value_shares.iter() {
            non_negative(|| format!("tier_value_shares[{t}]"), v)?;
            total += v;
        }
        in_range(
            || "sum(tier_value_shares)".to_string(),
            total,
            "1 +/- 1e-6",
            |s| (s - 1.0).abs() <= 1e-6,
        )?;
        validate_state(&self.initial_state())?;
        validate_elasticities(&self.elasticities)?;
        Ok(())
    }

    /// Period-zero state.
    pub fn initial_state(&self) -> PeriodState {
        PeriodState {
            period: 0,
            technology_factor: self.technology_factor,
            production_capacity_base: self.production_capacity,
            rnd_stock: self.rnd_stock,
            demand_scale: self.demand_scale,
        }
    }

    /// Cost and price anchors: `base_cost = ASP × cost_index`.
    pub fn market_params(&self) -> ParamResult<MarketParams> {
        let asp = self.asp_f64()?;
        Ok(MarketParams {
            base_cost: RegionTierGrid::from_cells(|r, t| asp[t] * self.cost_index[r][t]),
            reference_price: asp,
        })
    }

    fn asp_f64(&self) -> ParamResult<TierValues<f64>> {
        let mut out = TierValues::splat(0.0);
        for (t, price) in self.average_selling_price.iter() {
            let field = || format!("average_selling_price[{t}]");
            if *price <= Decimal::ZERO {
                return Err(ParameterError::NonPositive {
                    field: field(),
                    value: price.to_f64().unwrap_or(0.0),
                });
            }
            let v = price.to_f64().ok_or_else(|| ParameterError::NonFinite {
                field: field(),
                value: f64::NAN,
            })?;
            out[t] = v;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Region, Tier};

    fn record() -> CalibrationRecord {
        CalibrationRecord {
            base_year: 2023,
            price_basis: PriceBasis::Observed,
            average_selling_price: TierValues::new(
                Decimal::new(10000, 2),
                Decimal::new(1000, 2),
                Decimal::new(100, 2),
            ),
            cost_index: RegionTierGrid::splat(TierValues::splat(0.8)),
            tier_value_shares: TierValues::new(0.5, 0.3, 0.2),
            technology_factor: RegionTierGrid::splat(TierValues::splat(1.0)),
            production_capacity: RegionTierGrid::splat(TierValues::splat(50.0)),
            rnd_stock: RegionTierGrid::splat(TierValues::splat(5.0)),
            demand_scale: RegionTierGrid::splat(TierValues::splat(50.0)),
            elasticities: ElasticityParams::default(),
        }
    }

    #[test]
    fn record_validates_and_builds_market() {
        let r = record();
        r.validate().unwrap();
        let m = r.market_params().unwrap();
        assert_eq!(m.reference_price.high, 100.0);
        assert!((m.base_cost[Region::Rival][Tier::Mid] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn shares_must_sum_to_one() {
        let mut r = record();
        r.tier_value_shares.low = 0.5;
        assert!(matches!(
            r.validate(),
            Err(ParameterError::OutOfRange { .. })
        ));
    }

    #[test]
    fn zero_asp_rejected() {
        let mut r = record();
        r.average_selling_price.mid = Decimal::ZERO;
        assert!(matches!(
            r.market_params(),
            Err(ParameterError::NonPositive { .. })
        ));
    }

    #[test]
    fn yaml_roundtrip() {
        let r = record();
        let s = serde_yaml::to_string(&r).unwrap();
        let back: CalibrationRecord = serde_yaml::from_str(&s).unwrap();
        assert_eq!(back, r);
    }
}
