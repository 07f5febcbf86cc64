use serde::{Deserialize, Serialize};

use crate::error::{in_range, non_negative, ParamResult, ParameterError};
use crate::grid::{Region, RegionTierGrid, RouteGrid, Tier, TierValues};

/// Exogenous policy values for one period, read-only to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyInputs {
    /// Ad valorem tariff per (exporter, importer, tier). Domestic entries must
    /// be zero; rates at or above the solver's embargo threshold close the route.
    pub tariff: RouteGrid<f64>,
    /// Ad valorem production subsidy per (producer, tier).
    pub subsidy: RegionTierGrid<f64>,
    /// Export-control intensity imposed by a region on its own shipments of a
    /// tier. Acts as an extra ad valorem wedge on every route out of that
    /// exporter; at or above the embargo threshold it closes all of them.
    /// Domestic sales are unaffected.
    pub export_control: RegionTierGrid<f64>,
    /// Scenario R&D multipliers per (region, tier); 1.0 is neutral, values
    /// below one are penalties.
    pub rnd_multiplier: RegionTierGrid<f64>,
    /// Demand growth applied this period (> -1).
    pub demand_growth: f64,
    /// Strength of capacity expansion induced by technology growth (>= 0).
    pub tech_feedback: f64,
}

impl PolicyInputs {
    /// No tariffs, subsidies or controls; neutral multipliers and no growth.
    pub fn free_trade() -> Self {
        Self {
            tariff: RouteGrid::splat(RegionTierGrid::splat(TierValues::splat(0.0))),
            subsidy: RegionTierGrid::splat(TierValues::splat(0.0)),
            export_control: RegionTierGrid::splat(TierValues::splat(0.0)),
            rnd_multiplier: RegionTierGrid::splat(TierValues::splat(1.0)),
            demand_growth: 0.0,
            tech_feedback: 1.0,
        }
    }

    /// Set the tariff on one route. Domestic routes are left to validation.
    pub fn with_tariff(
        mut self,
        exporter: Region,
        importer: Region,
        tier: Tier,
        rate: f64,
    ) -> Self {
        self.tariff[exporter][importer][tier] = rate;
        self
    }

    /// Set the same tariff on every cross-border route of every tier.
    pub fn with_uniform_tariff(mut self, rate: f64) -> Self {
        self.tariff = RouteGrid::from_routes(|e, i, _| if e == i { 0.0 } else { rate });
        self
    }

    pub fn with_subsidy(mut self, producer: Region, tier: Tier, rate: f64) -> Self {
        self.subsidy[producer][tier] = rate;
        self
    }

    pub fn with_export_control(mut self, exporter: Region, tier: Tier, intensity: f64) -> Self {
        self.export_control[exporter][tier] = intensity;
        self
    }

    pub fn with_rnd_multiplier(mut self, region: Region, tier: Tier, multiplier: f64) -> Self {
        self.rnd_multiplier[region][tier] = multiplier;
        self
    }

    pub fn with_demand_growth(mut self, growth: f64) -> Self {
        self.demand_growth = growth;
        self
    }

    pub fn with_tech_feedback(mut self, strength: f64) -> Self {
        self.tech_feedback = strength;
        self
    }
}

/// Validate a period's policy inputs.
pub fn validate_policy(policy: &PolicyInputs) -> ParamResult<()> {
    for (e, i, t, &rate) in policy.tariff.routes() {
        non_negative(|| format!("tariff[{e}->{i},{t}]"), rate)?;
        if e == i && rate != 0.0 {
            return Err(ParameterError::DomesticTariff {
                region: e,
                tier: t,
                value: rate,
            });
        }
    }
    for (r, t, &v) in policy.subsidy.cells() {
        non_negative(|| format!("subsidy[{r},{t}]"), v)?;
    }
    for (r, t, &v) in policy.export_control.cells() {
        non_negative(|| format!("export_control[{r},{t}]"), v)?;
    }
    for (r, t, &v) in policy.rnd_multiplier.cells() {
        non_negative(|| format!("rnd_multiplier[{r},{t}]"), v)?;
    }
    in_range(
        || "demand_growth".to_string(),
        policy.demand_growth,
        "(-1, inf)",
        |g| g > -1.0,
    )?;
    non_negative(|| "tech_feedback".to_string(), policy.tech_feedback)?;
    Ok(())
}
