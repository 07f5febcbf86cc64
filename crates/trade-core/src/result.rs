use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Region, RegionTierGrid, RouteGrid, Tier, TierValues};

/// Fixed-point diagnostics for one tier's market.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierConvergence {
    pub converged: bool,
    pub iterations: u32,
    /// Largest |ln(allocated sales) - ln(supply)| over producers at the last iterate.
    pub residual: f64,
}

/// The solver stopped at its iteration cap without reaching tolerance.
///
/// Non-fatal: the result still carries the last iterate and the scenario
/// driver decides whether to continue.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[error("period {period} did not converge in tiers {tiers:?} (residual {residual:.3e})")]
pub struct ConvergenceFailure {
    pub period: u32,
    pub tiers: Vec<Tier>,
    pub residual: f64,
}

/// Market-clearing outcome of one period. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumResult {
    pub period: u32,
    /// Price received from buyers, before any subsidy.
    pub producer_price: RegionTierGrid<f64>,
    /// Buyer price per (exporter, importer, tier) including tariffs and controls.
    pub landed_price: RouteGrid<f64>,
    /// CES price index faced by each importer.
    pub price_index: RegionTierGrid<f64>,
    pub production: RegionTierGrid<f64>,
    pub consumption: RegionTierGrid<f64>,
    pub trade_quantity: RouteGrid<f64>,
    /// Share of the importer's demand sourced from the exporter.
    pub import_share: RouteGrid<f64>,
    /// Quantity valued at producer price.
    pub trade_value: RouteGrid<f64>,
    /// Producer revenue including subsidy receipts.
    pub revenue: RegionTierGrid<f64>,
    /// Fiscal cost of subsidies, by producer.
    pub subsidy_cost: RegionTierGrid<f64>,
    /// Tariff collections, by importer.
    pub tariff_revenue: RegionTierGrid<f64>,
    pub convergence: TierValues<TierConvergence>,
    pub converged: bool,
}

impl EquilibriumResult {
    /// Details of any non-converged tiers.
    pub fn convergence_failure(&self) -> Option<ConvergenceFailure> {
        if self.converged {
            return None;
        }
        let tiers: Vec<Tier> = self
            .convergence
            .iter()
            .filter(|(_, c)| !c.converged)
            .map(|(t, _)| t)
            .collect();
        let residual = self
            .convergence
            .iter()
            .map(|(_, c)| c.residual)
            .fold(0.0, f64::max);
        Some(ConvergenceFailure {
            period: self.period,
            tiers,
            residual,
        })
    }

    /// Cross-border imports into `importer` for one tier.
    pub fn imports(&self, importer: Region, tier: Tier) -> f64 {
        Region::ALL
            .into_iter()
            .filter(|&e| e != importer)
            .map(|e| self.trade_quantity[e][importer][tier])
            .sum()
    }

    /// Total shipments by `exporter` for one tier, domestic sales included.
    pub fn shipments(&self, exporter: Region, tier: Tier) -> f64 {
        Region::ALL
            .into_iter()
            .map(|i| self.trade_quantity[exporter][i][tier])
            .sum()
    }
}
