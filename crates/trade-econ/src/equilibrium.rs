//! Single-period partial-equilibrium solver.
//!
//! Each tier clears independently. Producer prices are the unknowns: given
//! prices we compute landed prices, Armington allocations, CES demand and
//! isoelastic supply, then move every producer's log price toward closing its
//! gap between allocated sales and supply. Each step combines a common
//! price-level move, driven by total sales against total supply, with relative
//! moves per producer. The update is damped, clipped, kept within a band
//! around marginal cost, and stops at a fixed iteration cap.

use serde::{Deserialize, Serialize};
use tracing::debug;
use trade_core::{
    validate_elasticities, validate_market, validate_policy, validate_state, EquilibriumResult,
    ParamResult, ParameterError, PeriodState, PolicyInputs, Region, RegionTierGrid, RegionValues,
    RouteGrid, ScenarioParams, Tier, TierConvergence, TierValues,
};

use crate::ces::{armington_shares, demand, price_index, supply};

/// Prices stay within this band around effective marginal cost, so a tier
/// with no clearing price still yields finite flows.
const PRICE_FLOOR_RATIO: f64 = 1e-9;
const PRICE_CEILING_RATIO: f64 = 1e9;

/// Configuration for the equilibrium iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_iterations: u32,
    /// Convergence threshold on max |ln(sales) - ln(supply)|.
    pub tolerance: f64,
    /// Fraction of the Newton-like log-price step taken each iteration, in (0, 1].
    pub damping: f64,
    /// Largest absolute log-price move per iteration.
    pub max_log_step: f64,
    /// Tariff or export-control intensity at or above which a route is closed.
    pub embargo_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2_000,
            tolerance: 1e-10,
            damping: 0.7,
            max_log_step: 0.5,
            embargo_threshold: 1.0,
        }
    }
}

impl SolverConfig {
    /// Validates iteration limits and tolerances.
    pub fn validate(&self) -> ParamResult<()> {
        if self.max_iterations == 0 {
            return Err(ParameterError::NonPositive {
                field: "max_iterations".into(),
                value: 0.0,
            });
        }
        let checks = [
            ("tolerance", self.tolerance),
            ("max_log_step", self.max_log_step),
            ("embargo_threshold", self.embargo_threshold),
        ];
        for (field, value) in checks {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite {
                    field: field.into(),
                    value,
                });
            }
            if value <= 0.0 {
                return Err(ParameterError::NonPositive {
                    field: field.into(),
                    value,
                });
            }
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ParameterError::OutOfRange {
                field: "damping".into(),
                range: "(0, 1]",
                value: self.damping,
            });
        }
        Ok(())
    }
}

/// Solve one period's market-clearing equilibrium.
///
/// Pure and deterministic. Inputs are validated eagerly and any violation is
/// returned as a [`ParameterError`]. Failure to converge is not an error: the
/// result carries the last iterate with `converged == false`.
pub fn solve(
    state: &PeriodState,
    policy: &PolicyInputs,
    params: &ScenarioParams,
    config: &SolverConfig,
) -> ParamResult<EquilibriumResult> {
    config.validate()?;
    validate_state(state)?;
    validate_policy(policy)?;
    validate_elasticities(&params.elasticities)?;
    validate_market(&params.market)?;

    let zeros = RegionTierGrid::splat(TierValues::splat(0.0));
    let route_zeros = RouteGrid::splat(zeros);
    let mut out = EquilibriumResult {
        period: state.period,
        producer_price: zeros,
        landed_price: route_zeros,
        price_index: zeros,
        production: zeros,
        consumption: zeros,
        trade_quantity: route_zeros,
        import_share: route_zeros,
        trade_value: route_zeros,
        revenue: zeros,
        subsidy_cost: zeros,
        tariff_revenue: zeros,
        convergence: TierValues::splat(TierConvergence {
            converged: false,
            iterations: 0,
            residual: f64::INFINITY,
        }),
        converged: false,
    };

    for tier in Tier::ALL {
        let market = TierMarket::new(state, policy, params, config, tier);
        let cleared = market.clear(config);
        debug!(
            period = state.period,
            tier = %tier,
            iterations = cleared.convergence.iterations,
            residual = cleared.convergence.residual,
            converged = cleared.convergence.converged,
            "tier market solved"
        );
        market.write(&cleared, policy, tier, &mut out);
    }
    out.converged = out.convergence.iter().all(|(_, c)| c.converged);
    Ok(out)
}

/// One tier's market, with every policy wedge precomputed.
struct TierMarket {
    sigma: f64,
    demand_elasticity: f64,
    supply_elasticity: f64,
    reference_price: f64,
    /// Effective marginal cost after technology and subsidy.
    marginal_cost: RegionValues<f64>,
    capacity: RegionValues<f64>,
    /// Demand at the reference price, this period's growth applied.
    demand_scale: RegionValues<f64>,
    /// Landed-price multiplier per (exporter, importer).
    wedge: RegionValues<RegionValues<f64>>,
    /// Whether the (exporter, importer) route is below the embargo threshold.
    open: RegionValues<RegionValues<bool>>,
}

/// Per-iteration evaluation of a price vector.
struct Flows {
    prices: RegionValues<f64>,
    shares: RegionValues<RegionValues<f64>>,
    quantities: RegionValues<RegionValues<f64>>,
    landed: RegionValues<RegionValues<f64>>,
    index: RegionValues<f64>,
    demand: RegionValues<f64>,
    sales: RegionValues<f64>,
    supply: RegionValues<f64>,
}

struct Cleared {
    flows: Flows,
    convergence: TierConvergence,
}

impl TierMarket {
    fn new(
        state: &PeriodState,
        policy: &PolicyInputs,
        params: &ScenarioParams,
        config: &SolverConfig,
        tier: Tier,
    ) -> Self {
        let growth = 1.0 + policy.demand_growth;
        let wedge = RegionValues::from_fn(|e| {
            RegionValues::from_fn(|i| {
                if e == i {
                    1.0
                } else {
                    (1.0 + policy.tariff[e][i][tier]) * (1.0 + policy.export_control[e][tier])
                }
            })
        });
        let open = RegionValues::from_fn(|e| {
            RegionValues::from_fn(|i| {
                e == i
                    || (policy.tariff[e][i][tier] < config.embargo_threshold
                        && policy.export_control[e][tier] < config.embargo_threshold)
            })
        });
        Self {
            sigma: params.elasticities.armington[tier],
            demand_elasticity: params.elasticities.demand[tier],
            supply_elasticity: params.elasticities.supply[tier],
            reference_price: params.market.reference_price[tier],
            marginal_cost: RegionValues::from_fn(|r| {
                params.base_cost(r, tier)
                    / state.technology_factor[r][tier]
                    / (1.0 + policy.subsidy[r][tier])
            }),
            capacity: RegionValues::from_fn(|r| state.production_capacity_base[r][tier]),
            demand_scale: RegionValues::from_fn(|r| state.demand_scale[r][tier] * growth),
            wedge,
            open,
        }
    }

    fn evaluate(&self, prices: RegionValues<f64>) -> Flows {
        let landed = RegionValues::from_fn(|e| {
            RegionValues::from_fn(|i| prices[e] * self.wedge[e][i])
        });
        let mut shares = RegionValues::splat(RegionValues::splat(0.0));
        let mut quantities = RegionValues::splat(RegionValues::splat(0.0));
        let mut index = RegionValues::splat(0.0);
        let mut demanded = RegionValues::splat(0.0);
        for importer in Region::ALL {
            let into = RegionValues::from_fn(|e| landed[e][importer]);
            let open = RegionValues::from_fn(|e| self.open[e][importer]);
            let s = armington_shares(&into, &open, self.sigma);
            let p = price_index(&into, &open, self.sigma);
            let d = demand(
                self.demand_scale[importer],
                p,
                self.reference_price,
                self.demand_elasticity,
            );
            for exporter in Region::ALL {
                shares[exporter][importer] = s[exporter];
                quantities[exporter][importer] = s[exporter] * d;
            }
            index[importer] = p;
            demanded[importer] = d;
        }
        let sales: RegionValues<f64> =
            RegionValues::from_fn(|e| Region::ALL.iter().map(|&i| quantities[e][i]).sum());
        let supplied = RegionValues::from_fn(|e| {
            supply(
                self.capacity[e],
                prices[e],
                self.marginal_cost[e],
                self.supply_elasticity,
            )
        });
        Flows {
            prices,
            shares,
            quantities,
            landed,
            index,
            demand: demanded,
            sales,
            supply: supplied,
        }
    }

    fn clear(&self, config: &SolverConfig) -> Cleared {
        // Relative prices respond to the Armington elasticity; the common price
        // level only to demand and supply elasticities.
        let relative_scale =
            config.damping / (self.sigma.max(self.demand_elasticity) + self.supply_elasticity);
        let level_response = self.demand_elasticity + self.supply_elasticity;
        let level_scale = if level_response > 0.0 {
            config.damping / level_response
        } else {
            relative_scale
        };
        let mut prices = self.marginal_cost;
        let mut iterations = 0u32;
        loop {
            let flows = self.evaluate(prices);
            let gaps = RegionValues::from_fn(|e| {
                flows.sales[e].max(f64::MIN_POSITIVE).ln()
                    - flows.supply[e].max(f64::MIN_POSITIVE).ln()
            });
            let residual = gaps.iter().map(|(_, g)| g.abs()).fold(0.0, f64::max);
            let converged = residual < config.tolerance;
            if converged || iterations >= config.max_iterations {
                return Cleared {
                    flows,
                    convergence: TierConvergence {
                        converged,
                        iterations,
                        residual,
                    },
                };
            }
            // Aggregate excess demand reacts to prices only through ε and η.
            let total = |q: &RegionValues<f64>| q.iter().map(|(_, v)| *v).sum::<f64>();
            let level_gap = total(&flows.sales).max(f64::MIN_POSITIVE).ln()
                - total(&flows.supply).max(f64::MIN_POSITIVE).ln();
            prices = RegionValues::from_fn(|e| {
                let step = relative_scale * (gaps[e] - level_gap) + level_scale * level_gap;
                let step = step.clamp(-config.max_log_step, config.max_log_step);
                let mc = self.marginal_cost[e];
                (prices[e] * step.exp()).clamp(mc * PRICE_FLOOR_RATIO, mc * PRICE_CEILING_RATIO)
            });
            iterations += 1;
        }
    }

    fn write(
        &self,
        cleared: &Cleared,
        policy: &PolicyInputs,
        tier: Tier,
        out: &mut EquilibriumResult,
    ) {
        let f = &cleared.flows;
        for e in Region::ALL {
            let price = f.prices[e];
            let produced = f.supply[e];
            let subsidy = policy.subsidy[e][tier];
            out.producer_price[e][tier] = price;
            out.production[e][tier] = produced;
            out.revenue[e][tier] = price * (1.0 + subsidy) * produced;
            out.subsidy_cost[e][tier] = subsidy * price * produced;
            for i in Region::ALL {
                let q = f.quantities[e][i];
                out.landed_price[e][i][tier] = f.landed[e][i];
                out.trade_quantity[e][i][tier] = q;
                out.import_share[e][i][tier] = f.shares[e][i];
                out.trade_value[e][i][tier] = price * q;
            }
        }
        for i in Region::ALL {
            out.price_index[i][tier] = f.index[i];
            out.consumption[i][tier] = f.demand[i];
            out.tariff_revenue[i][tier] = Region::ALL
                .iter()
                .filter(|&&e| e != i)
                .map(|&e| policy.tariff[e][i][tier] * f.prices[e] * f.quantities[e][i])
                .sum();
        }
        out.convergence[tier] = cleared.convergence;
    }
}
