//! Constant-elasticity building blocks: Armington source shares, the CES
//! price index, and isoelastic demand and supply curves.
//!
//! All helpers assume validated inputs (positive prices, Armington
//! elasticity above one); the solver checks those once per call.

use trade_core::{Region, RegionValues};

/// Armington allocation shares of one importer's demand across sources.
///
/// share_i ∝ landed_i^(-sigma) over open sources, normalized to one. Closed
/// (embargoed) sources get exactly zero. When every open source has the same
/// landed price the split is uniform. Weights are computed relative to the
/// cheapest open source, so scaling every price by a constant leaves the
/// shares unchanged and huge prices cannot overflow.
///
/// Example:
/// let p = RegionValues::splat(2.0);
/// let s = armington_shares(&p, &RegionValues::splat(true), 4.0);
/// assert_eq!(s.home, 1.0 / 3.0);
pub fn armington_shares(
    landed: &RegionValues<f64>,
    open: &RegionValues<bool>,
    sigma: f64,
) -> RegionValues<f64> {
    let Some(cheapest) = cheapest_open(landed, open) else {
        return RegionValues::splat(0.0);
    };
    let open_count = Region::ALL.iter().filter(|&&r| open[r]).count();
    let uniform = Region::ALL
        .iter()
        .filter(|&&r| open[r])
        .all(|&r| landed[r] == cheapest);
    if uniform {
        let share = 1.0 / open_count as f64;
        return RegionValues::from_fn(|r| if open[r] { share } else { 0.0 });
    }
    let weights =
        RegionValues::from_fn(|r| if open[r] { (landed[r] / cheapest).powf(-sigma) } else { 0.0 });
    let total: f64 = weights.iter().map(|(_, w)| *w).sum();
    weights.map(|_, w| w / total)
}

/// CES price index over open sources, with equal taste weights of 1/3.
///
/// Equals the common price when all three sources are open and priced the
/// same; closing a source raises the index (lost variety).
///
/// Example:
/// let p = RegionValues::splat(5.0);
/// assert!((price_index(&p, &RegionValues::splat(true), 3.0) - 5.0).abs() < 1e-12);
pub fn price_index(landed: &RegionValues<f64>, open: &RegionValues<bool>, sigma: f64) -> f64 {
    let Some(cheapest) = cheapest_open(landed, open) else {
        return f64::INFINITY;
    };
    let weight = 1.0 / Region::ALL.len() as f64;
    let agg: f64 = Region::ALL
        .iter()
        .filter(|&&r| open[r])
        .map(|&r| weight * (landed[r] / cheapest).powf(1.0 - sigma))
        .sum();
    cheapest * agg.powf(1.0 / (1.0 - sigma))
}

/// Isoelastic demand: Q = scale × (price / reference)^(-elasticity).
///
/// `elasticity` is a non-negative magnitude; zero gives fixed demand.
///
/// Example:
/// assert_eq!(demand(100.0, 1.0, 1.0, 1.5), 100.0);
pub fn demand(scale: f64, price: f64, reference: f64, elasticity: f64) -> f64 {
    if elasticity == 0.0 {
        return scale;
    }
    scale * (price / reference).powf(-elasticity)
}

/// Isoelastic supply: Q = capacity × (price / marginal_cost)^elasticity.
pub fn supply(capacity: f64, price: f64, marginal_cost: f64, elasticity: f64) -> f64 {
    if elasticity == 0.0 {
        return capacity;
    }
    capacity * (price / marginal_cost).powf(elasticity)
}

fn cheapest_open(landed: &RegionValues<f64>, open: &RegionValues<bool>) -> Option<f64> {
    Region::ALL
        .iter()
        .filter(|&&r| open[r])
        .map(|&r| landed[r])
        .fold(None, |acc, p| match acc {
            Some(m) if m <= p => Some(m),
            _ => Some(p),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn identical_prices_split_uniformly() {
        let s = armington_shares(&RegionValues::splat(7.5), &RegionValues::splat(true), 5.0);
        assert_eq!(s, RegionValues::splat(1.0 / 3.0));
    }

    #[test]
    fn closed_source_gets_exactly_zero() {
        let landed = RegionValues::new(1.0, 1.0, 1.0);
        let open = RegionValues::new(true, false, true);
        let s = armington_shares(&landed, &open, 3.0);
        assert_eq!(s.rival, 0.0);
        assert_eq!(s.home, 0.5);
        assert_eq!(s.rest_of_world, 0.5);
    }

    #[test]
    fn cheaper_source_wins_share() {
        let landed = RegionValues::new(1.0, 2.0, 4.0);
        let s = armington_shares(&landed, &RegionValues::splat(true), 2.0);
        assert!(s.home > s.rival && s.rival > s.rest_of_world);
        assert_relative_eq!(s.home + s.rival + s.rest_of_world, 1.0, epsilon = 1e-12);
        // 1 : 1/4 : 1/16
        assert_relative_eq!(s.home / s.rival, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn closing_a_source_raises_price_index() {
        let landed = RegionValues::splat(1.0);
        let all = price_index(&landed, &RegionValues::splat(true), 4.0);
        let two = price_index(&landed, &RegionValues::new(true, false, true), 4.0);
        assert_relative_eq!(all, 1.0, epsilon = 1e-12);
        assert!(two > all);
    }

    #[test]
    fn demand_identity_at_reference_price() {
        assert_eq!(demand(1000.0, 3.0, 3.0, 2.0), 1000.0);
        assert_eq!(demand(1000.0, 9.0, 3.0, 0.0), 1000.0);
        assert!(demand(1000.0, 4.0, 3.0, 2.0) < 1000.0);
    }

    #[test]
    fn supply_at_marginal_cost_is_capacity() {
        assert_eq!(supply(40.0, 2.0, 2.0, 1.3), 40.0);
        assert!(supply(40.0, 3.0, 2.0, 1.3) > 40.0);
    }

    proptest! {
        #[test]
        fn shares_are_homogeneous_of_degree_zero(
            a in 0.01f64..100.0,
            b in 0.01f64..100.0,
            c in 0.01f64..100.0,
            k in 0.001f64..1000.0,
            sigma in 1.01f64..12.0,
        ) {
            let open = RegionValues::splat(true);
            let base = armington_shares(&RegionValues::new(a, b, c), &open, sigma);
            let scaled = armington_shares(&RegionValues::new(a * k, b * k, c * k), &open, sigma);
            for r in Region::ALL {
                prop_assert!((base[r] - scaled[r]).abs() <= 1e-9);
            }
        }

        #[test]
        fn shares_sum_to_one(
            a in 0.01f64..1e6,
            b in 0.01f64..1e6,
            c in 0.01f64..1e6,
            sigma in 1.01f64..20.0,
        ) {
            let prices = RegionValues::new(a, b, c);
            let s = armington_shares(&prices, &RegionValues::splat(true), sigma);
            let total = s.home + s.rival + s.rest_of_world;
            prop_assert!((total - 1.0).abs() <= 1e-12);
            prop_assert!(s.home >= 0.0 && s.rival >= 0.0 && s.rest_of_world >= 0.0);
        }

        #[test]
        fn demand_monotonic_in_price(p in 0.1f64..100.0, e in 0.01f64..5.0) {
            let lo = demand(1000.0, p, 1.0, e);
            let hi = demand(1000.0, p * 1.1, 1.0, e);
            prop_assert!(hi < lo);
        }
    }
}
