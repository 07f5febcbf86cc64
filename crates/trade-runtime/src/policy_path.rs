//! Policy paths: pure functions from period to [`PolicyInputs`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use trade_core::{PolicyInputs, Region, Tier, TierValues};

/// Tariff used by the stock paths to proxy an outright embargo.
pub const EMBARGO_TARIFF: f64 = 10.0;

/// Supplies each period's exogenous policy values.
///
/// Implementations must be pure: the same `(period, year)` always yields the
/// same inputs, so reruns and parallel scenarios stay reproducible.
pub trait PolicyPath: Send + Sync {
    fn policy(&self, period: u32, year: i32) -> PolicyInputs;
}

impl<F> PolicyPath for F
where
    F: Fn(u32, i32) -> PolicyInputs + Send + Sync,
{
    fn policy(&self, period: u32, year: i32) -> PolicyInputs {
        self(period, year)
    }
}

/// Hand-tuned schedules for the standard scenario set. Home plays the
/// policy-setting economy and Rival the strategic competitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// No tariffs except an embargo on Home's High-tier exports to Rival.
    Baseline,
    /// 10% across the board; Home<->Rival escalates from 30% to an 80% cap.
    TariffOnly,
    /// Baseline plus targeted tariffs on Rival imports and ramping Home subsidies.
    TariffPlusSubsidy,
    /// Baseline tariffs with the Home subsidy ramp.
    SubsidyOnly,
    /// Free High-tier trade, ramping tariffs on Rival Mid/Low imports.
    DiffByTier,
}

impl StockPolicy {
    pub const ALL: [StockPolicy; 5] = [
        StockPolicy::Baseline,
        StockPolicy::TariffOnly,
        StockPolicy::TariffPlusSubsidy,
        StockPolicy::SubsidyOnly,
        StockPolicy::DiffByTier,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            StockPolicy::Baseline => "baseline",
            StockPolicy::TariffOnly => "tariff_only",
            StockPolicy::TariffPlusSubsidy => "tariff_plus_subsidy",
            StockPolicy::SubsidyOnly => "subsidy_only",
            StockPolicy::DiffByTier => "diff_by_tier",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    fn demand_growth(self) -> f64 {
        match self {
            StockPolicy::Baseline | StockPolicy::SubsidyOnly => 0.02,
            StockPolicy::TariffOnly => 0.0,
            StockPolicy::TariffPlusSubsidy => 0.025,
            StockPolicy::DiffByTier => 0.012,
        }
    }

    fn tech_feedback(self) -> f64 {
        match self {
            StockPolicy::Baseline | StockPolicy::SubsidyOnly => 1.0,
            StockPolicy::TariffOnly => 2.0,
            StockPolicy::TariffPlusSubsidy => 1.5,
            StockPolicy::DiffByTier => 1.3,
        }
    }

    /// Home R&D multipliers for High and Mid tiers.
    fn home_rnd(self) -> (f64, f64) {
        match self {
            StockPolicy::TariffOnly => (0.7, 0.85),
            StockPolicy::TariffPlusSubsidy => (1.10, 1.05),
            _ => (1.0, 1.0),
        }
    }
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn baseline_tariffs() -> PolicyInputs {
    PolicyInputs::free_trade().with_tariff(Region::Home, Region::Rival, Tier::High, EMBARGO_TARIFF)
}

fn home_subsidies(policy: PolicyInputs, year: i32) -> PolicyInputs {
    let (high, mid) = if year >= 2027 {
        (0.15, 0.08)
    } else if year >= 2025 {
        (0.12, 0.07)
    } else {
        (0.10, 0.06)
    };
    policy
        .with_subsidy(Region::Home, Tier::High, high)
        .with_subsidy(Region::Home, Tier::Mid, mid)
}

impl PolicyPath for StockPolicy {
    fn policy(&self, _period: u32, year: i32) -> PolicyInputs {
        let base = match self {
            StockPolicy::Baseline => baseline_tariffs(),
            StockPolicy::TariffOnly => {
                let mut extra: f64 = 0.20;
                if year >= 2025 {
                    extra = (extra + 0.10 * f64::from(year - 2024)).min(0.70);
                }
                let mut p = PolicyInputs::free_trade().with_uniform_tariff(0.10);
                for tier in Tier::ALL {
                    p = p
                        .with_tariff(Region::Rival, Region::Home, tier, 0.10 + extra)
                        .with_tariff(Region::Home, Region::Rival, tier, 0.10 + extra);
                }
                p
            }
            StockPolicy::TariffPlusSubsidy => {
                let p = baseline_tariffs()
                    .with_tariff(Region::Rival, Region::Home, Tier::High, 0.05)
                    .with_tariff(Region::Rival, Region::Home, Tier::Mid, 0.15)
                    .with_tariff(Region::Rival, Region::Home, Tier::Low, 0.20);
                home_subsidies(p, year)
            }
            StockPolicy::SubsidyOnly => home_subsidies(baseline_tariffs(), year),
            StockPolicy::DiffByTier => {
                let ramp = match year {
                    y if y >= 2029 => 0.40,
                    y if y >= 2027 => 0.30,
                    y if y >= 2025 => 0.20,
                    _ => 0.10,
                };
                PolicyInputs::free_trade()
                    .with_tariff(Region::Rival, Region::Home, Tier::Mid, ramp)
                    .with_tariff(Region::Rival, Region::Home, Tier::Low, ramp)
            }
        };
        let (rnd_high, rnd_mid) = self.home_rnd();
        base.with_demand_growth(self.demand_growth())
            .with_tech_feedback(self.tech_feedback())
            .with_rnd_multiplier(Region::Home, Tier::High, rnd_high)
            .with_rnd_multiplier(Region::Home, Tier::Mid, rnd_mid)
    }
}

/// Per-case adjustments layered over a scenario's own path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    pub demand_growth: Option<f64>,
    pub tech_feedback: Option<f64>,
    /// Replacement Home R&D multipliers; `None` keeps the scenario's value.
    pub home_rnd_multiplier: TierValues<Option<f64>>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        self.demand_growth.is_none()
            && self.tech_feedback.is_none()
            && self.home_rnd_multiplier.iter().all(|(_, v)| v.is_none())
    }

    pub fn apply(&self, mut policy: PolicyInputs) -> PolicyInputs {
        if let Some(g) = self.demand_growth {
            policy.demand_growth = g;
        }
        if let Some(f) = self.tech_feedback {
            policy.tech_feedback = f;
        }
        for (tier, m) in self.home_rnd_multiplier.iter() {
            if let Some(m) = m {
                policy.rnd_multiplier[Region::Home][tier] = *m;
            }
        }
        policy
    }
}

/// A path with [`PolicyOverrides`] applied on top.
pub struct OverriddenPath {
    inner: Arc<dyn PolicyPath>,
    overrides: PolicyOverrides,
}

impl OverriddenPath {
    pub fn new(inner: Arc<dyn PolicyPath>, overrides: PolicyOverrides) -> Self {
        Self { inner, overrides }
    }
}

impl PolicyPath for OverriddenPath {
    fn policy(&self, period: u32, year: i32) -> PolicyInputs {
        self.overrides.apply(self.inner.policy(period, year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trade_core::validate_policy;

    #[test]
    fn every_stock_path_is_valid_over_a_decade() {
        for p in StockPolicy::ALL {
            for (period, year) in (2023..2035).enumerate() {
                let inputs = p.policy(period as u32, year);
                assert!(validate_policy(&inputs).is_ok(), "{p} in {year}");
            }
        }
    }

    #[test]
    fn names_roundtrip() {
        for p in StockPolicy::ALL {
            assert_eq!(StockPolicy::from_name(p.name()), Some(p));
        }
        assert_eq!(StockPolicy::from_name("nope"), None);
    }

    #[test]
    fn baseline_embargoes_home_high_exports_to_rival() {
        let p = StockPolicy::Baseline.policy(0, 2024);
        assert_eq!(p.tariff[Region::Home][Region::Rival][Tier::High], EMBARGO_TARIFF);
        assert_eq!(p.tariff[Region::Home][Region::Rival][Tier::Mid], 0.0);
    }

    #[test]
    fn tariff_only_escalates_to_cap() {
        let tariff = |year| StockPolicy::TariffOnly.policy(0, year).tariff;
        let rate = |year| tariff(year)[Region::Rival][Region::Home][Tier::Low];
        assert!((rate(2024) - 0.30).abs() < 1e-12);
        assert!((rate(2026) - 0.50).abs() < 1e-12);
        assert!((rate(2040) - 0.80).abs() < 1e-12);
        let other = tariff(2030)[Region::RestOfWorld][Region::Home][Tier::Low];
        assert!((other - 0.10).abs() < 1e-12);
    }

    #[test]
    fn subsidies_ramp_with_year() {
        let s = |year| StockPolicy::SubsidyOnly.policy(0, year).subsidy[Region::Home][Tier::High];
        assert!(s(2024) < s(2025) && s(2025) < s(2027));
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let o = PolicyOverrides {
            demand_growth: Some(0.05),
            home_rnd_multiplier: TierValues::new(Some(0.5), None, None),
            ..PolicyOverrides::default()
        };
        assert!(!o.is_empty());
        let path = OverriddenPath::new(Arc::new(StockPolicy::TariffOnly), o);
        let p = path.policy(0, 2026);
        assert_eq!(p.demand_growth, 0.05);
        assert_eq!(p.tech_feedback, 2.0);
        assert_eq!(p.rnd_multiplier[Region::Home][Tier::High], 0.5);
        assert_eq!(p.rnd_multiplier[Region::Home][Tier::Mid], 0.85);
    }

    #[test]
    fn closures_are_policy_paths() {
        let path = |period: u32, _year: i32| {
            PolicyInputs::free_trade().with_demand_growth(f64::from(period) * 0.01)
        };
        assert_eq!(path.policy(3, 2026).demand_growth, 0.03);
    }
}
