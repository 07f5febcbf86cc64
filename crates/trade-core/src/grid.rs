//! Fixed Region and Tier enumerations and the dense grids keyed by them.
//!
//! Every per-region or per-tier quantity in the engine lives in one of these
//! grids instead of a string-keyed map, so lookups are exhaustive and
//! iteration order is always the declaration order of the enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Trading regions. The set is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// The policy-setting region.
    Home,
    /// The designated strategic rival.
    Rival,
    /// Everyone else, aggregated.
    RestOfWorld,
}

impl Region {
    /// All regions in canonical order.
    pub const ALL: [Region; 3] = [Region::Home, Region::Rival, Region::RestOfWorld];

    /// Position of the region in [`Region::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase label used in logs and error messages.
    pub const fn label(self) -> &'static str {
        match self {
            Region::Home => "home",
            Region::Rival => "rival",
            Region::RestOfWorld => "rest_of_world",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Product tiers within the semiconductor space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Leading-edge logic and high-bandwidth memory.
    High,
    /// Mainstream logic and commodity memory.
    Mid,
    /// Legacy and discrete parts.
    Low,
}

impl Tier {
    /// All tiers in canonical order.
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Mid, Tier::Low];

    /// Position of the tier in [`Tier::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase label used in logs and error messages.
    pub const fn label(self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Mid => "mid",
            Tier::Low => "low",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per [`Tier`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TierValues<T> {
    pub high: T,
    pub mid: T,
    pub low: T,
}

impl<T> TierValues<T> {
    pub const fn new(high: T, mid: T, low: T) -> Self {
        Self { high, mid, low }
    }

    /// Build by evaluating `f` once per tier, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Tier) -> T) -> Self {
        Self {
            high: f(Tier::High),
            mid: f(Tier::Mid),
            low: f(Tier::Low),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Tier, &T) -> U) -> TierValues<U> {
        TierValues::from_fn(|tier| f(tier, &self[tier]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &T)> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, &self[tier]))
    }
}

impl<T: Clone> TierValues<T> {
    /// Same value for every tier.
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T> Index<Tier> for TierValues<T> {
    type Output = T;

    fn index(&self, tier: Tier) -> &T {
        match tier {
            Tier::High => &self.high,
            Tier::Mid => &self.mid,
            Tier::Low => &self.low,
        }
    }
}

impl<T> IndexMut<Tier> for TierValues<T> {
    fn index_mut(&mut self, tier: Tier) -> &mut T {
        match tier {
            Tier::High => &mut self.high,
            Tier::Mid => &mut self.mid,
            Tier::Low => &mut self.low,
        }
    }
}

/// One value per [`Region`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionValues<T> {
    pub home: T,
    pub rival: T,
    pub rest_of_world: T,
}

impl<T> RegionValues<T> {
    pub const fn new(home: T, rival: T, rest_of_world: T) -> Self {
        Self {
            home,
            rival,
            rest_of_world,
        }
    }

    /// Build by evaluating `f` once per region, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Region) -> T) -> Self {
        Self {
            home: f(Region::Home),
            rival: f(Region::Rival),
            rest_of_world: f(Region::RestOfWorld),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Region, &T) -> U) -> RegionValues<U> {
        RegionValues::from_fn(|region| f(region, &self[region]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, &T)> + '_ {
        Region::ALL.into_iter().map(move |region| (region, &self[region]))
    }
}

impl<T: Clone> RegionValues<T> {
    /// Same value for every region.
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T> Index<Region> for RegionValues<T> {
    type Output = T;

    fn index(&self, region: Region) -> &T {
        match region {
            Region::Home => &self.home,
            Region::Rival => &self.rival,
            Region::RestOfWorld => &self.rest_of_world,
        }
    }
}

impl<T> IndexMut<Region> for RegionValues<T> {
    fn index_mut(&mut self, region: Region) -> &mut T {
        match region {
            Region::Home => &mut self.home,
            Region::Rival => &mut self.rival,
            Region::RestOfWorld => &mut self.rest_of_world,
        }
    }
}

/// Region × Tier grid, indexed as `grid[region][tier]`.
pub type RegionTierGrid<T> = RegionValues<TierValues<T>>;

/// Exporter × importer × tier grid, indexed as `grid[exporter][importer][tier]`.
pub type RouteGrid<T> = RegionValues<RegionValues<TierValues<T>>>;

impl<T> RegionValues<TierValues<T>> {
    /// Build a grid by evaluating `f` for every (region, tier) cell.
    pub fn from_cells(mut f: impl FnMut(Region, Tier) -> T) -> Self {
        RegionValues::from_fn(|region| TierValues::from_fn(|tier| f(region, tier)))
    }

    /// All cells in canonical (region-major) order.
    pub fn cells(&self) -> impl Iterator<Item = (Region, Tier, &T)> + '_ {
        Region::ALL.into_iter().flat_map(move |region| {
            Tier::ALL
                .into_iter()
                .map(move |tier| (region, tier, &self[region][tier]))
        })
    }
}

impl<T> RegionValues<RegionValues<TierValues<T>>> {
    /// Build a route grid by evaluating `f` for every (exporter, importer, tier).
    pub fn from_routes(mut f: impl FnMut(Region, Region, Tier) -> T) -> Self {
        RegionValues::from_fn(|exporter| {
            RegionValues::from_fn(|importer| {
                TierValues::from_fn(|tier| f(exporter, importer, tier))
            })
        })
    }

    /// All routes in canonical (exporter, importer, tier) order.
    pub fn routes(&self) -> impl Iterator<Item = (Region, Region, Tier, &T)> + '_ {
        Region::ALL.into_iter().flat_map(move |exporter| {
            Region::ALL.into_iter().flat_map(move |importer| {
                Tier::ALL
                    .into_iter()
                    .map(move |tier| (exporter, importer, tier, &self[exporter][importer][tier]))
            })
        })
    }
}
