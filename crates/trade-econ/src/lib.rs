#![deny(warnings)]

//! Static market-clearing for the three-region, three-tier chip market.
//!
//! This crate provides:
//! - Armington CES source shares and price indices
//! - Isoelastic demand and supply curves
//! - The per-period equilibrium solver with tariffs, subsidies and export controls

pub mod ces;
pub mod equilibrium;

pub use equilibrium::{solve, SolverConfig};
