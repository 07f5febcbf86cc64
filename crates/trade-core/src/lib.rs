#![deny(warnings)]

//! Core domain model for the semiconductor trade-policy engine.
//!
//! This crate defines the serializable records exchanged between the solver,
//! the state updater, the metrics engine and the scenario driver, together
//! with validation helpers that guard their invariants.

pub mod calibration;
pub mod error;
pub mod grid;
pub mod params;
pub mod policy;
pub mod result;
pub mod state;

pub use calibration::{CalibrationRecord, PriceBasis};
pub use error::{ParamResult, ParameterError};
pub use grid::{Region, RegionTierGrid, RegionValues, RouteGrid, Tier, TierValues};
pub use params::{
    validate_dynamics, validate_elasticities, validate_market, validate_metric_weights,
    validate_params, DynamicsParams, ElasticityParams, MarketParams, MetricWeights,
    ScenarioParams,
};
pub use policy::{validate_policy, PolicyInputs};
pub use result::{ConvergenceFailure, EquilibriumResult, TierConvergence};
pub use state::{validate_state, PeriodState};
