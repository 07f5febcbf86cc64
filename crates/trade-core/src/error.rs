use thiserror::Error;

use crate::grid::{Region, Tier};

/// Malformed or out-of-domain input parameters.
///
/// Fatal for the scenario or period that supplied them; callers propagate it
/// and never retry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParameterError {
    /// Numeric field must be finite.
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },
    /// Field must be strictly positive.
    #[error("{field} must be > 0, got {value}")]
    NonPositive { field: String, value: f64 },
    /// Field must be non-negative.
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: String, value: f64 },
    /// Armington elasticity must exceed one.
    #[error("armington elasticity for {tier} tier must be > 1, got {value}")]
    ArmingtonElasticity { tier: Tier, value: f64 },
    /// Field outside its documented range.
    #[error("{field} must be in {range}, got {value}")]
    OutOfRange {
        field: String,
        range: &'static str,
        value: f64,
    },
    /// Tariffs only apply across borders.
    #[error("domestic tariff for {region}/{tier} must be 0, got {value}")]
    DomesticTariff {
        region: Region,
        tier: Tier,
        value: f64,
    },
}

pub type ParamResult<T> = Result<T, ParameterError>;

pub(crate) fn finite(field: impl FnOnce() -> String, value: f64) -> ParamResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NonFinite {
            field: field(),
            value,
        })
    }
}

pub(crate) fn positive(field: impl Fn() -> String, value: f64) -> ParamResult<()> {
    finite(&field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::NonPositive {
            field: field(),
            value,
        })
    }
}

pub(crate) fn non_negative(field: impl Fn() -> String, value: f64) -> ParamResult<()> {
    finite(&field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::Negative {
            field: field(),
            value,
        })
    }
}

pub(crate) fn in_range(
    field: impl Fn() -> String,
    value: f64,
    range: &'static str,
    ok: impl FnOnce(f64) -> bool,
) -> ParamResult<()> {
    finite(&field, value)?;
    if ok(value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            field: field(),
            range,
            value,
        })
    }
}
