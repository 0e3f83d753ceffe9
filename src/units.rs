//! Daily thermal unit calculators.
//!
//! Scalar functions compute one unit value from one temperature. The
//! column-level helpers apply a [`DegreeUnit`] to a numeric column and
//! append the result, leaving the input table untouched.

use polars::prelude::*;

use crate::error::PhenoError;
use crate::frame::{ensure_numeric, require_numeric};
use crate::schema::units;

/// Growing degree unit: `max(min(temp, upper_bound) - baseline, 0)`.
///
/// Without an upper bound the effective temperature is not capped.
/// NaN temperatures yield NaN.
pub fn growing_degree_unit(temp: f64, baseline: f64, upper_bound: Option<f64>) -> f64 {
    if temp.is_nan() {
        return f64::NAN;
    }
    let effective = match upper_bound {
        Some(cap) => temp.min(cap),
        None => temp,
    };
    (effective - baseline).max(0.0)
}

/// Stress degree unit: distance outside the optimal range.
///
/// Below `lower_optimum` contributes `lower_optimum - temp`, above
/// `upper_optimum` contributes `temp - upper_optimum`. Without a lower
/// optimum, cold stress is disabled.
pub fn stress_degree_unit(temp: f64, lower_optimum: Option<f64>, upper_optimum: f64) -> f64 {
    if temp.is_nan() {
        return f64::NAN;
    }
    match lower_optimum {
        Some(lower) if temp < lower => lower - temp,
        _ if temp > upper_optimum => temp - upper_optimum,
        _ => 0.0,
    }
}

/// Chilling degree unit: `threshold - temp` below the threshold, else 0.
pub fn chilling_degree_unit(temp: f64, threshold: f64) -> f64 {
    if temp.is_nan() {
        return f64::NAN;
    }
    if temp < threshold {
        threshold - temp
    } else {
        0.0
    }
}

/// Parameterised unit calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DegreeUnit {
    Growing {
        baseline: f64,
        upper_bound: Option<f64>,
    },
    Stress {
        lower_optimum: Option<f64>,
        upper_optimum: f64,
    },
    Chilling {
        threshold: f64,
    },
}

impl DegreeUnit {
    pub fn growing(baseline: f64, upper_bound: Option<f64>) -> Self {
        Self::Growing {
            baseline,
            upper_bound,
        }
    }

    pub fn stress(lower_optimum: Option<f64>, upper_optimum: f64) -> Self {
        Self::Stress {
            lower_optimum,
            upper_optimum,
        }
    }

    pub fn chilling(threshold: f64) -> Self {
        Self::Chilling { threshold }
    }

    pub fn compute(&self, temp: f64) -> f64 {
        match *self {
            Self::Growing {
                baseline,
                upper_bound,
            } => growing_degree_unit(temp, baseline, upper_bound),
            Self::Stress {
                lower_optimum,
                upper_optimum,
            } => stress_degree_unit(temp, lower_optimum, upper_optimum),
            Self::Chilling { threshold } => chilling_degree_unit(temp, threshold),
        }
    }

    /// Column name used when the caller does not pick one.
    pub fn default_column(&self) -> &'static str {
        match self {
            Self::Growing { .. } => units::GDU,
            Self::Stress { .. } => units::SDU,
            Self::Chilling { .. } => units::CDU,
        }
    }
}

/// Apply `unit` element-wise to a numeric series. Nulls stay null.
pub fn degree_unit_series(temps: &Series, unit: &DegreeUnit) -> Result<Series, PhenoError> {
    ensure_numeric(temps.name().as_str(), temps.dtype())?;
    let temps = temps.cast(&DataType::Float64)?;
    let out: Float64Chunked = temps
        .f64()?
        .into_iter()
        .map(|t| t.map(|t| unit.compute(t)))
        .collect();
    Ok(out
        .with_name(unit.default_column().into())
        .into_series())
}

/// Append a unit column computed from `temp_col`.
///
/// The output column is `out_col`, or the unit's default name (`gdu`,
/// `sdu`, `cdu`) when omitted. An existing column of that name is replaced.
#[tracing::instrument(skip_all, fields(temp_col = %temp_col, rows = data.height()))]
pub fn with_degree_units(
    data: &DataFrame,
    temp_col: &str,
    unit: &DegreeUnit,
    out_col: Option<&str>,
) -> Result<DataFrame, PhenoError> {
    require_numeric(data, temp_col)?;
    let temps = data.column(temp_col)?.as_materialized_series();
    let name = out_col.unwrap_or_else(|| unit.default_column());
    let values = degree_unit_series(temps, unit)?.with_name(name.into());

    let mut out = data.clone();
    out.with_column(values)?;
    tracing::debug!(column = name, "appended degree units");
    Ok(out)
}
