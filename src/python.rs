//! Python bindings, built with the `python` feature.

use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::{PyDataFrame, PySeries};

use crate::cumulative;
use crate::error::PhenoError;
use crate::io::{self, CsvLoadOptions};
use crate::resample::{self, DailyStat, ResampleConfig};
use crate::schema;
use crate::stages::{self, Crop, StageBound, StageTable};
use crate::threshold;
use crate::units::{self, DegreeUnit};

// ── Unit calculators ────────────────────────────────────────────────────────

#[pyfunction]
#[pyo3(signature = (temp, baseline, upper_bound=None))]
fn growing_degree_unit(temp: f64, baseline: f64, upper_bound: Option<f64>) -> f64 {
    units::growing_degree_unit(temp, baseline, upper_bound)
}

#[pyfunction]
#[pyo3(signature = (temp, upper_optimum, lower_optimum=None))]
fn stress_degree_unit(temp: f64, upper_optimum: f64, lower_optimum: Option<f64>) -> f64 {
    units::stress_degree_unit(temp, lower_optimum, upper_optimum)
}

#[pyfunction]
fn chilling_degree_unit(temp: f64, chilling_threshold: f64) -> f64 {
    units::chilling_degree_unit(temp, chilling_threshold)
}

#[pyfunction]
#[pyo3(signature = (data, temp_col, baseline, upper_bound=None, out_col=None))]
fn with_growing_degree_units(
    data: PyDataFrame,
    temp_col: &str,
    baseline: f64,
    upper_bound: Option<f64>,
    out_col: Option<&str>,
) -> PyResult<PyDataFrame> {
    let unit = DegreeUnit::growing(baseline, upper_bound);
    Ok(PyDataFrame(units::with_degree_units(&data.0, temp_col, &unit, out_col)?))
}

#[pyfunction]
#[pyo3(signature = (data, temp_col, upper_optimum, lower_optimum=None, out_col=None))]
fn with_stress_degree_units(
    data: PyDataFrame,
    temp_col: &str,
    upper_optimum: f64,
    lower_optimum: Option<f64>,
    out_col: Option<&str>,
) -> PyResult<PyDataFrame> {
    let unit = DegreeUnit::stress(lower_optimum, upper_optimum);
    Ok(PyDataFrame(units::with_degree_units(&data.0, temp_col, &unit, out_col)?))
}

#[pyfunction]
#[pyo3(signature = (data, temp_col, chilling_threshold, out_col=None))]
fn with_chilling_degree_units(
    data: PyDataFrame,
    temp_col: &str,
    chilling_threshold: f64,
    out_col: Option<&str>,
) -> PyResult<PyDataFrame> {
    let unit = DegreeUnit::chilling(chilling_threshold);
    Ok(PyDataFrame(units::with_degree_units(&data.0, temp_col, &unit, out_col)?))
}

// ── Accumulation and crossings ──────────────────────────────────────────────

#[pyfunction]
#[pyo3(signature = (data, unit_col, group_vars, cum_col=None))]
fn cumulative_degree_units(
    data: PyDataFrame,
    unit_col: &str,
    group_vars: Vec<String>,
    cum_col: Option<&str>,
) -> PyResult<PyDataFrame> {
    let df = cumulative::cumulative_degree_units(&data.0, unit_col, &group_vars, cum_col)?;
    Ok(PyDataFrame(df))
}

#[pyfunction]
#[pyo3(signature = (data, cumulative_col, threshold, date_col=schema::weather::TIME, group_vars=None))]
fn threshold_cross_date(
    data: PyDataFrame,
    cumulative_col: &str,
    threshold: f64,
    date_col: &str,
    group_vars: Option<Vec<String>>,
) -> PyResult<PyDataFrame> {
    let group_vars = group_vars.unwrap_or_else(|| {
        schema::weather::DEFAULT_GROUP_VARS
            .iter()
            .map(|c| c.to_string())
            .collect()
    });
    let df = threshold::threshold_cross_date(&data.0, cumulative_col, threshold, date_col, &group_vars)?;
    Ok(PyDataFrame(df))
}

// ── Resampling ──────────────────────────────────────────────────────────────

#[pyfunction]
fn mean_daily(
    data: PyDataFrame,
    location_id_column: &str,
    season_column: &str,
    time_column: &str,
    temp_column: &str,
) -> PyResult<PyDataFrame> {
    let df = resample::mean_daily(
        &data.0,
        location_id_column,
        season_column,
        time_column,
        temp_column,
    )?;
    Ok(PyDataFrame(df))
}

#[pyfunction]
#[pyo3(signature = (data, location_id_column, season_column, time_column, value_column, stats=None, day_col=schema::daily::DATE))]
fn resample_daily(
    data: PyDataFrame,
    location_id_column: &str,
    season_column: &str,
    time_column: &str,
    value_column: &str,
    stats: Option<Vec<String>>,
    day_col: &str,
) -> PyResult<PyDataFrame> {
    let mut config = ResampleConfig::new()
        .with_location_col(location_id_column)
        .with_season_col(season_column)
        .with_time_col(time_column)
        .with_value_col(value_column)
        .with_day_col(day_col);
    if let Some(names) = stats {
        let stats = names
            .iter()
            .map(|n| parse_stat(n))
            .collect::<Result<Vec<_>, _>>()?;
        config = config.with_stats(stats);
    }
    Ok(PyDataFrame(resample::resample_daily(&data.0, &config)?))
}

fn parse_stat(name: &str) -> Result<DailyStat, PhenoError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "mean" => Ok(DailyStat::Mean),
        "min" => Ok(DailyStat::Min),
        "max" => Ok(DailyStat::Max),
        "sum" => Ok(DailyStat::Sum),
        _ => Err(PhenoError::Validation(format!("Unknown daily statistic: '{name}'"))),
    }
}

// ── Growth stages ───────────────────────────────────────────────────────────

/// Custom `(label, upper)` pairs, or the crop default when `thresholds` is None.
/// The terminal label falls back to the crop default's.
fn stage_table(
    crop: Crop,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> Result<StageTable, PhenoError> {
    let default = crop.stage_table();
    match thresholds {
        None => Ok(default.clone()),
        Some(pairs) => {
            let bounds = pairs
                .into_iter()
                .map(|(label, upper)| StageBound::below(label, upper))
                .collect();
            StageTable::new(bounds, terminal.unwrap_or_else(|| default.terminal().to_string()))
        }
    }
}

fn classify(
    values: PySeries,
    crop: Crop,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> PyResult<PySeries> {
    let table = stage_table(crop, thresholds, terminal)?;
    Ok(PySeries(table.classify_series(&values.0)?))
}

#[pyfunction]
#[pyo3(signature = (values, crop, thresholds=None, terminal=None))]
fn growth_stage(
    values: PySeries,
    crop: &str,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> PyResult<PySeries> {
    let crop: Crop = crop.parse()?;
    classify(values, crop, thresholds, terminal)
}

#[pyfunction]
#[pyo3(signature = (values, thresholds=None, terminal=None))]
fn corn_growth_stage(
    values: PySeries,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> PyResult<PySeries> {
    classify(values, Crop::Corn, thresholds, terminal)
}

#[pyfunction]
#[pyo3(signature = (values, thresholds=None, terminal=None))]
fn soybean_growth_stage(
    values: PySeries,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> PyResult<PySeries> {
    classify(values, Crop::Soybean, thresholds, terminal)
}

#[pyfunction]
#[pyo3(signature = (values, thresholds=None, terminal=None))]
fn wheat_growth_stage(
    values: PySeries,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> PyResult<PySeries> {
    classify(values, Crop::Wheat, thresholds, terminal)
}

#[pyfunction]
#[pyo3(signature = (values, thresholds=None, terminal=None))]
fn canola_growth_stage(
    values: PySeries,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> PyResult<PySeries> {
    classify(values, Crop::Canola, thresholds, terminal)
}

#[pyfunction]
#[pyo3(signature = (values, thresholds=None, terminal=None))]
fn cotton_growth_stage(
    values: PySeries,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
) -> PyResult<PySeries> {
    classify(values, Crop::Cotton, thresholds, terminal)
}

#[pyfunction]
#[pyo3(signature = (data, cumulative_col, crop, thresholds=None, terminal=None, out_col=None))]
fn with_growth_stage(
    data: PyDataFrame,
    cumulative_col: &str,
    crop: &str,
    thresholds: Option<Vec<(String, f64)>>,
    terminal: Option<String>,
    out_col: Option<&str>,
) -> PyResult<PyDataFrame> {
    let crop: Crop = crop.parse()?;
    let table = stage_table(crop, thresholds, terminal)?;
    let df = stages::with_growth_stage(&data.0, cumulative_col, &table, out_col)?;
    Ok(PyDataFrame(df))
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Load a weather CSV; `time_col` is parsed with `time_format`, `numeric_cols`
/// (default: temperature) to Float64.
#[pyfunction]
#[pyo3(signature = (path, time_col=schema::weather::TIME, time_format=io::DEFAULT_TIME_FORMAT, numeric_cols=None))]
fn load_weather_csv(
    path: &str,
    time_col: &str,
    time_format: &str,
    numeric_cols: Option<Vec<String>>,
) -> PyResult<PyDataFrame> {
    let mut options = CsvLoadOptions::new()
        .with_time_col(time_col)
        .with_time_format(time_format);
    if let Some(cols) = numeric_cols {
        options = options.with_numeric_cols(cols);
    }
    Ok(PyDataFrame(io::load_weather_csv(path, &options)?))
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Weather
    let weather = PyModule::new(m.py(), "weather")?;
    weather.add("LOCATION", schema::weather::LOCATION)?;
    weather.add("YEAR", schema::weather::YEAR)?;
    weather.add("TIME", schema::weather::TIME)?;
    weather.add("TEMPERATURE", schema::weather::TEMPERATURE)?;
    m.add_submodule(&weather)?;

    // Daily
    let daily = PyModule::new(m.py(), "daily")?;
    daily.add("DATE", schema::daily::DATE)?;
    m.add_submodule(&daily)?;

    // Units
    let units = PyModule::new(m.py(), "units")?;
    units.add("GDU", schema::units::GDU)?;
    units.add("SDU", schema::units::SDU)?;
    units.add("CDU", schema::units::CDU)?;
    units.add("CUMULATIVE_PREFIX", schema::units::CUMULATIVE_PREFIX)?;
    m.add_submodule(&units)?;

    // Stage
    let stage = PyModule::new(m.py(), "stage")?;
    stage.add("GROWTH_STAGE", schema::stage::GROWTH_STAGE)?;
    m.add_submodule(&stage)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(growing_degree_unit, m)?)?;
    m.add_function(wrap_pyfunction!(stress_degree_unit, m)?)?;
    m.add_function(wrap_pyfunction!(chilling_degree_unit, m)?)?;
    m.add_function(wrap_pyfunction!(with_growing_degree_units, m)?)?;
    m.add_function(wrap_pyfunction!(with_stress_degree_units, m)?)?;
    m.add_function(wrap_pyfunction!(with_chilling_degree_units, m)?)?;
    m.add_function(wrap_pyfunction!(cumulative_degree_units, m)?)?;
    m.add_function(wrap_pyfunction!(threshold_cross_date, m)?)?;
    m.add_function(wrap_pyfunction!(mean_daily, m)?)?;
    m.add_function(wrap_pyfunction!(resample_daily, m)?)?;
    m.add_function(wrap_pyfunction!(growth_stage, m)?)?;
    m.add_function(wrap_pyfunction!(corn_growth_stage, m)?)?;
    m.add_function(wrap_pyfunction!(soybean_growth_stage, m)?)?;
    m.add_function(wrap_pyfunction!(wheat_growth_stage, m)?)?;
    m.add_function(wrap_pyfunction!(canola_growth_stage, m)?)?;
    m.add_function(wrap_pyfunction!(cotton_growth_stage, m)?)?;
    m.add_function(wrap_pyfunction!(with_growth_stage, m)?)?;
    m.add_function(wrap_pyfunction!(load_weather_csv, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
