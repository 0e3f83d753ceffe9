//! Agronomic time-series helpers over Polars tables.
//!
//! Hourly weather is resampled to daily values, turned into growing, stress
//! or chilling degree units, accumulated per location and season, and then
//! read as threshold-crossing dates or crop growth stages.

pub mod cumulative;
pub mod error;
mod frame;
pub mod io;
pub mod resample;
pub mod schema;
pub mod stages;
pub mod threshold;
pub mod units;

#[cfg(feature = "python")]
mod python;

pub use cumulative::cumulative_degree_units;
pub use error::PhenoError;
pub use io::{load_weather_csv, CsvLoadOptions};
pub use resample::{mean_daily, resample_daily, DailyStat, ResampleConfig};
pub use stages::{
    canola_growth_stage, corn_growth_stage, cotton_growth_stage, growth_stage,
    soybean_growth_stage, wheat_growth_stage, with_growth_stage, Crop, StageBound, StageTable,
};
pub use threshold::{threshold_cross, threshold_cross_date, ThresholdConfig};
pub use units::{
    chilling_degree_unit, degree_unit_series, growing_degree_unit, stress_degree_unit,
    with_degree_units, DegreeUnit,
};
