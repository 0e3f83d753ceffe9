//! Sub-daily observations reduced to calendar days.

use polars::prelude::*;

use crate::error::PhenoError;
use crate::frame::{require_columns, require_numeric, require_temporal};
use crate::schema::{daily, weather};

/// Per-day reduction of the value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyStat {
    Mean,
    Min,
    Max,
    Sum,
}

impl DailyStat {
    /// Output name: the mean keeps `value_col`, others get a suffix.
    pub fn output_name(&self, value_col: &str) -> String {
        match self {
            DailyStat::Mean => value_col.to_string(),
            DailyStat::Min => format!("{value_col}_min"),
            DailyStat::Max => format!("{value_col}_max"),
            DailyStat::Sum => format!("{value_col}_sum"),
        }
    }

    fn expr(&self, value_col: &str) -> Expr {
        let value = col(value_col);
        let reduced = match self {
            DailyStat::Mean => value.mean(),
            DailyStat::Min => value.min(),
            DailyStat::Max => value.max(),
            DailyStat::Sum => value.sum(),
        };
        reduced.alias(self.output_name(value_col))
    }
}

/// Columns and statistics for [`resample_daily`].
#[derive(Debug, Clone)]
pub struct ResampleConfig {
    location_col: String,
    season_col: String,
    time_col: String,
    value_col: String,
    day_col: String,
    stats: Vec<DailyStat>,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ResampleConfig {
    /// Defaults: `location`, `year`, `time`, `temperature`, output day
    /// column `date`, mean only.
    pub fn new() -> Self {
        Self {
            location_col: weather::LOCATION.to_string(),
            season_col: weather::YEAR.to_string(),
            time_col: weather::TIME.to_string(),
            value_col: weather::TEMPERATURE.to_string(),
            day_col: daily::DATE.to_string(),
            stats: vec![DailyStat::Mean],
        }
    }

    pub fn with_location_col(mut self, name: impl Into<String>) -> Self {
        self.location_col = name.into();
        self
    }

    pub fn with_season_col(mut self, name: impl Into<String>) -> Self {
        self.season_col = name.into();
        self
    }

    pub fn with_time_col(mut self, name: impl Into<String>) -> Self {
        self.time_col = name.into();
        self
    }

    pub fn with_value_col(mut self, name: impl Into<String>) -> Self {
        self.value_col = name.into();
        self
    }

    pub fn with_day_col(mut self, name: impl Into<String>) -> Self {
        self.day_col = name.into();
        self
    }

    pub fn with_stats(mut self, stats: impl IntoIterator<Item = DailyStat>) -> Self {
        self.stats = stats.into_iter().collect();
        self
    }

    pub fn stats(&self) -> &[DailyStat] {
        &self.stats
    }

    pub fn day_col(&self) -> &str {
        &self.day_col
    }
}

/// Reduce observations to one row per (location, season, calendar day).
///
/// The day is the calendar date of each timestamp in its own time zone.
/// Rows with a null timestamp are dropped. Days without observations
/// produce no row. Groups and days keep the
/// order in which they first appear.
#[tracing::instrument(skip_all, fields(value_col = %config.value_col, rows = data.height()))]
pub fn resample_daily(data: &DataFrame, config: &ResampleConfig) -> Result<DataFrame, PhenoError> {
    require_columns(
        data,
        &[
            &config.location_col,
            &config.season_col,
            &config.time_col,
            &config.value_col,
        ],
    )?;
    require_temporal(data, &config.time_col)?;
    require_numeric(data, &config.value_col)?;
    if config.stats.is_empty() {
        return Err(PhenoError::Validation(
            "at least one daily statistic is required".into(),
        ));
    }

    let aggs: Vec<Expr> = config
        .stats
        .iter()
        .map(|s| s.expr(&config.value_col))
        .collect();

    let df = data
        .clone()
        .lazy()
        .filter(col(config.time_col.as_str()).is_not_null())
        .with_column(col(config.time_col.as_str()).dt().date().alias(config.day_col.as_str()))
        .group_by_stable([
            col(config.location_col.as_str()),
            col(config.season_col.as_str()),
            col(config.day_col.as_str()),
        ])
        .agg(aggs)
        .collect()?;

    tracing::debug!(days = df.height(), "resampled to daily rows");
    Ok(df)
}

/// Daily mean of `temp_column` per (location, season, calendar day).
///
/// Output columns: location, season, `date`, and the mean under the
/// original temperature column name.
pub fn mean_daily(
    data: &DataFrame,
    location_id_column: &str,
    season_column: &str,
    time_column: &str,
    temp_column: &str,
) -> Result<DataFrame, PhenoError> {
    let config = ResampleConfig::new()
        .with_location_col(location_id_column)
        .with_season_col(season_column)
        .with_time_col(time_column)
        .with_value_col(temp_column);
    resample_daily(data, &config)
}
