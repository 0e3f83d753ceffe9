//! First date at which a cumulative column reaches a threshold.

use polars::prelude::*;

use crate::error::PhenoError;
use crate::frame::{
    fresh_column_name, group_exprs, original_order, require_columns, require_numeric,
    require_temporal,
};
use crate::schema::weather;

const ROW_INDEX: &str = "__phenokit_row";

/// Parameters for [`threshold_cross`].
#[derive(Debug, Clone)]
pub struct ThresholdConfig {
    cumulative_col: String,
    threshold: f64,
    date_col: String,
    group_vars: Vec<String>,
}

impl ThresholdConfig {
    /// Defaults: `date_col = "time"`, grouping by `location` and `year`.
    pub fn new(cumulative_col: impl Into<String>, threshold: f64) -> Self {
        Self {
            cumulative_col: cumulative_col.into(),
            threshold,
            date_col: weather::TIME.to_string(),
            group_vars: weather::DEFAULT_GROUP_VARS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }

    pub fn with_date_col(mut self, date_col: impl Into<String>) -> Self {
        self.date_col = date_col.into();
        self
    }

    pub fn with_group_vars<S: Into<String>>(mut self, group_vars: impl IntoIterator<Item = S>) -> Self {
        self.group_vars = group_vars.into_iter().map(Into::into).collect();
        self
    }

    pub fn cumulative_col(&self) -> &str {
        &self.cumulative_col
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn date_col(&self) -> &str {
        &self.date_col
    }

    pub fn group_vars(&self) -> &[String] {
        &self.group_vars
    }
}

/// Per group, the earliest row whose `cumulative_col >= threshold`.
///
/// Returns one row per group that ever reaches the threshold; groups that
/// never do are absent. Ties on the date keep the first row encountered.
/// Rows with a null date or a null/NaN cumulative value never qualify. Output columns follow the input
/// order and groups appear in the order of their crossing row.
#[tracing::instrument(skip_all, fields(cumulative_col = %cumulative_col, threshold = threshold, rows = data.height()))]
pub fn threshold_cross_date<S: AsRef<str>>(
    data: &DataFrame,
    cumulative_col: &str,
    threshold: f64,
    date_col: &str,
    group_vars: &[S],
) -> Result<DataFrame, PhenoError> {
    require_columns(data, &[cumulative_col, date_col])?;
    require_columns(data, group_vars)?;
    require_numeric(data, cumulative_col)?;
    require_temporal(data, date_col)?;
    let partition = group_exprs(group_vars)?;
    let row_index = fresh_column_name(data, ROW_INDEX);

    // NaN sorts above every float, so it must be excluded explicitly.
    let qualifying = data
        .clone()
        .lazy()
        .with_row_index(row_index.as_str(), None)
        .filter(
            col(cumulative_col)
                .cast(DataType::Float64)
                .is_not_nan()
                .and(col(cumulative_col).gt_eq(lit(threshold)))
                .and(col(date_col).is_not_null()),
        )
        .sort(
            [date_col],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    // After the stable date sort, the first row index of each group is the
    // earliest qualifying row, with input order breaking date ties.
    let df = qualifying
        .lazy()
        .filter(col(row_index.as_str()).eq(col(row_index.as_str()).first().over(partition)))
        .sort([row_index.as_str()], SortMultipleOptions::default())
        .select(original_order(data))
        .collect()?;

    tracing::debug!(groups = df.height(), "threshold crossings found");
    Ok(df)
}

/// [`threshold_cross_date`] driven by a [`ThresholdConfig`].
pub fn threshold_cross(data: &DataFrame, config: &ThresholdConfig) -> Result<DataFrame, PhenoError> {
    threshold_cross_date(
        data,
        &config.cumulative_col,
        config.threshold,
        &config.date_col,
        &config.group_vars,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn dates(df: &DataFrame, name: &str) -> Vec<NaiveDate> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .date()
            .unwrap()
            .as_date_iter()
            .map(|d| d.unwrap())
            .collect()
    }

    #[test]
    fn first_day_at_or_above_threshold() {
        let df = df!(
            "location" => ["a"; 5],
            "year" => [2024; 5],
            "time" => [day(1), day(2), day(3), day(4), day(5)],
            "cumulative_gdu" => [0.0, 2.0, 7.0, 10.0, 15.0]
        )
        .unwrap();
        let out =
            threshold_cross_date(&df, "cumulative_gdu", 8.0, "time", &weather::DEFAULT_GROUP_VARS)
                .unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(dates(&out, "time"), vec![day(4)]);
        assert_eq!(out.column("cumulative_gdu").unwrap().f64().unwrap().get(0), Some(10.0));
        assert_eq!(out.get_column_names_str(), df.get_column_names_str());
    }

    #[test]
    fn exact_threshold_counts_as_crossing() {
        let df = df!(
            "location" => ["a"; 3],
            "year" => [2024; 3],
            "time" => [day(1), day(2), day(3)],
            "acc" => [4.0, 8.0, 9.0]
        )
        .unwrap();
        let out = threshold_cross_date(&df, "acc", 8.0, "time", &["location", "year"]).unwrap();
        assert_eq!(dates(&out, "time"), vec![day(2)]);
    }

    #[test]
    fn groups_that_never_cross_are_absent() {
        let df = df!(
            "location" => ["a", "a", "b", "b", "c"],
            "year" => [2024; 5],
            "time" => [day(1), day(2), day(1), day(2), day(1)],
            "acc" => [5.0, 12.0, 1.0, 3.0, 20.0]
        )
        .unwrap();
        let out = threshold_cross_date(&df, "acc", 10.0, "time", &["location", "year"]).unwrap();
        let locations: Vec<&str> = out
            .column("location")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(locations, vec!["a", "c"]);
    }

    #[test]
    fn unsorted_input_still_picks_earliest_date() {
        let df = df!(
            "location" => ["a"; 3],
            "year" => [2024; 3],
            "time" => [day(9), day(3), day(6)],
            "acc" => [30.0, 12.0, 20.0]
        )
        .unwrap();
        let out = threshold_cross_date(&df, "acc", 10.0, "time", &["location", "year"]).unwrap();
        assert_eq!(dates(&out, "time"), vec![day(3)]);
    }

    #[test]
    fn date_ties_return_a_single_row() {
        let df = df!(
            "location" => ["a"; 3],
            "year" => [2024; 3],
            "time" => [day(2), day(2), day(3)],
            "acc" => [11.0, 13.0, 20.0]
        )
        .unwrap();
        let out = threshold_cross_date(&df, "acc", 10.0, "time", &["location", "year"]).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(out.column("acc").unwrap().f64().unwrap().get(0), Some(11.0));
    }

    #[test]
    fn rerunning_on_output_is_idempotent() {
        let df = df!(
            "location" => ["a", "a", "b", "b"],
            "year" => [2024; 4],
            "time" => [day(1), day(2), day(1), day(2)],
            "acc" => [9.0, 14.0, 11.0, 18.0]
        )
        .unwrap();
        let config = ThresholdConfig::new("acc", 10.0);
        let once = threshold_cross(&df, &config).unwrap();
        let twice = threshold_cross(&once, &config).unwrap();
        assert!(once.equals(&twice));
    }

    #[test]
    fn nan_running_total_never_crosses() {
        let df = df!(
            "location" => ["a"; 4],
            "year" => [2024; 4],
            "time" => [day(1), day(2), day(3), day(4)],
            "temperature" => [12.0, f64::NAN, 14.0, 15.0]
        )
        .unwrap();
        let df = crate::units::with_degree_units(
            &df,
            "temperature",
            &crate::units::DegreeUnit::growing(10.0, None),
            None,
        )
        .unwrap();
        let df =
            crate::cumulative::cumulative_degree_units(&df, "gdu", &weather::DEFAULT_GROUP_VARS, None)
                .unwrap();

        let out = threshold_cross(&df, &ThresholdConfig::new("cumulative_gdu", 100.0)).unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn nan_before_a_real_crossing_is_skipped() {
        let df = df!(
            "location" => ["a"; 3],
            "year" => [2024; 3],
            "time" => [day(1), day(2), day(3)],
            "acc" => [1.0, f64::NAN, 50.0]
        )
        .unwrap();
        let out = threshold_cross(&df, &ThresholdConfig::new("acc", 10.0)).unwrap();
        assert_eq!(dates(&out, "time"), vec![day(3)]);
    }

    #[test]
    fn existing_row_index_name_does_not_clash() {
        let df = df!(
            "location" => ["a", "a"],
            "year" => [2024; 2],
            "time" => [day(1), day(2)],
            "acc" => [4.0, 12.0],
            ROW_INDEX => [7u32, 8u32]
        )
        .unwrap();
        let out = threshold_cross(&df, &ThresholdConfig::new("acc", 10.0)).unwrap();
        assert_eq!(out.get_column_names_str(), df.get_column_names_str());
        assert_eq!(out.column(ROW_INDEX).unwrap().u32().unwrap().get(0), Some(8));
    }

    #[test]
    fn string_dates_are_rejected() {
        let df = df!(
            "location" => ["a"],
            "year" => [2024],
            "time" => ["2024-05-01"],
            "acc" => [10.0]
        )
        .unwrap();
        let err = threshold_cross(&df, &ThresholdConfig::new("acc", 5.0)).unwrap_err();
        assert!(matches!(err, PhenoError::TypeMismatch { .. }));
    }
}
