//! Running totals of a daily unit column within groups.

use polars::prelude::*;

use crate::error::PhenoError;
use crate::frame::{group_exprs, require_columns, require_numeric};
use crate::schema::cumulative_name;

/// Append the running sum of `unit_col` within each `group_vars` partition.
///
/// Rows are summed in their existing order; the caller sorts by time
/// within a group beforehand. Row count and order are preserved. The
/// output column defaults to `cumulative_<unit_col>`. Null units stay
/// null and do not interrupt the running total.
#[tracing::instrument(skip_all, fields(unit_col = %unit_col, rows = data.height()))]
pub fn cumulative_degree_units<S: AsRef<str>>(
    data: &DataFrame,
    unit_col: &str,
    group_vars: &[S],
    cum_col: Option<&str>,
) -> Result<DataFrame, PhenoError> {
    require_columns(data, &[unit_col])?;
    require_columns(data, group_vars)?;
    require_numeric(data, unit_col)?;
    let partition = group_exprs(group_vars)?;

    let out_name = cum_col
        .map(str::to_string)
        .unwrap_or_else(|| cumulative_name(unit_col));

    let running = col(unit_col)
        .cast(DataType::Float64)
        .cum_sum(false)
        .over(partition)
        .alias(out_name.as_str());

    let df = data.clone().lazy().with_column(running).collect()?;
    tracing::debug!(column = %out_name, "appended cumulative units");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn single_group_running_sum() {
        let df = df!(
            "location" => ["a", "a", "a", "a", "a"],
            "gdu" => [0.0, 2.0, 5.0, 3.0, 4.0]
        )
        .unwrap();
        let out = cumulative_degree_units(&df, "gdu", &["location"], None).unwrap();
        assert_eq!(
            values(&out, "cumulative_gdu"),
            vec![Some(0.0), Some(2.0), Some(7.0), Some(10.0), Some(14.0)]
        );
    }

    #[test]
    fn sums_never_cross_groups_and_order_is_kept() {
        let df = df!(
            "location" => ["a", "b", "a", "b", "a"],
            "year" => [2020, 2020, 2020, 2021, 2020],
            "gdu" => [1.0, 10.0, 2.0, 100.0, 3.0]
        )
        .unwrap();
        let out =
            cumulative_degree_units(&df, "gdu", &["location", "year"], Some("acc")).unwrap();
        assert_eq!(out.height(), 5);
        assert_eq!(
            values(&out, "acc"),
            vec![Some(1.0), Some(10.0), Some(3.0), Some(100.0), Some(6.0)]
        );
    }

    #[test]
    fn integer_units_are_accumulated_as_floats() {
        let df = df!("site" => ["x", "x"], "cdu" => [2i64, 3]).unwrap();
        let out = cumulative_degree_units(&df, "cdu", &["site"], None).unwrap();
        assert_eq!(values(&out, "cumulative_cdu"), vec![Some(2.0), Some(5.0)]);
    }

    #[test]
    fn missing_columns_fail_fast() {
        let df = df!("location" => ["a"], "gdu" => [1.0]).unwrap();
        let err = cumulative_degree_units(&df, "sdu", &["location"], None).unwrap_err();
        assert!(matches!(err, PhenoError::MissingColumn(ref c) if c == "sdu"));
        let err = cumulative_degree_units(&df, "gdu", &["location", "year"], None).unwrap_err();
        assert!(matches!(err, PhenoError::MissingColumn(ref c) if c == "year"));
    }

    #[test]
    fn split_halves_reproduce_full_sum() {
        let units = [1.5, 0.0, 4.0, 2.5, 3.0, 0.5];
        let full = df!("g" => ["a"; 6], "u" => units).unwrap();
        let head = df!("g" => ["a"; 3], "u" => &units[..3]).unwrap();
        let tail = df!("g" => ["a"; 3], "u" => &units[3..]).unwrap();

        let full = values(&cumulative_degree_units(&full, "u", &["g"], None).unwrap(), "cumulative_u");
        let head = values(&cumulative_degree_units(&head, "u", &["g"], None).unwrap(), "cumulative_u");
        let tail = values(&cumulative_degree_units(&tail, "u", &["g"], None).unwrap(), "cumulative_u");

        let offset = head[2].unwrap();
        let stitched: Vec<Option<f64>> = head
            .iter()
            .copied()
            .chain(tail.iter().map(|v| v.map(|v| v + offset)))
            .collect();
        assert_eq!(stitched, full);
    }
}
