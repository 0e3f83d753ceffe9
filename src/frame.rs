//! Column guards shared by the table operations.

use polars::prelude::*;

use crate::error::PhenoError;

pub(crate) fn require_columns<S: AsRef<str>>(df: &DataFrame, required: &[S]) -> Result<(), PhenoError> {
    for name in required {
        let name = name.as_ref();
        if df.column(name).is_err() {
            return Err(PhenoError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

/// Fails with `TypeMismatch` unless the column holds integers or floats.
pub(crate) fn require_numeric(df: &DataFrame, name: &str) -> Result<(), PhenoError> {
    let column = df
        .column(name)
        .map_err(|_| PhenoError::MissingColumn(name.to_string()))?;
    ensure_numeric(name, column.dtype())
}

pub(crate) fn ensure_numeric(name: &str, dtype: &DataType) -> Result<(), PhenoError> {
    if dtype.is_primitive_numeric() || dtype.is_null() {
        Ok(())
    } else {
        Err(PhenoError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric",
            found: dtype.to_string(),
        })
    }
}

/// Fails with `TypeMismatch` unless the column is Date or Datetime.
pub(crate) fn require_temporal(df: &DataFrame, name: &str) -> Result<(), PhenoError> {
    let column = df
        .column(name)
        .map_err(|_| PhenoError::MissingColumn(name.to_string()))?;
    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) => Ok(()),
        other => Err(PhenoError::TypeMismatch {
            column: name.to_string(),
            expected: "date or datetime",
            found: other.to_string(),
        }),
    }
}

/// Non-empty list of grouping columns as `col(..)` expressions.
pub(crate) fn group_exprs<S: AsRef<str>>(group_vars: &[S]) -> Result<Vec<Expr>, PhenoError> {
    if group_vars.is_empty() {
        return Err(PhenoError::Validation(
            "at least one grouping column is required".into(),
        ));
    }
    Ok(group_vars.iter().map(|c| col(c.as_ref())).collect())
}

/// Selection that restores the input column order.
pub(crate) fn original_order(df: &DataFrame) -> Vec<Expr> {
    df.get_column_names_str().iter().map(|c| col(*c)).collect()
}

/// `base`, extended with underscores until no column of `df` has that name.
pub(crate) fn fresh_column_name(df: &DataFrame, base: &str) -> String {
    let mut name = base.to_string();
    while df.column(&name).is_ok() {
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "location" => ["a", "a"],
            "temperature" => [1.0, 2.0],
            "label" => ["x", "y"]
        )
        .unwrap()
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let err = require_columns(&sample(), &["location", "year"]).unwrap_err();
        assert!(matches!(err, PhenoError::MissingColumn(ref c) if c == "year"));
    }

    #[test]
    fn numeric_guard_rejects_strings() {
        assert!(require_numeric(&sample(), "temperature").is_ok());
        let err = require_numeric(&sample(), "label").unwrap_err();
        assert!(matches!(err, PhenoError::TypeMismatch { .. }));
    }

    #[test]
    fn temporal_guard_rejects_floats() {
        let err = require_temporal(&sample(), "temperature").unwrap_err();
        assert!(matches!(err, PhenoError::TypeMismatch { expected: "date or datetime", .. }));
    }

    #[test]
    fn fresh_name_avoids_existing_columns() {
        assert_eq!(fresh_column_name(&sample(), "tmp"), "tmp");
        assert_eq!(fresh_column_name(&sample(), "label"), "label_");
    }

    #[test]
    fn empty_group_list_is_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            group_exprs(&empty).unwrap_err(),
            PhenoError::Validation(_)
        ));
    }
}
