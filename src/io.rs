//! Weather CSV loading.
//!
//! Files are read with every column as String, then the time column and the
//! requested measurement columns are parsed. Gridded scientific formats are
//! left to dedicated readers; anything that yields the same table shape
//! works with the rest of the crate.

use std::collections::HashMap;
use std::path::Path;

use polars::datatypes::TimeUnit;
use polars::prelude::StrptimeOptions;
use polars::prelude::*;

use crate::error::PhenoError;
use crate::frame::require_columns;
use crate::schema::weather;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns to parse when loading a weather CSV.
#[derive(Debug, Clone)]
pub struct CsvLoadOptions {
    time_col: String,
    time_format: String,
    numeric_cols: Vec<String>,
    rename: Option<HashMap<String, String>>,
}

impl Default for CsvLoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoadOptions {
    /// Defaults: `time` parsed with `%Y-%m-%d %H:%M:%S`, `temperature` as Float64.
    pub fn new() -> Self {
        Self {
            time_col: weather::TIME.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            numeric_cols: vec![weather::TEMPERATURE.to_string()],
            rename: None,
        }
    }

    pub fn with_time_col(mut self, name: impl Into<String>) -> Self {
        self.time_col = name.into();
        self
    }

    /// strptime format, e.g. "%Y-%m-%dT%H:%M:%S" or "%d/%m/%Y".
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    pub fn with_numeric_cols<S: Into<String>>(mut self, cols: impl IntoIterator<Item = S>) -> Self {
        self.numeric_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Rename columns (old -> new) right after reading, matched against the
    /// trimmed header names.
    pub fn with_rename(mut self, rename: HashMap<String, String>) -> Self {
        self.rename = Some(rename);
        self
    }
}

/// Load a weather CSV into a row-per-observation table.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_weather_csv(
    path: impl AsRef<Path>,
    options: &CsvLoadOptions,
) -> Result<DataFrame, PhenoError> {
    let raw = read_raw(path.as_ref(), options.rename.as_ref())?;
    require_columns(&raw, &[&options.time_col])?;
    require_columns(&raw, &options.numeric_cols)?;

    let mut df = parse_datetime(raw, &options.time_col, &options.time_format)?;
    for name in &options.numeric_cols {
        df = parse_float(df, name)?;
    }
    tracing::debug!(rows = df.height(), cols = df.width(), "loaded weather csv");
    Ok(df)
}

// Every column as String. Header names are trimmed, then renamed; rename
// keys that match no column are ignored.
fn read_raw(path: &Path, rename: Option<&HashMap<String, String>>) -> Result<DataFrame, PhenoError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|raw| {
            let name = raw.trim();
            rename
                .and_then(|map| map.get(name))
                .map_or_else(|| name.to_string(), Clone::clone)
        })
        .collect();
    df.set_column_names(names)?;
    Ok(df)
}

/// Parse a string column to a microsecond Datetime using `format`.
pub fn parse_datetime(df: DataFrame, column: &str, format: &str) -> Result<DataFrame, PhenoError> {
    require_columns(&df, &[column])?;
    let df = df
        .lazy()
        .with_columns([col(column)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .str()
            .to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                StrptimeOptions {
                    format: Some(format.into()),
                    strict: true,
                    ..Default::default()
                },
                lit("raise"),
            )])
        .collect()
        .map_err(|e| PhenoError::TypeMismatch {
            column: column.to_string(),
            expected: "datetime text",
            found: e.to_string(),
        })?;
    Ok(df)
}

/// Parse a string column to Float64. Unparseable text is an error.
pub fn parse_float(df: DataFrame, column: &str) -> Result<DataFrame, PhenoError> {
    require_columns(&df, &[column])?;
    let df = df
        .lazy()
        .with_columns([col(column)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .strict_cast(DataType::Float64)])
        .collect()
        .map_err(|e| PhenoError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric text",
            found: e.to_string(),
        })?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_and_parses_columns() {
        let file = write_csv(
            " location , year,time,temperature\n\
             farm,2024,2024-06-01 00:00:00, 12.5\n\
             farm,2024,2024-06-01 01:00:00,13.0\n",
        );
        let df = load_weather_csv(file.path(), &CsvLoadOptions::new()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names_str(),
            vec!["location", "year", "time", "temperature"]
        );
        assert!(matches!(
            df.column("time").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Microseconds, None)
        ));
        let temps: Vec<Option<f64>> = df
            .column("temperature")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(temps, vec![Some(12.5), Some(13.0)]);
    }

    #[test]
    fn rename_is_applied_before_parsing() {
        let file = write_csv("site,valid_time,t2m\nx,2024-06-01T06:00,280.5\n");
        let rename = HashMap::from([("valid_time".to_string(), "time".to_string())]);
        let options = CsvLoadOptions::new()
            .with_rename(rename)
            .with_time_format("%Y-%m-%dT%H:%M")
            .with_numeric_cols(["t2m"]);
        let df = load_weather_csv(file.path(), &options).unwrap();
        assert!(df.column("time").is_ok());
        assert_eq!(df.column("t2m").unwrap().f64().unwrap().get(0), Some(280.5));
    }

    #[test]
    fn rename_matches_trimmed_headers() {
        let file = write_csv(" stamp ,temperature\n2024-06-01 00:00:00,4.0\n");
        let rename = HashMap::from([
            ("stamp".to_string(), "time".to_string()),
            ("absent".to_string(), "ignored".to_string()),
        ]);
        let df = load_weather_csv(file.path(), &CsvLoadOptions::new().with_rename(rename)).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["time", "temperature"]);
    }

    #[test]
    fn missing_time_column_is_reported() {
        let file = write_csv("location,temperature\nfarm,1.0\n");
        let err = load_weather_csv(file.path(), &CsvLoadOptions::new()).unwrap_err();
        assert!(matches!(err, PhenoError::MissingColumn(ref c) if c == "time"));
    }

    #[test]
    fn text_in_numeric_column_is_a_type_error() {
        let file = write_csv("time,temperature\n2024-06-01 00:00:00,warm\n");
        let err = load_weather_csv(file.path(), &CsvLoadOptions::new()).unwrap_err();
        assert!(matches!(err, PhenoError::TypeMismatch { ref column, .. } if column == "temperature"));
    }
}
