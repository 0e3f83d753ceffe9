use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhenoError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "python")]
impl From<PhenoError> for pyo3::PyErr {
    fn from(err: PhenoError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyTypeError, PyValueError};

        match err {
            PhenoError::MissingColumn(_) => PyKeyError::new_err(err.to_string()),
            PhenoError::TypeMismatch { .. } => PyTypeError::new_err(err.to_string()),
            PhenoError::InvalidThresholds(_) | PhenoError::Validation(_) => {
                PyValueError::new_err(err.to_string())
            }
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
