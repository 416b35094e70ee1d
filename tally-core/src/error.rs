//! Error types for the pipeline crates.
//!
//! Only structural and configuration problems are errors. A single bad row is
//! reported as a rejected row by the statement parser and never reaches here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("required column '{field}' not found (available columns: {})", .available.join(", "))]
    StructuralInput {
        field: String,
        available: Vec<String>,
    },

    #[error("invalid category rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn structural(field: impl Into<String>, available: &[String]) -> Self {
        Error::StructuralInput {
            field: field.into(),
            available: available.to_vec(),
        }
    }

    /// True for failures caused by the shape of the uploaded data rather than
    /// by the caller's configuration.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::StructuralInput { .. } | Error::Csv(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_message_lists_columns() {
        let err = Error::structural("date", &["Desc".to_string(), "Amt".to_string()]);
        assert_eq!(
            err.to_string(),
            "required column 'date' not found (available columns: Desc, Amt)"
        );
        assert!(err.is_structural());
    }

    #[test]
    fn test_config_error_is_not_structural() {
        let err = Error::InvalidConfig("top_n must be at least 1".to_string());
        assert!(!err.is_structural());
    }
}
