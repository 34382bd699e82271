//! Validation Error Types

use plant_mapping::{CanonicalField, UnknownPlant};
use serde::Serialize;
use thiserror::Error;

/// Why a single cell was rejected
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueProblem {
    #[error("is missing")]
    MissingValue,

    #[error("is not a shift code (expected A, B, C or 1, 2, 3)")]
    UnknownShift,

    #[error("is not a recognizable date")]
    UnparsableDate,

    #[error("is not a number")]
    NotANumber,

    #[error("must not be negative")]
    Negative,

    #[error("must be a whole number")]
    NotWholeNumber,

    #[error("is too large (at most {limit})")]
    TooLarge { limit: f64 },

    #[error("defect count {defect_count} exceeds bottles produced {bottles_produced}")]
    DefectsExceedProduction {
        defect_count: u64,
        bottles_produced: u64,
    },
}

/// Errors surfaced by the normalization pipeline
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Plant has no mapping; the whole batch is skipped
    #[error(transparent)]
    UnknownPlant(#[from] UnknownPlant),

    /// Required field cannot be located; the whole batch is rejected
    #[error("Plant '{plant_id}' has no column for required field '{field}'{}", describe_expected(.expected_column))]
    MissingColumn {
        plant_id: String,
        field: CanonicalField,
        /// Source column the mapping points at, when one is configured
        expected_column: Option<String>,
    },

    /// One cell of one row failed coercion or a business rule
    #[error("Plant '{plant_id}' row {row}: {column} ({field}) value \"{value}\" {problem}")]
    InvalidValue {
        plant_id: String,
        row: usize,
        field: CanonicalField,
        column: String,
        value: String,
        problem: ValueProblem,
    },
}

fn describe_expected(expected: &Option<String>) -> String {
    match expected {
        Some(column) => format!(" (expected source column '{column}')"),
        None => " (no source column mapped)".to_string(),
    }
}

impl ValidationError {
    /// Whether this error discards the entire batch rather than one row
    pub fn is_batch_level(&self) -> bool {
        !matches!(self, ValidationError::InvalidValue { .. })
    }

    /// Row index for row-level errors
    pub fn row(&self) -> Option<usize> {
        match self {
            ValidationError::InvalidValue { row, .. } => Some(*row),
            _ => None,
        }
    }
}
