//! Data Validation and Normalization
//!
//! Turns raw per-plant production tables into canonical records, reporting
//! unknown plants, missing columns and invalid values as structured errors.

mod error;
mod normalizer;
mod records;
mod validator;

pub use error::{ValidationError, ValueProblem};
pub use normalizer::{normalize, normalize_entry, process_batch, NormalizationOutcome};
pub use records::{DayOfWeek, NormalizedRecord, PlantRecord, RawBatch, RawRow, RawValue, Shift};
pub use validator::{
    coerce_count, coerce_date, coerce_downtime, coerce_non_negative, coerce_shift, RowValidator,
    MAX_COUNT, MAX_DOWNTIME_MINUTES,
};
