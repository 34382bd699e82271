//! Storage Layer
//!
//! Holds normalized plant records in memory and persists them as one
//! `<plant>_clean.csv` file per plant.

mod files;
mod repository;

pub use files::{ProcessedFiles, CLEAN_SUFFIX, MANUAL_SUFFIX};
pub use repository::Repository;

use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
