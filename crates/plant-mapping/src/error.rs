//! Mapping Error Types

use crate::CanonicalField;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the mapping configuration.
///
/// Any of these is fatal to startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration document is not valid JSON of the expected shape
    #[error("Malformed mapping document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Plant identifier is blank
    #[error("Mapping contains an empty plant identifier")]
    EmptyPlantId,

    /// Source column name is blank
    #[error("Plant '{plant_id}' maps an empty source column")]
    EmptySourceColumn { plant_id: String },

    /// Mapping target is not a canonical field
    #[error("Plant '{plant_id}' maps column '{source_column}' to unknown field '{target}'")]
    UnknownTarget {
        plant_id: String,
        source_column: String,
        target: String,
    },

    /// The same source column, after trimming, is mapped more than once
    #[error("Plant '{plant_id}' maps column '{source_column}' more than once")]
    DuplicateSource {
        plant_id: String,
        source_column: String,
    },

    /// Two plant identifiers are equal after trimming
    #[error("Plant '{plant_id}' is configured more than once")]
    DuplicatePlant { plant_id: String },

    /// Two source columns map onto the same canonical field
    #[error("Plant '{plant_id}' maps both '{first}' and '{second}' to '{field}'")]
    DuplicateTarget {
        plant_id: String,
        field: CanonicalField,
        first: String,
        second: String,
    },
}

/// Plant identifier has no entry in the mapping configuration
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("No column mapping configured for plant '{plant_id}'")]
pub struct UnknownPlant {
    pub plant_id: String,
}
