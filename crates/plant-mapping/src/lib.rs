//! Plant Column Mapping
//!
//! Loads the per-plant mapping configuration and resolves a plant
//! identifier to the translation from its source columns to canonical fields.

mod error;
mod field;
mod mapping;
mod table;

pub use error::{ConfigError, UnknownPlant};
pub use field::{CanonicalField, UnknownField};
pub use mapping::{DowntimeUnit, PlantMapping};
pub use table::MappingTable;
