//! Mapping Table Loading and Resolution

use crate::{CanonicalField, ConfigError, DowntimeUnit, PlantMapping, UnknownPlant};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Plant entry as written in the configuration document.
///
/// Either a bare `{ "source": "canonical" }` object or a detailed form
/// carrying the columns alongside plant options.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlantEntry {
    Detailed {
        columns: BTreeMap<String, String>,
        #[serde(default)]
        downtime_unit: DowntimeUnit,
    },
    Columns(BTreeMap<String, String>),
}

/// Read-only lookup of plant mappings, built once at startup
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    plants: BTreeMap<String, PlantMapping>,
}

impl MappingTable {
    /// Build a table from already-validated mappings
    pub fn from_mappings(mappings: impl IntoIterator<Item = PlantMapping>) -> Self {
        let plants = mappings
            .into_iter()
            .map(|m| (m.plant_id().to_string(), m))
            .collect();
        Self { plants }
    }

    /// Parse and validate a JSON mapping document
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let entries: BTreeMap<String, PlantEntry> = serde_json::from_str(document)?;
        let mut plants: BTreeMap<String, PlantMapping> = BTreeMap::new();

        for (plant_id, entry) in entries {
            let (columns, downtime_unit) = match entry {
                PlantEntry::Detailed {
                    columns,
                    downtime_unit,
                } => (columns, downtime_unit),
                PlantEntry::Columns(columns) => (columns, DowntimeUnit::default()),
            };

            let mut pairs = Vec::with_capacity(columns.len());
            for (source_column, target) in columns {
                let field = target.parse::<CanonicalField>().map_err(|_| {
                    ConfigError::UnknownTarget {
                        plant_id: plant_id.clone(),
                        source_column: source_column.clone(),
                        target: target.clone(),
                    }
                })?;
                pairs.push((source_column, field));
            }

            let mapping = PlantMapping::new(plant_id.trim(), pairs, downtime_unit)?;
            if plants.contains_key(mapping.plant_id()) {
                return Err(ConfigError::DuplicatePlant {
                    plant_id: mapping.plant_id().to_string(),
                });
            }

            let unmapped = mapping.unmapped_fields();
            if !unmapped.is_empty() {
                warn!(
                    "Plant {} has no source column for {:?}; its batches will be rejected",
                    mapping.plant_id(),
                    unmapped
                );
            }
            debug!(
                "Loaded mapping for {} ({} columns, downtime in {:?})",
                mapping.plant_id(),
                mapping.columns().count(),
                mapping.downtime_unit()
            );
            plants.insert(mapping.plant_id().to_string(), mapping);
        }

        Ok(Self { plants })
    }

    /// Load the mapping document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&document)?;
        info!("Loaded column mappings for {} plants from {}", table.len(), path.display());
        Ok(table)
    }

    /// Look up the mapping for a plant
    pub fn resolve(&self, plant_id: &str) -> Result<&PlantMapping, UnknownPlant> {
        self.plants.get(plant_id).ok_or_else(|| UnknownPlant {
            plant_id: plant_id.to_string(),
        })
    }

    pub fn contains(&self, plant_id: &str) -> bool {
        self.plants.contains_key(plant_id)
    }

    /// Configured plant identifiers, sorted
    pub fn plant_ids(&self) -> Vec<&str> {
        self.plants.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "plant_1": {"Date": "date", "Shift": "shift", "Bottles": "bottles_produced",
                    "Defects": "defect_count", "Downtime": "downtime"},
        "plant_5": {
            "columns": {"Day": "date", "Crew": "shift", "Output": "bottles_produced",
                        "Rejects": "defect_count", "StopHours": "downtime"},
            "downtime_unit": "hours"
        }
    }"#;

    #[test]
    fn test_parse_both_entry_forms() {
        let table = MappingTable::from_json_str(DOCUMENT).unwrap();
        assert_eq!(table.plant_ids(), vec!["plant_1", "plant_5"]);

        let plant_1 = table.resolve("plant_1").unwrap();
        assert_eq!(plant_1.downtime_unit(), DowntimeUnit::Minutes);
        assert_eq!(plant_1.source_for(CanonicalField::Downtime), Some("Downtime"));

        let plant_5 = table.resolve("plant_5").unwrap();
        assert_eq!(plant_5.downtime_unit(), DowntimeUnit::Hours);
        assert_eq!(plant_5.canonical_for("Crew"), Some(CanonicalField::Shift));
    }

    #[test]
    fn test_resolve_unknown_plant() {
        let table = MappingTable::from_json_str(DOCUMENT).unwrap();
        let err = table.resolve("plant_42").unwrap_err();
        assert_eq!(err.plant_id, "plant_42");
    }

    #[test]
    fn test_unknown_target_rejected() {
        let err = MappingTable::from_json_str(r#"{"plant_1": {"Date": "day"}}"#).unwrap_err();
        match err {
            ConfigError::UnknownTarget {
                plant_id,
                source_column,
                target,
            } => {
                assert_eq!(plant_id, "plant_1");
                assert_eq!(source_column, "Date");
                assert_eq!(target, "day");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_target_rejected_at_load() {
        let err = MappingTable::from_json_str(
            r#"{"plant_1": {"Date": "date", "Fecha": "date"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTarget { .. }));
    }

    #[test]
    fn test_trimmed_plant_id_collision_rejected() {
        let err = MappingTable::from_json_str(
            r#"{"plant_1": {"Date": "date"}, " plant_1": {"Fecha": "date"}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicatePlant { ref plant_id } if plant_id == "plant_1"
        ));
    }

    #[test]
    fn test_duplicate_source_rejected_at_load() {
        let err = MappingTable::from_json_str(
            r#"{"plant_1": {"Date": "date", "Date ": "shift"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSource { .. }));
    }

    #[test]
    fn test_malformed_document_rejected() {
        let err = MappingTable::from_json_str(r#"{"plant_1": ["date"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
