//! Per-Plant Column Mapping

use crate::{CanonicalField, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit a plant reports downtime in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DowntimeUnit {
    #[default]
    Minutes,
    Hours,
}

impl DowntimeUnit {
    /// Convert a downtime value in this unit to minutes
    pub fn to_minutes(self, value: f64) -> f64 {
        match self {
            DowntimeUnit::Minutes => value,
            DowntimeUnit::Hours => value * 60.0,
        }
    }
}

/// Translation table from one plant's source columns to canonical fields
#[derive(Debug, Clone, PartialEq)]
pub struct PlantMapping {
    plant_id: String,
    columns: BTreeMap<String, CanonicalField>,
    sources: BTreeMap<CanonicalField, String>,
    downtime_unit: DowntimeUnit,
}

impl PlantMapping {
    /// Build a mapping from `(source column, canonical field)` pairs.
    ///
    /// Source names are trimmed. Fails if a source column is listed twice or a
    /// canonical field is targeted twice.
    pub fn new<I, S>(
        plant_id: impl Into<String>,
        pairs: I,
        downtime_unit: DowntimeUnit,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, CanonicalField)>,
        S: AsRef<str>,
    {
        let plant_id = plant_id.into();
        if plant_id.trim().is_empty() {
            return Err(ConfigError::EmptyPlantId);
        }

        let mut columns: BTreeMap<String, CanonicalField> = BTreeMap::new();
        let mut sources: BTreeMap<CanonicalField, String> = BTreeMap::new();

        for (source, field) in pairs {
            let source = source.as_ref().trim();
            if source.is_empty() {
                return Err(ConfigError::EmptySourceColumn { plant_id });
            }
            if columns.contains_key(source) {
                return Err(ConfigError::DuplicateSource {
                    plant_id,
                    source_column: source.to_string(),
                });
            }
            if let Some(first) = sources.get(&field) {
                return Err(ConfigError::DuplicateTarget {
                    plant_id,
                    field,
                    first: first.clone(),
                    second: source.to_string(),
                });
            }
            sources.insert(field, source.to_string());
            columns.insert(source.to_string(), field);
        }

        Ok(Self {
            plant_id,
            columns,
            sources,
            downtime_unit,
        })
    }

    /// Mapping whose source columns already carry the canonical names
    pub fn identity(plant_id: impl Into<String>) -> Self {
        let columns = CanonicalField::ALL
            .into_iter()
            .map(|field| (field.as_str().to_string(), field))
            .collect();
        let sources = CanonicalField::ALL
            .into_iter()
            .map(|field| (field, field.as_str().to_string()))
            .collect();
        Self {
            plant_id: plant_id.into(),
            columns,
            sources,
            downtime_unit: DowntimeUnit::Minutes,
        }
    }

    pub fn plant_id(&self) -> &str {
        &self.plant_id
    }

    pub fn downtime_unit(&self) -> DowntimeUnit {
        self.downtime_unit
    }

    /// Source column feeding a canonical field, if mapped
    pub fn source_for(&self, field: CanonicalField) -> Option<&str> {
        self.sources.get(&field).map(String::as_str)
    }

    /// Canonical field a source column maps to; surrounding whitespace is ignored
    pub fn canonical_for(&self, source: &str) -> Option<CanonicalField> {
        self.columns.get(source.trim()).copied()
    }

    /// Iterate `(source column, canonical field)` pairs
    pub fn columns(&self) -> impl Iterator<Item = (&str, CanonicalField)> {
        self.columns.iter().map(|(s, f)| (s.as_str(), *f))
    }

    /// Required fields with no source column
    pub fn unmapped_fields(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| !self.sources.contains_key(field))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant_3() -> PlantMapping {
        PlantMapping::new(
            "plant_3",
            [
                ("Fecha", CanonicalField::Date),
                ("Turno", CanonicalField::Shift),
                ("Unidades", CanonicalField::BottlesProduced),
                ("Rechazos", CanonicalField::DefectCount),
                ("ParoMin", CanonicalField::Downtime),
            ],
            DowntimeUnit::Minutes,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_both_directions() {
        let mapping = plant_3();
        assert_eq!(mapping.canonical_for("Turno"), Some(CanonicalField::Shift));
        assert_eq!(mapping.canonical_for(" Turno "), Some(CanonicalField::Shift));
        assert_eq!(mapping.source_for(CanonicalField::Downtime), Some("ParoMin"));
        assert_eq!(mapping.canonical_for("Notas"), None);
        assert!(mapping.unmapped_fields().is_empty());
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let err = PlantMapping::new(
            "plant_1",
            [("Date", CanonicalField::Date), ("Day", CanonicalField::Date)],
            DowntimeUnit::Minutes,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateTarget { field: CanonicalField::Date, .. }
        ));
    }

    #[test]
    fn test_duplicate_trimmed_source_rejected() {
        let err = PlantMapping::new(
            "plant_1",
            [("Date", CanonicalField::Date), ("Date ", CanonicalField::Shift)],
            DowntimeUnit::Minutes,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateSource { ref source_column, .. } if source_column == "Date"
        ));
    }

    #[test]
    fn test_empty_plant_id_rejected() {
        let err = PlantMapping::new("  ", [("Date", CanonicalField::Date)], DowntimeUnit::Minutes)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPlantId));
    }

    #[test]
    fn test_partial_mapping_reports_unmapped() {
        let mapping = PlantMapping::new(
            "plant_2",
            [("Date", CanonicalField::Date), ("Shift", CanonicalField::Shift)],
            DowntimeUnit::Minutes,
        )
        .unwrap();
        assert_eq!(
            mapping.unmapped_fields(),
            vec![
                CanonicalField::BottlesProduced,
                CanonicalField::DefectCount,
                CanonicalField::Downtime
            ]
        );
    }

    #[test]
    fn test_identity_mapping() {
        let mapping = PlantMapping::identity("plant_9");
        for field in CanonicalField::ALL {
            assert_eq!(mapping.source_for(field), Some(field.as_str()));
        }
    }

    #[test]
    fn test_hours_convert_to_minutes() {
        assert_eq!(DowntimeUnit::Hours.to_minutes(1.5), 90.0);
        assert_eq!(DowntimeUnit::Minutes.to_minutes(1.5), 1.5);
    }
}
