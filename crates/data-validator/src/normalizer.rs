//! Batch Normalization Pipeline
//!
//! Renames a plant's source columns to canonical fields, validates each row
//! and collects every error instead of stopping at the first one.

use crate::error::ValidationError;
use crate::records::{NormalizedRecord, PlantRecord, RawBatch, RawRow};
use crate::validator::RowValidator;
use plant_mapping::{CanonicalField, MappingTable, PlantMapping};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Result of normalizing one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationOutcome {
    pub plant_id: String,
    pub records: Vec<NormalizedRecord>,
    pub errors: Vec<ValidationError>,
    /// Rows in the submitted batch
    pub rows_total: usize,
}

impl NormalizationOutcome {
    fn rejected(plant_id: &str, rows_total: usize, errors: Vec<ValidationError>) -> Self {
        Self {
            plant_id: plant_id.to_string(),
            records: Vec::new(),
            errors,
            rows_total,
        }
    }

    /// True when the whole batch was discarded
    pub fn is_rejected(&self) -> bool {
        self.errors.iter().any(ValidationError::is_batch_level)
    }

    /// Rows excluded from the output
    pub fn rows_rejected(&self) -> usize {
        self.rows_total - self.records.len()
    }

    /// Accepted records tagged with the plant id
    pub fn plant_records(&self) -> Vec<PlantRecord> {
        self.records
            .iter()
            .cloned()
            .map(|record| PlantRecord::new(self.plant_id.clone(), record))
            .collect()
    }
}

/// Normalize a raw batch with the given plant mapping.
///
/// A required field with no locatable column rejects the batch and reports
/// every missing field together. Otherwise rows failing validation are
/// dropped individually and their errors returned alongside the good rows.
pub fn normalize(batch: &RawBatch, mapping: &PlantMapping) -> NormalizationOutcome {
    let plant_id = mapping.plant_id();

    let mut located: BTreeMap<CanonicalField, &str> = BTreeMap::new();
    for column in &batch.columns {
        match mapping.canonical_for(column) {
            Some(field) => {
                located.entry(field).or_insert(column.as_str());
            }
            None => debug!("Dropping unmapped column '{}' for {}", column, plant_id),
        }
    }

    let missing: Vec<ValidationError> = CanonicalField::ALL
        .into_iter()
        .filter(|field| !located.contains_key(field))
        .map(|field| ValidationError::MissingColumn {
            plant_id: plant_id.to_string(),
            field,
            expected_column: mapping.source_for(field).map(str::to_string),
        })
        .collect();

    if !missing.is_empty() {
        warn!(
            "Rejecting batch of {} rows for {}: {} required columns missing",
            batch.len(),
            plant_id,
            missing.len()
        );
        return NormalizationOutcome::rejected(plant_id, batch.len(), missing);
    }

    let validator = RowValidator::new(plant_id, mapping.downtime_unit(), located);
    let mut records = Vec::with_capacity(batch.len());
    let mut errors = Vec::new();

    for (index, row) in batch.rows.iter().enumerate() {
        let index = batch.source_row(index);
        match validator.validate(index, row) {
            Ok(record) => records.push(record),
            Err(row_errors) => {
                debug!("Row {} of {} rejected with {} errors", index, plant_id, row_errors.len());
                errors.extend(row_errors);
            }
        }
    }

    info!(
        "Normalized {} of {} rows for {}",
        records.len(),
        batch.len(),
        plant_id
    );

    NormalizationOutcome {
        plant_id: plant_id.to_string(),
        records,
        errors,
        rows_total: batch.len(),
    }
}

/// Normalize a single manually entered row through the batch path
pub fn normalize_entry(row: RawRow, mapping: &PlantMapping) -> NormalizationOutcome {
    normalize(&RawBatch::from_rows(vec![row]), mapping)
}

/// Resolve the plant's mapping and normalize the batch.
///
/// An unknown plant yields no records and a single `UnknownPlant` error so
/// the caller can warn and move on to the next file.
pub fn process_batch(table: &MappingTable, plant_id: &str, batch: &RawBatch) -> NormalizationOutcome {
    match table.resolve(plant_id) {
        Ok(mapping) => normalize(batch, mapping),
        Err(unknown) => {
            warn!("Skipping {} rows: {}", batch.len(), unknown);
            NormalizationOutcome::rejected(plant_id, batch.len(), vec![unknown.into()])
        }
    }
}
