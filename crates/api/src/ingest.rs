//! Batch Ingestion
//!
//! Normalizes a batch for a plant, records metrics, and stores the accepted
//! rows in the repository and the processed-files directory.

use crate::error::ApiError;
use crate::AppState;
use data_validator::{process_batch, NormalizationOutcome, RawBatch, ValidationError};
use serde::Serialize;
use sheet_reader::{plant_id_from_file_name, read_path, SheetFormat};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How accepted rows are combined with a plant's existing data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// A new export supersedes the plant's exported data; manual entries stay
    Replace,
    /// A manual entry is added to the plant's data
    Append,
}

/// What happened to one submitted batch
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub upload_id: Uuid,
    pub plant_id: String,
    pub rows_total: usize,
    pub rows_accepted: usize,
    pub rows_rejected: usize,
    /// Whether accepted rows were written to the store
    pub stored: bool,
    pub errors: Vec<ValidationError>,
    /// Human-readable rendering of `errors`
    pub messages: Vec<String>,
}

impl IngestReport {
    fn new(outcome: &NormalizationOutcome, stored: bool) -> Self {
        Self {
            upload_id: Uuid::new_v4(),
            plant_id: outcome.plant_id.clone(),
            rows_total: outcome.rows_total,
            rows_accepted: outcome.records.len(),
            rows_rejected: outcome.rows_rejected(),
            stored,
            errors: outcome.errors.clone(),
            messages: outcome.errors.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn unknown_plant(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownPlant(_)))
    }

    pub fn rejected(&self) -> bool {
        self.errors.iter().any(ValidationError::is_batch_level)
    }
}

fn record_metrics(outcome: &NormalizationOutcome) {
    let plant = outcome.plant_id.clone();
    metrics::counter!("plant_metrics_rows_accepted_total", "plant" => plant.clone())
        .increment(outcome.records.len() as u64);
    metrics::counter!("plant_metrics_rows_rejected_total", "plant" => plant.clone())
        .increment(outcome.rows_rejected() as u64);
    if outcome.is_rejected() {
        metrics::counter!("plant_metrics_batches_rejected_total", "plant" => plant).increment(1);
    }
}

/// Normalize `batch` for `plant_id` and store what passed validation.
///
/// Batch-level failures store nothing. Row-level failures store the good rows.
/// Appended rows are also kept as manual entries, which survive every later
/// replace of the plant's data, including reprocessing at startup.
pub fn ingest_batch(
    state: &AppState,
    plant_id: &str,
    batch: &RawBatch,
    mode: IngestMode,
) -> Result<IngestReport, ApiError> {
    let outcome = process_batch(&state.mappings, plant_id, batch);
    record_metrics(&outcome);

    if outcome.is_rejected() {
        for message in outcome.errors.iter() {
            warn!("{}", message);
        }
        return Ok(IngestReport::new(&outcome, false));
    }

    let stored = match mode {
        IngestMode::Replace => {
            let mut records = outcome.records.clone();
            if let Some(processed) = &state.processed {
                let manual = processed.read_manual(plant_id)?;
                if !manual.is_empty() {
                    debug!("Keeping {} manual entries for {}", manual.len(), plant_id);
                    records.extend(manual);
                }
            }
            state.repository.replace_plant(plant_id, records)?;
            true
        }
        IngestMode::Append => {
            for record in &outcome.records {
                state.repository.append_record(plant_id, record.clone())?;
            }
            if let Some(processed) = &state.processed {
                if !outcome.records.is_empty() {
                    processed.append_manual(plant_id, &outcome.records)?;
                }
            }
            !outcome.records.is_empty()
        }
    };

    if stored {
        if let Some(processed) = &state.processed {
            processed.write_plant(plant_id, &state.repository.plant_records(plant_id)?)?;
        }
    }

    Ok(IngestReport::new(&outcome, stored))
}

/// Load every `<plant>_clean.csv` into the repository. Returns the number of plants loaded.
pub fn load_processed(state: &AppState) -> Result<usize, ApiError> {
    let Some(processed) = &state.processed else {
        return Ok(0);
    };

    let plants = processed.load_all()?;
    let count = plants.len();
    for (plant_id, records) in plants {
        state.repository.replace_plant(&plant_id, records)?;
    }
    Ok(count)
}

/// Reprocess every export in `raw_dir`, replacing the data of each plant found.
///
/// Files for unmapped plants or that cannot be read are skipped with a
/// warning. Returns the number of files ingested.
pub fn process_raw_dir(state: &AppState, raw_dir: &Path) -> Result<usize, ApiError> {
    let entries = match std::fs::read_dir(raw_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list raw data directory {}: {}", raw_dir.display(), e);
            return Ok(0);
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| SheetFormat::from_path(path).is_some())
        .collect();
    paths.sort();

    let mut ingested = 0;
    for path in paths {
        let Some(plant_id) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(plant_id_from_file_name)
        else {
            continue;
        };

        if !state.mappings.contains(plant_id) {
            warn!("Skipping {}: no mapping for plant '{}'", path.display(), plant_id);
            continue;
        }

        let batch = match read_path(&path) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let report = ingest_batch(state, plant_id, &batch, IngestMode::Replace)?;
        if report.stored {
            ingested += 1;
        }
    }

    info!("Processed {} exports from {}", ingested, raw_dir.display());
    Ok(ingested)
}
