//! Spreadsheet Upload Route

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sheet_reader::{plant_id_from_file_name, read_bytes, SheetFormat};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::ApiError;
use crate::ingest::{ingest_batch, IngestMode, IngestReport};
use crate::routes::plants::report_status;
use crate::AppState;

/// Accept a raw export named `<plant_id>.<ext>`.
///
/// The file is kept in the raw data directory so it is reprocessed at the
/// next startup, then normalized and stored like a submitted batch.
pub async fn upload_export(
    State(state): State<Arc<RwLock<AppState>>>,
    Path(file_name): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestReport>), ApiError> {
    let base = std::path::Path::new(&file_name)
        .file_name()
        .and_then(|n| n.to_str());
    if base != Some(file_name.as_str()) {
        return Err(ApiError::BadRequest(format!("Invalid file name '{file_name}'")));
    }

    let format = SheetFormat::from_path(&file_name)
        .ok_or_else(|| ApiError::UnsupportedFormat(file_name.clone()))?;
    let plant_id = plant_id_from_file_name(&file_name)
        .ok_or_else(|| ApiError::BadRequest(format!("No plant id in file name '{file_name}'")))?
        .to_string();

    let report = tokio::task::spawn_blocking(move || -> Result<IngestReport, ApiError> {
        let batch = read_bytes(&body, format)?;
        info!("Received {} ({} bytes, {} rows)", file_name, body.len(), batch.len());

        let state = state.blocking_write();
        if let Some(raw_dir) = &state.raw_dir {
            let path = raw_dir.join(&file_name);
            std::fs::create_dir_all(raw_dir)
                .and_then(|_| std::fs::write(&path, &body))
                .map_err(|source| storage::StorageError::Io { path, source })?;
        }
        ingest_batch(&state, &plant_id, &batch, IngestMode::Replace)
    })
    .await??;
    Ok((report_status(&report), Json(report)))
}
