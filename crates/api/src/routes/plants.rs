//! Plant Routes: configured plants, batch submission and manual entry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use data_validator::{RawBatch, RawRow};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::ingest::{ingest_batch, IngestMode, IngestReport};
use crate::AppState;

/// One configured plant
#[derive(Debug, Serialize)]
pub struct PlantInfo {
    pub plant_id: String,
    pub has_data: bool,
    pub records: usize,
}

/// Response for plant listing
#[derive(Debug, Serialize)]
pub struct PlantListResponse {
    pub data: Vec<PlantInfo>,
    pub count: usize,
}

/// List configured plants and whether processed data exists for each
pub async fn list_plants(State(state): State<Arc<RwLock<AppState>>>) -> Result<Json<PlantListResponse>, ApiError> {
    let state = state.read().await;
    let mut data = Vec::with_capacity(state.mappings.len());
    for plant_id in state.mappings.plant_ids() {
        let records = state.repository.plant_records(plant_id)?.len();
        data.push(PlantInfo {
            plant_id: plant_id.to_string(),
            has_data: records > 0,
            records,
        });
    }

    Ok(Json(PlantListResponse {
        count: data.len(),
        data,
    }))
}

/// Status code for a finished ingestion
pub(crate) fn report_status(report: &IngestReport) -> StatusCode {
    if report.unknown_plant() {
        StatusCode::NOT_FOUND
    } else if report.rejected() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    }
}

/// Submit a tabular batch, replacing the plant's data
pub async fn submit_batch(
    State(state): State<Arc<RwLock<AppState>>>,
    Path(plant_id): Path<String>,
    Json(batch): Json<RawBatch>,
) -> Result<(StatusCode, Json<IngestReport>), ApiError> {
    let batch = batch.with_inferred_columns();
    let report = tokio::task::spawn_blocking(move || {
        let state = state.blocking_write();
        ingest_batch(&state, &plant_id, &batch, IngestMode::Replace)
    })
    .await??;
    Ok((report_status(&report), Json(report)))
}

/// Submit one manually entered row, appended to the plant's data
pub async fn submit_entry(
    State(state): State<Arc<RwLock<AppState>>>,
    Path(plant_id): Path<String>,
    Json(row): Json<RawRow>,
) -> Result<(StatusCode, Json<IngestReport>), ApiError> {
    let batch = RawBatch::from_rows(vec![row]);
    let report = tokio::task::spawn_blocking(move || {
        let state = state.blocking_write();
        ingest_batch(&state, &plant_id, &batch, IngestMode::Append)
    })
    .await??;

    let status = match report_status(&report) {
        StatusCode::OK if !report.stored => StatusCode::UNPROCESSABLE_ENTITY,
        status => status,
    };
    Ok((status, Json(report)))
}
