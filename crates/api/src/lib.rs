//! Plant Metrics API Server
//!
//! REST API for submitting plant production exports and reading the
//! dashboard aggregates computed over the normalized records.

use anyhow::{anyhow, Context};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use plant_mapping::MappingTable;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

pub mod error;
pub mod ingest;
pub mod routes;
pub mod settings;

pub use error::ApiError;
pub use ingest::{ingest_batch, load_processed, process_raw_dir, IngestMode, IngestReport};
pub use settings::Settings;

use storage::{ProcessedFiles, Repository};

/// Application state shared across handlers
pub struct AppState {
    /// Per-plant column mappings, fixed for the life of the process
    pub mappings: Arc<MappingTable>,
    /// Normalized records by plant
    pub repository: Repository,
    /// Output directory for `<plant>_clean.csv`; `None` keeps data in memory only
    pub processed: Option<ProcessedFiles>,
    /// Uploaded exports are copied here when set
    pub raw_dir: Option<PathBuf>,
    /// Renders `/metrics` when a recorder is installed
    pub prometheus: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// In-memory state for the given mappings
    pub fn new(mappings: MappingTable) -> Self {
        Self {
            mappings: Arc::new(mappings),
            repository: Repository::new(),
            processed: None,
            raw_dir: None,
            prometheus: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_processed(mut self, processed: ProcessedFiles) -> Self {
        self.processed = Some(processed);
        self
    }

    pub fn with_raw_dir(mut self, raw_dir: impl Into<PathBuf>) -> Self {
        self.raw_dir = Some(raw_dir.into());
        self
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub plants_configured: usize,
    pub plants_with_data: usize,
    pub record_count: usize,
}

/// Create the application router
pub fn create_router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/plants", get(routes::plants::list_plants))
        .route(
            "/api/v1/plants/:plant_id/batches",
            post(routes::plants::submit_batch),
        )
        .route(
            "/api/v1/plants/:plant_id/entries",
            post(routes::plants::submit_entry),
        )
        .route(
            "/api/v1/uploads/:file_name",
            post(routes::uploads::upload_export),
        )
        .route("/api/v1/dashboard/summary", get(routes::dashboard::get_summary))
        .route("/api/v1/dashboard/trends", get(routes::dashboard::get_trends))
        .route(
            "/api/v1/dashboard/breakdown",
            get(routes::dashboard::get_breakdown),
        )
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        plants_configured: state.mappings.len(),
        plants_with_data: state.repository.plants().len(),
        record_count: state.repository.record_count(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging at `level`, as JSON lines when `json` is set
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let level: Level = level
        .parse()
        .map_err(|_| anyhow!("Invalid log level '{level}'"))?;

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to set tracing subscriber: {e}"))
}

/// Build the shared state from settings: mappings, processed data and raw exports
pub fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let mappings = MappingTable::load(&settings.mapping_path)
        .with_context(|| format!("loading mapping {}", settings.mapping_path.display()))?;
    let processed = ProcessedFiles::open(&settings.processed_data_dir)?;

    let state = AppState::new(mappings)
        .with_processed(processed)
        .with_raw_dir(&settings.raw_data_dir);

    load_processed(&state)?;
    if settings.process_on_startup {
        process_raw_dir(&state, &settings.raw_data_dir)?;
    }
    Ok(state)
}

/// Run the server
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;
    let state = build_state(&settings)?.with_prometheus(handle);

    info!(
        "{} plants configured, {} records loaded",
        state.mappings.len(),
        state.repository.record_count()
    );

    let app = create_router(Arc::new(RwLock::new(state)));

    info!("Starting API server on {}", settings.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
