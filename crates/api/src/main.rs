//! Plant Metrics Server - Main Entry Point
//!
//! Usage: `plant-metrics [settings-file]`

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_file = std::env::args().nth(1);
    let settings = Settings::load(settings_file.as_deref())?;

    init_logging(&settings.log_level, settings.log_json)?;

    info!("=== Plant Metrics v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Mapping: {}", settings.mapping_path.display());

    run_server(settings).await
}
