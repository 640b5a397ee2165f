// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use keyword_stem_service::{
    api::{start_server, AppState},
    config::ServiceConfig,
    loader::{spawn_loader, LoaderState},
    version,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::parse();
    config.validate()?;
    let addr = config.bind_addr()?;

    info!("🚀 Starting keyword stem service {}", version::get_version_string());
    info!("Model: {}", config.model_name);
    if config.model_dir.is_none() {
        info!(
            "MODEL_DIR not set, fetching {} from the Hub; set MODEL_DIR if the repository has no ONNX export",
            config.onnx_file
        );
    }

    // Loader state is created before the server so /status answers at 0%
    let loader = Arc::new(LoaderState::new());
    let factory = Arc::new(config.backend_factory());
    let _loader_task = spawn_loader(loader.clone(), factory);

    info!("Endpoints:");
    info!("  Health:  GET  http://{}/health", addr);
    info!("  Status:  GET  http://{}/status", addr);
    info!("  Extract: POST http://{}/extract", addr);

    let state = AppState::new(loader, config.top_n_max).with_max_ngram(config.max_ngram);
    start_server(state, addr).await
}
