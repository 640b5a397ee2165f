// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::{Method, Uri},
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{extract_handler, health_handler, status_handler, ApiError};
use crate::config::{DEFAULT_MAX_NGRAM, DEFAULT_TOP_N_MAX};
use crate::loader::LoaderState;

#[derive(Clone)]
pub struct AppState {
    /// Shared with the loading task, which is its only writer
    pub loader: Arc<LoaderState>,
    /// Upper bound for `top_n` in extract requests
    pub top_n_max: usize,
    /// Upper bound for `min_ngram` / `max_ngram` in extract requests
    pub max_ngram: usize,
}

impl AppState {
    pub fn new(loader: Arc<LoaderState>, top_n_max: usize) -> Self {
        Self {
            loader,
            top_n_max,
            max_ngram: DEFAULT_MAX_NGRAM,
        }
    }

    pub fn with_max_ngram(mut self, max_ngram: usize) -> Self {
        self.max_ngram = max_ngram;
        self
    }

    /// State with a fresh, not-yet-loaded loader
    pub fn new_for_test() -> Self {
        Self::new(Arc::new(LoaderState::new()), DEFAULT_TOP_N_MAX)
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler).fallback(method_not_allowed))
        .route("/status", get(status_handler).fallback(method_not_allowed))
        .route("/extract", post(extract_handler).fallback(method_not_allowed))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn fallback_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{} is not supported on {}", method, uri.path()))
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
