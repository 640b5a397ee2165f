// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::http_server::AppState;
use crate::loader::LoadStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    /// Loader stage, e.g. "loading_kw_model" or "ready"
    pub status: String,
    /// Coarse load progress, 0..=100
    pub percent: u8,
    /// `{"error": ...}` after a failed load, empty otherwise
    #[serde(default)]
    pub details: HashMap<String, serde_json::Value>,
}

impl From<LoadStatus> for StatusResponse {
    fn from(status: LoadStatus) -> Self {
        let mut details = HashMap::new();
        if let Some(error) = status.error {
            details.insert("error".to_string(), serde_json::Value::String(error));
        }
        Self {
            status: status.stage.to_string(),
            percent: status.percent,
            details,
        }
    }
}

/// GET /health - liveness only, independent of model state
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /status - model load progress
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.loader.status().into())
}
