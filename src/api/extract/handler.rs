// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /extract HTTP handler

use crate::api::extract::{ExtractRequest, ExtractResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use crate::keywords::ExtractError;
use crate::loader::LoadStage;
use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// POST /extract - rank the document's n-grams by similarity to the document
///
/// # Request
/// - `doc`: Text to extract keywords from (required)
/// - `top_n`: Number of keywords (1..=TOP_N_MAX, defaults to 10)
/// - `min_ngram`, `max_ngram`: Candidate length in words (1..=MAX_NGRAM,
///   defaults to 1)
///
/// # Response
/// - `stems`: `[term, score]` pairs ordered by descending score
///
/// # Errors
/// - 400 Bad Request: broken JSON, `min_ngram > max_ngram`
/// - 422 Unprocessable Entity: missing `doc`, mistyped or out-of-range
///   field, document with too many candidate phrases
/// - 503 Service Unavailable: model not loaded (yet)
/// - 500 Internal Server Error: embedding backend failed
pub async fn extract_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ExtractRequest>, ApiError>,
) -> Result<Json<ExtractResponse>, ApiError> {
    debug!(
        "Extract request: {} chars, top_n {}, ngram {}..={}",
        request.doc.chars().count(),
        request.top_n,
        request.min_ngram,
        request.max_ngram
    );

    // 1. Validate request
    let range = request.validate(state.top_n_max, state.max_ngram).map_err(|e| {
        warn!("Extract validation failed: {}", e);
        e
    })?;

    // 2. Fail fast while the model is loading
    let extractor = state.loader.extractor().ok_or_else(|| {
        let message = match state.loader.stage() {
            LoadStage::Error => "Models failed to load, see /status for details.",
            _ => "Models are loading, please try again later.",
        };
        ApiError::ServiceUnavailable(message.to_string())
    })?;

    // 3. Run extraction on the blocking pool
    let started = Instant::now();
    let top_n = request.top_n;
    let doc = request.doc;
    let keywords = tokio::task::spawn_blocking(move || extractor.extract(&doc, range, top_n))
        .await
        .map_err(|e| {
            error!("Extraction task aborted: {}", e);
            ApiError::InternalError("Extraction task aborted".to_string())
        })?
        .map_err(|e| {
            match &e {
                ExtractError::Backend(_) | ExtractError::EmbeddingCount { .. } => {
                    error!("Keyword extraction failed: {}", e)
                }
                _ => warn!("Extract request refused: {}", e),
            }
            ApiError::from(e)
        })?;

    info!(
        "Extracted {} keywords in {}ms",
        keywords.len(),
        started.elapsed().as_millis()
    );

    Ok(Json(keywords.into()))
}
