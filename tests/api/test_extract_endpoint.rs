// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /extract endpoint tests
//!
//! These tests verify that the extract endpoint:
//! - Returns ranked `[term, score]` pairs once the model is loaded
//! - Never returns stems while the model is loading (503)
//! - Rejects malformed bodies, out-of-range fields and oversized candidate
//!   vocabularies before the backend runs
//! - Reports backend failures as 500

use crate::common::{body_json, json_request, HashingEmbedder};
use axum::http::{Method, StatusCode};
use keyword_stem_service::{
    api::{create_app, AppState},
    embeddings::Embedder,
    keywords::KeywordExtractor,
    loader::{LoadStage, LoaderState},
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

const SAMPLE_DOC: &str = "Ракообразные живые и копченые";

/// Helper: ready AppState backed by the hashing embedder
fn setup_ready_state() -> (AppState, Arc<HashingEmbedder>) {
    let embedder = Arc::new(HashingEmbedder::new());
    let extractor = KeywordExtractor::new(embedder.clone());
    let state = AppState::new(Arc::new(LoaderState::ready_with(extractor)), 100);
    (state, embedder)
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn model_name(&self) -> &str {
        "broken"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("onnx runtime error")
    }
}

#[cfg(test)]
mod extract_endpoint_tests {
    use super::*;

    // ========== SUCCESS CASES ==========

    #[tokio::test]
    async fn test_extract_sample_document() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let body = format!(
            r#"{{"doc":"{}","top_n":3,"min_ngram":1,"max_ngram":1}}"#,
            SAMPLE_DOC
        );
        let response = app
            .oneshot(json_request(Method::POST, "/extract", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let stems = json["stems"].as_array().expect("stems should be an array");
        assert!(stems.len() <= 3);
        assert!(!stems.is_empty());

        let mut previous = f64::INFINITY;
        for pair in stems {
            let pair = pair.as_array().expect("each stem is a [term, score] pair");
            assert_eq!(pair.len(), 2);
            assert!(pair[0].is_string());
            let score = pair[1].as_f64().unwrap();
            assert!((-1.0..=1.0).contains(&score));
            assert!(score <= previous, "scores must be descending");
            previous = score;
        }
    }

    #[tokio::test]
    async fn test_extract_respects_top_n() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let body = r#"{"doc":"раки живые копченые вареные свежие мороженые","top_n":2,"min_ngram":1,"max_ngram":2}"#;
        let response = app
            .oneshot(json_request(Method::POST, "/extract", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["stems"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_defaults_applied() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        // Only `doc` given: top_n=10, ngram 1..=1
        let response = app
            .oneshot(json_request(Method::POST, "/extract", r#"{"doc":"раки раки живые"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let stems = json["stems"].as_array().unwrap();
        assert_eq!(stems.len(), 2);
        assert_eq!(stems[0][0], "раки");
    }

    #[tokio::test]
    async fn test_extract_empty_doc_returns_empty_list() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let response = app
            .oneshot(json_request(Method::POST, "/extract", r#"{"doc":"","top_n":5}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"stems": []}));
    }

    // ========== NOT READY ==========

    #[tokio::test]
    async fn test_extract_while_loading_returns_503() {
        let loader = Arc::new(LoaderState::new());
        loader.enter(LoadStage::LoadingKwModel);
        let app = create_app(AppState::new(loader, 100));

        let body = format!(r#"{{"doc":"{}","top_n":3}}"#, SAMPLE_DOC);
        let response = app
            .oneshot(json_request(Method::POST, "/extract", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert!(json.get("stems").is_none());
        assert_eq!(json["error_type"], "service_unavailable");
    }

    #[tokio::test]
    async fn test_extract_after_failed_load_returns_503() {
        let loader = Arc::new(LoaderState::new());
        loader.enter(LoadStage::LoadingEmbedder);
        loader.mark_failed("hub unreachable");
        let app = create_app(AppState::new(loader, 100));

        let response = app
            .oneshot(json_request(Method::POST, "/extract", r#"{"doc":"раки"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("failed"));
    }

    // ========== VALIDATION ==========

    #[tokio::test]
    async fn test_min_ngram_greater_than_max_rejected_before_backend() {
        let (state, embedder) = setup_ready_state();
        let app = create_app(state);

        let body = r#"{"doc":"раки живые","top_n":3,"min_ngram":3,"max_ngram":1}"#;
        let response = app
            .oneshot(json_request(Method::POST, "/extract", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error_type"], "invalid_request");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("min_ngram must be <= max_ngram"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_top_n_above_limit_is_unprocessable() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/extract",
                r#"{"doc":"раки","top_n":101}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error_type"], "validation_error");
        assert_eq!(json["details"]["field"], "top_n");
    }

    #[tokio::test]
    async fn test_zero_top_n_is_unprocessable() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let response = app
            .oneshot(json_request(Method::POST, "/extract", r#"{"doc":"раки","top_n":0}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_zero_min_ngram_is_unprocessable() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/extract",
                r#"{"doc":"раки","min_ngram":0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["details"]["field"], "min_ngram");
    }

    #[tokio::test]
    async fn test_oversized_max_ngram_rejected_before_backend() {
        let (state, embedder) = setup_ready_state();
        let app = create_app(state.with_max_ngram(5));

        // 800 distinct words with max_ngram 800 would build ~320k candidates
        let words: Vec<String> = (0..800).map(|i| format!("слово{}", i)).collect();
        let body = serde_json::json!({
            "doc": words.join(" "),
            "top_n": 3,
            "min_ngram": 1,
            "max_ngram": 800,
        })
        .to_string();
        let response = app
            .oneshot(json_request(Method::POST, "/extract", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["details"]["field"], "max_ngram");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_too_many_candidates_rejected_before_backend() {
        let embedder = Arc::new(HashingEmbedder::new());
        let extractor = KeywordExtractor::new(embedder.clone()).with_max_candidates(50);
        let state = AppState::new(Arc::new(LoaderState::ready_with(extractor)), 100);
        let app = create_app(state);

        let words: Vec<String> = (0..60).map(|i| format!("слово{}", i)).collect();
        let body = serde_json::json!({ "doc": words.join(" ") }).to_string();
        let response = app
            .oneshot(json_request(Method::POST, "/extract", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error_type"], "validation_error");
        assert_eq!(json["details"]["field"], "doc");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_doc_is_unprocessable() {
        let (state, embedder) = setup_ready_state();
        let app = create_app(state);

        let response = app
            .oneshot(json_request(Method::POST, "/extract", r#"{"top_n":3}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response).await["error_type"],
            "unprocessable_entity"
        );
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_negative_top_n_is_unprocessable() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/extract",
                r#"{"doc":"раки","top_n":-1}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_broken_json_is_bad_request() {
        let (state, _) = setup_ready_state();
        let app = create_app(state);

        let response = app
            .oneshot(json_request(Method::POST, "/extract", r#"{"doc": "#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error_type"], "invalid_request");
    }

    // ========== BACKEND FAILURE ==========

    #[tokio::test]
    async fn test_backend_failure_is_internal_error() {
        let extractor = KeywordExtractor::new(Arc::new(BrokenEmbedder));
        let state = AppState::new(Arc::new(LoaderState::ready_with(extractor)), 100);
        let app = create_app(state);

        let response = app
            .oneshot(json_request(Method::POST, "/extract", r#"{"doc":"раки живые"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error_type"], "internal_error");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("onnx runtime error"));
    }
}
