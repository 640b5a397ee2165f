// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared test doubles
//!
//! `HashingEmbedder` is a deterministic bag-of-words stand-in for the ONNX
//! model: each word bumps one hashed bucket, so a candidate that occurs often
//! in the document lands close to the document embedding.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use keyword_stem_service::{
    embeddings::{Embedder, ModelFiles},
    keywords::tokenize,
    loader::BackendFactory,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub struct HashingEmbedder {
    pub dimension: usize,
    pub calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: 4096,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing-test"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; self.dimension];
                for word in tokenize(text) {
                    let mut hasher = DefaultHasher::new();
                    word.hash(&mut hasher);
                    vector[(hasher.finish() % self.dimension as u64) as usize] += 1.0;
                }
                vector
            })
            .collect())
    }
}

/// What a [`FakeFactory`] should do in each step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryBehavior {
    Succeed,
    FailFetch,
    PanicInFetch,
    FailBuild,
    PanicInBuild,
}

/// Backend factory that never touches the network or ONNX Runtime.
///
/// When `gate` is set, `fetch` waits on it, which lets tests observe the
/// loader mid-flight.
pub struct FakeFactory {
    pub behavior: FactoryBehavior,
    pub gate: Option<Arc<Notify>>,
}

impl FakeFactory {
    pub fn new(behavior: FactoryBehavior) -> Self {
        Self {
            behavior,
            gate: None,
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            behavior: FactoryBehavior::Succeed,
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl BackendFactory for FakeFactory {
    fn describe(&self) -> String {
        "fake backend".to_string()
    }

    async fn fetch(&self) -> anyhow::Result<ModelFiles> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.behavior {
            FactoryBehavior::FailFetch => anyhow::bail!("hub unreachable"),
            FactoryBehavior::PanicInFetch => panic!("hub client crashed"),
            _ => {}
        }
        Ok(ModelFiles {
            model_path: PathBuf::from("model.onnx"),
            tokenizer_path: PathBuf::from("tokenizer.json"),
        })
    }

    fn build(&self, _files: &ModelFiles) -> anyhow::Result<Arc<dyn Embedder>> {
        match self.behavior {
            FactoryBehavior::FailBuild => anyhow::bail!("corrupt onnx graph"),
            FactoryBehavior::PanicInBuild => panic!("runtime crashed"),
            _ => Ok(Arc::new(HashingEmbedder::new())),
        }
    }
}

pub fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
