// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Startup loading task
//!
//! Spawned once from `main`. Network and CPU heavy steps run off the
//! request path so `/health` and `/status` keep answering while the model
//! loads.

use super::{LoadError, LoadStage, LoaderState};
use crate::embeddings::{Embedder, ModelFiles, ModelSource, OnnxEmbeddingModel, OnnxModelOptions};
use crate::keywords::{KeywordExtractor, DEFAULT_MAX_CANDIDATES};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Produces the embedding backend in two steps: an async fetch of the model
/// files and a blocking build of the runtime.
#[async_trait]
pub trait BackendFactory: Send + Sync + 'static {
    /// Human-readable origin of the model, for logs
    fn describe(&self) -> String;

    async fn fetch(&self) -> anyhow::Result<ModelFiles>;

    /// Blocking; called from the blocking pool
    fn build(&self, files: &ModelFiles) -> anyhow::Result<Arc<dyn Embedder>>;

    /// Candidate vocabulary cap for the extractor built on this backend
    fn max_candidates(&self) -> usize {
        DEFAULT_MAX_CANDIDATES
    }
}

/// Builds an [`OnnxEmbeddingModel`] from a local directory or the Hub
#[derive(Debug, Clone)]
pub struct OnnxBackendFactory {
    pub model_name: String,
    pub source: ModelSource,
    pub options: OnnxModelOptions,
    pub max_candidates: usize,
}

#[async_trait]
impl BackendFactory for OnnxBackendFactory {
    fn describe(&self) -> String {
        format!("{} from {}", self.model_name, self.source.describe())
    }

    async fn fetch(&self) -> anyhow::Result<ModelFiles> {
        self.source.resolve().await
    }

    fn build(&self, files: &ModelFiles) -> anyhow::Result<Arc<dyn Embedder>> {
        let model = OnnxEmbeddingModel::load(self.model_name.clone(), files, &self.options)?;
        Ok(Arc::new(model))
    }

    fn max_candidates(&self) -> usize {
        self.max_candidates
    }
}

/// Spawns the loader. Failures, including panics in async steps, are
/// logged and recorded in `state`; the task never takes the process down.
pub fn spawn_loader(state: Arc<LoaderState>, factory: Arc<dyn BackendFactory>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let loader_state = state.clone();
        let outcome = tokio::spawn(async move { run_loader(&loader_state, factory).await })
            .await
            .unwrap_or_else(|e| Err(LoadError::TaskAborted(e.to_string())));

        if let Err(e) = outcome {
            error!("Failed to initialize models: {}", e);
            state.mark_failed(e.to_string());
        }
    })
}

/// Runs every loading stage in order and publishes the extractor
pub async fn run_loader(
    state: &LoaderState,
    factory: Arc<dyn BackendFactory>,
) -> Result<(), LoadError> {
    if state.is_ready() {
        return Err(LoadError::AlreadyLoaded);
    }
    info!("Initializing models: {}", factory.describe());

    state.enter(LoadStage::LoadingEmbedder);
    let files = factory.fetch().await.map_err(LoadError::Resolve)?;

    state.enter(LoadStage::LoadingKwModel);
    let builder = factory.clone();
    let embedder = tokio::task::spawn_blocking(move || builder.build(&files))
        .await
        .map_err(|e| LoadError::TaskAborted(e.to_string()))?
        .map_err(LoadError::Build)?;
    info!(
        "Embedding backend loaded: {} ({} dimensions)",
        embedder.model_name(),
        embedder.dimension()
    );

    state.enter(LoadStage::WarmingUp);
    let extractor = KeywordExtractor::new(embedder).with_max_candidates(factory.max_candidates());
    let probe = extractor.clone();
    tokio::task::spawn_blocking(move || probe.warm_up())
        .await
        .map_err(|e| LoadError::TaskAborted(e.to_string()))??;

    state.mark_ready(Arc::new(extractor))?;
    info!("Service is ready");
    Ok(())
}
