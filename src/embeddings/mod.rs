// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence embedding backend
//!
//! The keyword extractor only needs "text in, vector out". [`Embedder`] is
//! that seam; [`OnnxEmbeddingModel`] is the production implementation and
//! [`model_source`] knows where its files come from.

pub mod model_source;
pub mod onnx_model;

use anyhow::Result;
use std::path::PathBuf;

pub use model_source::{ModelSource, ModelSourceConfig};
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelOptions};

/// Produces one dense vector per input text.
///
/// Implementations are synchronous and may be CPU heavy; callers run them
/// on the blocking pool.
pub trait Embedder: Send + Sync {
    /// Model identifier, used for logging
    fn model_name(&self) -> &str;

    /// Length of every vector returned by [`Embedder::embed_batch`]
    fn dimension(&self) -> usize;

    /// Embeds every text, preserving input order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedder returned no vector for a single input"))
    }
}

/// Files needed to build an [`OnnxEmbeddingModel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    /// Path to the ONNX weights (model.onnx)
    pub model_path: PathBuf,
    /// Path to the HuggingFace tokenizer definition (tokenizer.json)
    pub tokenizer_path: PathBuf,
}
