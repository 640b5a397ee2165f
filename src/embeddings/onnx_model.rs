// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence embedding model
//!
//! Wraps ONNX Runtime and a HuggingFace tokenizer to run a BERT-style
//! sentence transformer export (by default `sberbank-ai/sbert_large_nlu_ru`).
//!
//! Features:
//! - ONNX model loading from disk
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - Tokenization with truncation to the model's max sequence length
//! - Batched inference with per-batch padding
//! - Attention-masked mean pooling over token embeddings
//! - Output dimension discovered from the model at load time

use super::{Embedder, ModelFiles};
use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::sync::{Arc, Mutex};
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// Runtime knobs for [`OnnxEmbeddingModel`]
#[derive(Debug, Clone)]
pub struct OnnxModelOptions {
    /// Tokens kept per text; longer inputs are truncated
    pub max_length: usize,
    /// Texts sent to ONNX Runtime per `run` call
    pub batch_size: usize,
    /// ONNX Runtime intra-op thread count
    pub intra_threads: usize,
}

impl Default for OnnxModelOptions {
    fn default() -> Self {
        Self {
            max_length: 512,
            batch_size: 32,
            intra_threads: 4,
        }
    }
}

/// ONNX-based sentence embedding model
///
/// The session is shared behind `Arc<Mutex<_>>`, so clones are cheap and
/// inference calls are serialized.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    /// Hidden size, probed with a validation inference at load time
    dimension: usize,
    /// Whether the exported graph declares a `token_type_ids` input
    uses_token_type_ids: bool,
    batch_size: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk and validates them with one
    /// inference.
    ///
    /// This is blocking work (graph optimization can take seconds for large
    /// models); call it from `spawn_blocking`.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file is missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The validation inference produces an unexpected output shape
    pub fn load(
        model_name: impl Into<String>,
        files: &ModelFiles,
        options: &OnnxModelOptions,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = files.model_path.as_path();
        let tokenizer_path = files.tokenizer_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }
        if options.batch_size == 0 {
            anyhow::bail!("Batch size must be greater than 0");
        }

        info!("Initializing ONNX embedding model {}", model_name);

        // Try CUDA first, fall back to CPU if unavailable
        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(options.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path);

        let session = match cuda_result {
            Ok(s) => {
                info!("✅ CUDA execution provider initialized");
                s
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {}", e);
                warn!("Falling back to CPU execution provider");
                Session::builder()
                    .context("Failed to create session builder")?
                    .with_execution_providers([CPUExecutionProvider::default().build()])
                    .context("Failed to set CPU execution provider")?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .context("Failed to set optimization level")?
                    .with_intra_threads(options.intra_threads)
                    .context("Failed to set intra threads")?
                    .commit_from_file(model_path)
                    .with_context(|| {
                        format!("Failed to load ONNX model from {}", model_path.display())
                    })?
            }
        };

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        // Padding is done per batch in `run_batch`
        tokenizer.with_padding(None);

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: 0,
            uses_token_type_ids,
            batch_size: options.batch_size,
        };

        let probe = model
            .run_batch(&["validation test".to_string()])
            .context("Validation inference failed")?;
        model.dimension = probe.first().map(Vec::len).unwrap_or(0);
        if model.dimension == 0 {
            anyhow::bail!("Model {} produced an empty embedding", model.model_name);
        }

        info!(
            "✅ ONNX embedding model loaded: {} ({} dimensions, token_type_ids: {})",
            model.model_name, model.dimension, model.uses_token_type_ids
        );

        Ok(model)
    }

    fn encode(&self, text: &str) -> Result<Encoding> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
    }

    /// Runs one padded batch through the session and mean-pools each row
    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = texts
            .iter()
            .map(|text| self.encode(text))
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let rows = texts.len();
        let mut input_ids = Array2::<i64>::zeros((rows, max_len));
        let mut attention_mask = Array2::<i64>::zeros((rows, max_len));
        for (row, encoding) in encodings.iter().enumerate() {
            for (col, (&id, &mask)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .enumerate()
            {
                input_ids[[row, col]] = id as i64;
                attention_mask[[row, col]] = mask as i64;
            }
        }
        let token_type_ids = Array2::<i64>::zeros((rows, max_len));
        let pooling_mask = attention_mask.clone();

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;

        let outputs = if self.uses_token_type_ids {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?,
                "token_type_ids" => Value::from_array(token_type_ids)?
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?
            ])?
        };

        // Use index [0] instead of name since exports disagree on output names
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        match output.ndim() {
            // [batch, seq_len, hidden]: token embeddings, pool them here
            3 => {
                let mut embeddings = Vec::with_capacity(rows);
                for row in 0..rows {
                    let tokens = output
                        .index_axis(Axis(0), row)
                        .into_dimensionality::<ndarray::Ix2>()
                        .context("Unexpected token embedding layout")?;
                    embeddings.push(mean_pool(tokens, pooling_mask.row(row).as_slice()));
                }
                Ok(embeddings)
            }
            // [batch, hidden]: export already pools
            2 => Ok(output
                .axis_iter(Axis(0))
                .map(|row| row.iter().copied().collect())
                .collect()),
            _ => anyhow::bail!(
                "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, hidden])",
                output.shape()
            ),
        }
    }
}

/// Attention-masked mean over the sequence axis
fn mean_pool(tokens: ArrayView2<'_, f32>, mask: Option<&[i64]>) -> Vec<f32> {
    let hidden = tokens.shape()[1];
    let mut pooled = vec![0.0f32; hidden];
    let mut sum_mask = 0.0f32;

    for (i, token) in tokens.axis_iter(Axis(0)).enumerate() {
        let weight = mask.and_then(|m| m.get(i)).copied().unwrap_or(1) as f32;
        if weight == 0.0 {
            continue;
        }
        sum_mask += weight;
        for (acc, value) in pooled.iter_mut().zip(token.iter()) {
            *acc += value * weight;
        }
    }

    for value in &mut pooled {
        *value /= sum_mask.max(1e-9);
    }
    pooled
}

impl Embedder for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            debug!("Embedding batch of {} texts", chunk.len());
            embeddings.extend(self.run_batch(chunk)?);
        }

        for (i, emb) in embeddings.iter().enumerate() {
            if emb.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    i,
                    emb.len(),
                    self.dimension
                );
            }
        }

        Ok(embeddings)
    }
}
