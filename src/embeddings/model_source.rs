// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model file resolution
//!
//! Model files come either from a local directory (offline deployments,
//! tests) or from the HuggingFace Hub, where `hf-hub` downloads them into
//! its cache (`HF_HOME`) on first use.

use super::ModelFiles;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

const TOKENIZER_FILE: &str = "tokenizer.json";

/// Where the model files should be looked up
#[derive(Debug, Clone)]
pub struct ModelSourceConfig {
    /// Hub repository id, e.g. "sberbank-ai/sbert_large_nlu_ru"
    pub model_name: String,
    /// Local directory; takes precedence over the Hub when set
    pub model_dir: Option<PathBuf>,
    /// Path of the ONNX weights inside the Hub repository
    pub onnx_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local(PathBuf),
    Hub { repo_id: String, onnx_file: String },
}

impl ModelSource {
    pub fn from_config(config: &ModelSourceConfig) -> Self {
        match &config.model_dir {
            Some(dir) => ModelSource::Local(dir.clone()),
            None => ModelSource::Hub {
                repo_id: config.model_name.clone(),
                onnx_file: config.onnx_file.clone(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ModelSource::Local(dir) => format!("local directory {}", dir.display()),
            ModelSource::Hub { repo_id, onnx_file } => {
                format!("HuggingFace Hub {} ({})", repo_id, onnx_file)
            }
        }
    }

    /// Returns paths to the model and tokenizer, downloading them if needed
    pub async fn resolve(&self) -> Result<ModelFiles> {
        match self {
            ModelSource::Local(dir) => resolve_local(dir),
            ModelSource::Hub { repo_id, onnx_file } => resolve_hub(repo_id, onnx_file).await,
        }
    }
}

/// Accepts both flat exports (`model.onnx` next to `tokenizer.json`) and the
/// Hub layout (`onnx/model.onnx`).
fn resolve_local(dir: &Path) -> Result<ModelFiles> {
    if !dir.is_dir() {
        anyhow::bail!("Model directory not found: {}", dir.display());
    }

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if !tokenizer_path.is_file() {
        anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
    }

    let model_path = ["model.onnx", "onnx/model.onnx"]
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
        .with_context(|| format!("No model.onnx found under {}", dir.display()))?;

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
    })
}

async fn resolve_hub(repo_id: &str, onnx_file: &str) -> Result<ModelFiles> {
    info!("Fetching {} from HuggingFace Hub", repo_id);

    let api = hf_hub::api::tokio::ApiBuilder::new()
        .with_progress(false)
        .build()
        .context("Failed to initialize HuggingFace Hub client")?;
    let repo = api.model(repo_id.to_string());

    let tokenizer_path = repo
        .get(TOKENIZER_FILE)
        .await
        .with_context(|| format!("Failed to download {} from {}", TOKENIZER_FILE, repo_id))?;
    let model_path = repo
        .get(onnx_file)
        .await
        .with_context(|| format!("Failed to download {} from {}", onnx_file, repo_id))?;

    info!("Model files cached at {}", model_path.display());

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
    })
}
