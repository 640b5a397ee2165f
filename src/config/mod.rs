// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service configuration
//!
//! Every option is a CLI flag with an environment variable fallback, so the
//! service runs unchanged under docker-compose style `.env` files.

use crate::embeddings::{ModelSource, ModelSourceConfig, OnnxModelOptions};
use crate::keywords::DEFAULT_MAX_CANDIDATES;
use crate::loader::OnnxBackendFactory;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_MODEL_NAME: &str = "sberbank-ai/sbert_large_nlu_ru";
pub const DEFAULT_TOP_N_MAX: usize = 100;
pub const DEFAULT_MAX_NGRAM: usize = 5;

/// Keyword Stemming Service
#[derive(Parser, Debug, Clone)]
#[command(name = "keyword-stem-service")]
#[command(version)]
#[command(about = "Extracts keywords from Russian text using sentence embeddings", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// HuggingFace Hub model id
    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_MODEL_NAME)]
    pub model_name: String,

    /// Local directory with model.onnx and tokenizer.json (skips the Hub).
    ///
    /// Required when the Hub repository has no ONNX export at ONNX_FILE;
    /// otherwise loading stops in stage `error` at 10%. Export one with
    /// `optimum-cli export onnx --model <MODEL_NAME> <dir>`.
    #[arg(long, env = "MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Path of the ONNX weights inside the Hub repository (ignored with
    /// MODEL_DIR)
    #[arg(long, env = "ONNX_FILE", default_value = "onnx/model.onnx")]
    pub onnx_file: String,

    /// Largest accepted `top_n`
    #[arg(long, env = "TOP_N_MAX", default_value_t = DEFAULT_TOP_N_MAX)]
    pub top_n_max: usize,

    /// Largest accepted `min_ngram` / `max_ngram`
    #[arg(long, env = "MAX_NGRAM", default_value_t = DEFAULT_MAX_NGRAM)]
    pub max_ngram: usize,

    /// Largest candidate vocabulary a single document may produce
    #[arg(long, env = "MAX_CANDIDATES", default_value_t = DEFAULT_MAX_CANDIDATES)]
    pub max_candidates: usize,

    /// Tokens kept per text before truncation
    #[arg(long, env = "MAX_SEQ_LENGTH", default_value_t = 512)]
    pub max_seq_length: usize,

    /// Candidates embedded per ONNX Runtime call
    #[arg(long, env = "EMBED_BATCH_SIZE", default_value_t = 32)]
    pub batch_size: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", addr, e))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.top_n_max == 0 {
            anyhow::bail!("TOP_N_MAX must be at least 1");
        }
        if self.max_ngram == 0 {
            anyhow::bail!("MAX_NGRAM must be at least 1");
        }
        if self.max_candidates == 0 {
            anyhow::bail!("MAX_CANDIDATES must be at least 1");
        }
        if self.batch_size == 0 {
            anyhow::bail!("EMBED_BATCH_SIZE must be at least 1");
        }
        if self.max_seq_length == 0 {
            anyhow::bail!("MAX_SEQ_LENGTH must be at least 1");
        }
        Ok(())
    }

    pub fn model_source(&self) -> ModelSource {
        ModelSource::from_config(&ModelSourceConfig {
            model_name: self.model_name.clone(),
            model_dir: self.model_dir.clone(),
            onnx_file: self.onnx_file.clone(),
        })
    }

    pub fn onnx_options(&self) -> OnnxModelOptions {
        OnnxModelOptions {
            max_length: self.max_seq_length,
            batch_size: self.batch_size,
            intra_threads: self.intra_threads,
        }
    }

    pub fn backend_factory(&self) -> OnnxBackendFactory {
        OnnxBackendFactory {
            model_name: self.model_name.clone(),
            source: self.model_source(),
            options: self.onnx_options(),
            max_candidates: self.max_candidates,
        }
    }
}
