// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named step of the one-time model initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    NotStarted,
    /// Resolving or downloading the model files
    LoadingEmbedder,
    /// Building the ONNX Runtime session and tokenizer
    LoadingKwModel,
    /// Wiring the extractor and running a warm-up inference
    WarmingUp,
    Ready,
    Error,
}

impl LoadStage {
    /// Coarse progress reached when this stage is entered.
    ///
    /// `Error` has no percentage of its own; the loader keeps whatever
    /// value the failed stage had reached.
    pub fn percent(&self) -> Option<u8> {
        match self {
            LoadStage::NotStarted => Some(0),
            LoadStage::LoadingEmbedder => Some(10),
            LoadStage::LoadingKwModel => Some(50),
            LoadStage::WarmingUp => Some(80),
            LoadStage::Ready => Some(100),
            LoadStage::Error => None,
        }
    }

    /// No transition leaves a terminal stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadStage::Ready | LoadStage::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStage::NotStarted => "not_started",
            LoadStage::LoadingEmbedder => "loading_embedder",
            LoadStage::LoadingKwModel => "loading_kw_model",
            LoadStage::WarmingUp => "warming_up",
            LoadStage::Ready => "ready",
            LoadStage::Error => "error",
        }
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
