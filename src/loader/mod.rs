// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Background model loading
//!
//! [`LoaderState`] is the process-wide record of how far initialization has
//! got. The loading task (see [`task`]) is its only writer; request handlers
//! read it concurrently. Progress only moves forward and the extractor is
//! published exactly once.

pub mod stage;
pub mod task;

pub use stage::LoadStage;
pub use task::{run_loader, spawn_loader, BackendFactory, OnnxBackendFactory};

use crate::keywords::{ExtractError, KeywordExtractor};
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to resolve model files: {0:#}")]
    Resolve(#[source] anyhow::Error),

    #[error("failed to build embedding backend: {0:#}")]
    Build(#[source] anyhow::Error),

    #[error("warm-up inference failed: {0}")]
    WarmUp(#[from] ExtractError),

    #[error("loader task aborted: {0}")]
    TaskAborted(String),

    #[error("model is already loaded")]
    AlreadyLoaded,
}

/// Point-in-time view of the loader, as reported by `/status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadStatus {
    pub stage: LoadStage,
    pub percent: u8,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct LoaderState {
    percent: AtomicU8,
    stage: RwLock<LoadStage>,
    error: RwLock<Option<String>>,
    extractor: OnceCell<Arc<KeywordExtractor>>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderState {
    pub fn new() -> Self {
        Self {
            percent: AtomicU8::new(0),
            stage: RwLock::new(LoadStage::NotStarted),
            error: RwLock::new(None),
            extractor: OnceCell::new(),
        }
    }

    /// Loader state that is already READY, for embedding the service
    /// without a background load
    pub fn ready_with(extractor: KeywordExtractor) -> Self {
        let state = Self::new();
        // A fresh state cannot already hold an extractor
        let _ = state.mark_ready(Arc::new(extractor));
        state
    }

    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Acquire)
    }

    pub fn stage(&self) -> LoadStage {
        match self.stage.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn status(&self) -> LoadStatus {
        let error = match self.error.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        LoadStatus {
            stage: self.stage(),
            percent: self.percent(),
            error,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.percent() == 100
    }

    /// The extractor, but only once progress has reached 100
    pub fn extractor(&self) -> Option<Arc<KeywordExtractor>> {
        if !self.is_ready() {
            return None;
        }
        self.extractor.get().cloned()
    }

    /// Moves to `next` unless the loader already finished or failed.
    /// Returns whether the transition happened.
    pub fn enter(&self, next: LoadStage) -> bool {
        if next == LoadStage::Ready || next == LoadStage::Error {
            // Terminal stages go through mark_ready / mark_failed
            return false;
        }

        let mut stage = match self.stage.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if stage.is_terminal() {
            return false;
        }
        *stage = next;
        if let Some(percent) = next.percent() {
            self.percent.fetch_max(percent, Ordering::AcqRel);
        }
        info!("Model loader: {} ({}%)", next, self.percent());
        true
    }

    /// Publishes the extractor and moves to READY
    pub fn mark_ready(&self, extractor: Arc<KeywordExtractor>) -> Result<(), LoadError> {
        let mut stage = match self.stage.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if stage.is_terminal() {
            return Err(LoadError::AlreadyLoaded);
        }
        self.extractor
            .set(extractor)
            .map_err(|_| LoadError::AlreadyLoaded)?;
        *stage = LoadStage::Ready;
        // Published after the extractor so readers that observe 100 find it
        self.percent.store(100, Ordering::Release);
        info!("Model loader: {} (100%)", LoadStage::Ready);
        Ok(())
    }

    /// Records a failed load. Progress stays where it was.
    pub fn mark_failed(&self, message: impl Into<String>) {
        let mut stage = match self.stage.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *stage == LoadStage::Ready {
            return;
        }
        *stage = LoadStage::Error;
        let mut error = match self.error.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *error = Some(message.into());
    }
}
