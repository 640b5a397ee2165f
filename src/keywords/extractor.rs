// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding-similarity keyword ranking

use super::candidates::{candidates, NgramRange, DEFAULT_MAX_CANDIDATES};
use super::ExtractError;
use crate::embeddings::Embedder;
use std::sync::Arc;
use tracing::debug;

/// A ranked candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub term: String,
    /// Cosine similarity to the document, rounded to 4 decimals
    pub score: f32,
}

/// Ranks a document's n-gram candidates by cosine similarity between their
/// embeddings and the embedding of the whole document.
#[derive(Clone)]
pub struct KeywordExtractor {
    embedder: Arc<dyn Embedder>,
    max_candidates: usize,
}

impl std::fmt::Debug for KeywordExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordExtractor")
            .field("model_name", &self.embedder.model_name())
            .field("max_candidates", &self.max_candidates)
            .finish()
    }
}

impl KeywordExtractor {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    /// Caps the candidate vocabulary; larger documents are refused with
    /// [`ExtractError::TooManyCandidates`] before anything is embedded
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Returns up to `top_n` keywords of `doc`, best first.
    ///
    /// A document without any candidate (empty, or only one-letter words)
    /// yields an empty list.
    pub fn extract(
        &self,
        doc: &str,
        range: NgramRange,
        top_n: usize,
    ) -> Result<Vec<Keyword>, ExtractError> {
        let vocabulary = candidates(doc, range, self.max_candidates)?;
        if vocabulary.is_empty() || top_n == 0 {
            return Ok(vec![]);
        }

        debug!(
            "Scoring {} candidates (ngram {}..={})",
            vocabulary.len(),
            range.min(),
            range.max()
        );

        let doc_embedding = self.embedder.embed(doc)?;
        let candidate_embeddings = self.embedder.embed_batch(&vocabulary)?;
        if candidate_embeddings.len() != vocabulary.len() {
            return Err(ExtractError::EmbeddingCount {
                expected: vocabulary.len(),
                actual: candidate_embeddings.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = candidate_embeddings
            .iter()
            .map(|embedding| cosine_similarity(&doc_embedding, embedding))
            .enumerate()
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(top_n)
            .map(|(index, score)| Keyword {
                term: vocabulary[index].clone(),
                score: round4(score),
            })
            .collect())
    }

    /// Embeds a short probe text so the first real request does not pay
    /// for lazy runtime initialization.
    pub fn warm_up(&self) -> Result<(), ExtractError> {
        self.embedder.embed("прогрев модели")?;
        Ok(())
    }
}

/// Cosine similarity clamped to [-1, 1]; zero when either vector has no
/// magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

fn round4(score: f32) -> f32 {
    ((score as f64 * 10_000.0).round() / 10_000.0) as f32
}
