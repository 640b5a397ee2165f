// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Keyword/keyphrase extraction
//!
//! Candidates are the document's word n-grams; they are ranked by cosine
//! similarity of their sentence embeddings to the document embedding.
//! No stemming or lemmatization happens here.

pub mod candidates;
pub mod extractor;

pub use candidates::{candidates, tokenize, NgramRange, DEFAULT_MAX_CANDIDATES};
pub use extractor::{cosine_similarity, Keyword, KeywordExtractor};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("min_ngram must be <= max_ngram (got {min} > {max})")]
    InvalidNgramRange { min: usize, max: usize },

    #[error("n-gram bounds must be at least 1")]
    ZeroNgram,

    #[error("document yields more than {limit} candidate phrases")]
    TooManyCandidates { limit: usize },

    #[error("embedding backend returned {actual} vectors for {expected} candidates")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("embedding backend failed: {0:#}")]
    Backend(#[from] anyhow::Error),
}
