// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Candidate keyphrase generation
//!
//! Mirrors a bag-of-n-grams vocabulary: the document is lowercased, split
//! into word tokens of at least two characters, and every run of `n`
//! consecutive tokens (for each `n` in the range) becomes a candidate.

use super::ExtractError;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Unicode word tokens of two or more characters
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Vocabulary size above which a document is refused
pub const DEFAULT_MAX_CANDIDATES: usize = 10_000;

fn token_regex() -> &'static Regex {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    TOKEN_REGEX.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

/// Inclusive bounds on the number of words per candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramRange {
    min: usize,
    max: usize,
}

impl NgramRange {
    pub fn new(min: usize, max: usize) -> Result<Self, ExtractError> {
        if min == 0 || max == 0 {
            return Err(ExtractError::ZeroNgram);
        }
        if min > max {
            return Err(ExtractError::InvalidNgramRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self { min: 1, max: 1 }
    }
}

/// Lowercases `doc` and splits it into word tokens
pub fn tokenize(doc: &str) -> Vec<String> {
    let lowered = doc.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Returns the sorted, de-duplicated candidate vocabulary of `doc`.
///
/// Fails as soon as the vocabulary would hold more than `max_candidates`
/// entries, so memory stays bounded whatever the document and range.
pub fn candidates(
    doc: &str,
    range: NgramRange,
    max_candidates: usize,
) -> Result<Vec<String>, ExtractError> {
    let tokens = tokenize(doc);
    let mut vocabulary = BTreeSet::new();

    for n in range.min..=range.max.min(tokens.len()) {
        for window in tokens.windows(n) {
            vocabulary.insert(window.join(" "));
            if vocabulary.len() > max_candidates {
                return Err(ExtractError::TooManyCandidates {
                    limit: max_candidates,
                });
            }
        }
    }

    Ok(vocabulary.into_iter().collect())
}
