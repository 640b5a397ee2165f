// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ExtractResponse type for POST /extract

use crate::keywords::Keyword;
use serde::{Deserialize, Serialize};

/// Response body for POST /extract
///
/// `stems` is kept as the field name for compatibility with existing
/// clients; the entries are keywords ranked by embedding similarity, not
/// morphological stems.
///
/// # Example
/// ```json
/// {
///   "stems": [["ракообразные", 0.7412], ["копченые", 0.5121]]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractResponse {
    /// `[term, score]` pairs, best first
    pub stems: Vec<(String, f32)>,
}

impl From<Vec<Keyword>> for ExtractResponse {
    fn from(keywords: Vec<Keyword>) -> Self {
        Self {
            stems: keywords
                .into_iter()
                .map(|keyword| (keyword.term, keyword.score))
                .collect(),
        }
    }
}
