// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ExtractRequest type for POST /extract

use crate::api::ApiError;
use crate::keywords::NgramRange;
use serde::{Deserialize, Serialize};

/// Request body for POST /extract
///
/// # Fields
/// - `doc`: Text to extract keywords from (required, may be empty)
/// - `top_n`: Number of keywords to return (default: 10)
/// - `min_ngram` / `max_ngram`: Words per candidate (default: 1..=1)
///
/// # Example
/// ```json
/// {
///   "doc": "Ракообразные в панцире или без панциря.",
///   "top_n": 5,
///   "min_ngram": 1,
///   "max_ngram": 1
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub doc: String,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_ngram")]
    pub min_ngram: usize,

    #[serde(default = "default_ngram")]
    pub max_ngram: usize,
}

fn default_top_n() -> usize {
    10
}

fn default_ngram() -> usize {
    1
}

impl ExtractRequest {
    /// Validates the request against the configured limits
    ///
    /// # Validation Rules
    /// 1. **top_n**: 1..=top_n_max (422)
    /// 2. **min_ngram / max_ngram**: 1..=max_ngram_limit (422)
    /// 3. **min_ngram <= max_ngram** (400)
    ///
    /// Returns the checked n-gram range on success.
    pub fn validate(
        &self,
        top_n_max: usize,
        max_ngram_limit: usize,
    ) -> Result<NgramRange, ApiError> {
        if self.top_n == 0 {
            return Err(ApiError::ValidationError {
                field: "top_n".to_string(),
                message: "top_n must be at least 1".to_string(),
            });
        }

        if self.top_n > top_n_max {
            return Err(ApiError::ValidationError {
                field: "top_n".to_string(),
                message: format!(
                    "top_n cannot exceed {} (got {})",
                    top_n_max, self.top_n
                ),
            });
        }

        for (field, value) in [("min_ngram", self.min_ngram), ("max_ngram", self.max_ngram)] {
            if value == 0 {
                return Err(ApiError::ValidationError {
                    field: field.to_string(),
                    message: format!("{} must be at least 1", field),
                });
            }
            if value > max_ngram_limit {
                return Err(ApiError::ValidationError {
                    field: field.to_string(),
                    message: format!(
                        "{} cannot exceed {} (got {})",
                        field, max_ngram_limit, value
                    ),
                });
            }
        }

        Ok(NgramRange::new(self.min_ngram, self.max_ngram)?)
    }
}
