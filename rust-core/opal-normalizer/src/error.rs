// SPDX-License-Identifier: PMPL-1.0-or-later
//! Normalizer error types.

use serde_json::Value;
use thiserror::Error;

/// Normalizer errors
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The body contains a clause the canonicalizer cannot model.
    #[error("unsupported query ({reason}): {fragment}")]
    UnsupportedQuery { reason: String, fragment: Value },
}

impl NormalizeError {
    pub(crate) fn unsupported(reason: impl Into<String>, fragment: &Value) -> Self {
        NormalizeError::UnsupportedQuery {
            reason: reason.into(),
            fragment: fragment.clone(),
        }
    }
}
