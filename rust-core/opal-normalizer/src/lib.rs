// SPDX-License-Identifier: PMPL-1.0-or-later
//! OPAL Normalizer
//!
//! Canonical normal form for query bodies. Two bodies are logically
//! equivalent under the rewrite rules here exactly when their canonical
//! strings are equal:
//!
//! ```
//! use serde_json::json;
//!
//! let a = json!({"bool": {"should": [{"term": {"a": 1}}, {"term": {"b": 2}}]}});
//! let b = json!({"query": {"bool": {"should": [{"term": {"b": 2}}, {"term": {"a": 1}}]}}});
//! assert!(opal_normalizer::equivalent(&a, &b)?);
//! assert_eq!(opal_normalizer::canonicalize(&a)?, "or(a == 1, b == 2)");
//! # Ok::<(), opal_normalizer::NormalizeError>(())
//! ```
//!
//! The pipeline is `parse_body` → `normalize` → `reduce_double_negation` →
//! `flatten` → `render`; each stage is public for inspection.

pub mod ast;
pub mod error;
pub mod parse;
pub mod render;
pub mod rewrite;

use serde_json::Value;
use tracing::{debug, debug_span, trace};

pub use ast::{CompareOp, LogicalOp, Node};
pub use error::NormalizeError;
pub use parse::parse_body;
pub use render::render;
pub use rewrite::{flatten, normalize, reduce_double_negation};

/// Runs the canonicalization pipeline with a tracing span per stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer;

impl Canonicalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse and rewrite a body into its canonical tree.
    pub fn tree(&self, body: &Value) -> Result<Node, NormalizeError> {
        let parsed = debug_span!("parse").in_scope(|| parse_body(body))?;
        trace!(tree = ?parsed, "parsed");

        let normalized = debug_span!("normalize").in_scope(|| normalize(parsed));
        trace!(tree = ?normalized, "normalized");

        let reduced = debug_span!("reduce_double_negation")
            .in_scope(|| reduce_double_negation(normalized));
        trace!(tree = ?reduced, "reduced");

        let flat = debug_span!("flatten").in_scope(|| flatten(reduced));
        debug!(nodes = flat.size(), "canonical tree ready");
        Ok(flat)
    }

    /// Canonical string for a body.
    pub fn canonicalize(&self, body: &Value) -> Result<String, NormalizeError> {
        let tree = self.tree(body)?;
        Ok(debug_span!("render").in_scope(|| render(&tree)))
    }

    /// Whether two bodies share a canonical string.
    pub fn equivalent(&self, a: &Value, b: &Value) -> Result<bool, NormalizeError> {
        let left = self.canonicalize(a)?;
        let right = self.canonicalize(b)?;
        debug!(%left, %right, "comparing canonical forms");
        Ok(left == right)
    }
}

/// Canonical string for a body.
pub fn canonicalize(body: &Value) -> Result<String, NormalizeError> {
    Canonicalizer::new().canonicalize(body)
}

/// Whether two bodies are logically equivalent under the rewrite rules.
pub fn equivalent(a: &Value, b: &Value) -> Result<bool, NormalizeError> {
    Canonicalizer::new().equivalent(a, b)
}
