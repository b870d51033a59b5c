// SPDX-License-Identifier: PMPL-1.0-or-later
//! Search backend trait.
//!
//! The index façade never talks to a search engine directly. Every request
//! goes through a [`SearchBackend`], which takes and returns plain JSON in
//! the shapes of the OpenSearch REST API.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// An OpenSearch-compatible engine.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a search body against `index` and return the whole response.
    async fn search(&self, index: &str, body: &Value) -> Result<Value>;

    /// Index one document. With `id == None` the engine assigns one.
    ///
    /// The response carries `result: "created" | "updated"` on success.
    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        document: &Value,
        refresh: bool,
    ) -> Result<Value>;

    /// Send alternating action/source lines to the bulk endpoint.
    ///
    /// The response carries `errors: true` when any item failed.
    async fn bulk(&self, operations: &[Value], refresh: bool) -> Result<Value>;

    /// Partially update a document. `body` is `{"doc": ..., "doc_as_upsert": ...}`.
    async fn update(&self, index: &str, id: &str, body: &Value, refresh: bool) -> Result<Value>;

    /// Delete one document by id.
    async fn delete(&self, index: &str, id: &str, refresh: bool) -> Result<Value>;

    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create `index`, optionally with an explicit mapping body.
    async fn create_index(&self, index: &str, mapping: Option<&Value>) -> Result<()>;

    async fn delete_index(&self, index: &str) -> Result<()>;

    async fn get_mapping(&self, index: &str) -> Result<Value>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}
