// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory search backend.
//!
//! Stores documents per index in `BTreeMap`s behind a tokio `RwLock` and
//! answers with the same response shapes as the REST API. Queries are not
//! evaluated: `search` returns every document in the index as a hit and
//! records the body it was given, which is what façade tests need.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

use crate::backend::SearchBackend;
use crate::error::{IndexError, Result};

#[derive(Debug, Default)]
struct StoredIndex {
    mapping: Option<Value>,
    documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, StoredIndex>,
    searches: Vec<(String, Value)>,
    next_id: u64,
}

/// A [`SearchBackend`] that keeps everything in process memory.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored in `index`.
    pub async fn len(&self, index: &str) -> usize {
        self.state
            .read()
            .await
            .indices
            .get(index)
            .map_or(0, |i| i.documents.len())
    }

    /// A stored document by id.
    pub async fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .indices
            .get(index)
            .and_then(|i| i.documents.get(id).cloned())
    }

    /// Every `(index, body)` pair passed to `search`, oldest first.
    ///
    /// The log grows with each search until [`clear_searches`] is called.
    ///
    /// [`clear_searches`]: MemoryBackend::clear_searches
    pub async fn searches(&self) -> Vec<(String, Value)> {
        self.state.read().await.searches.clone()
    }

    /// Forget recorded search bodies. Stored documents are kept.
    pub async fn clear_searches(&self) {
        self.state.write().await.searches.clear();
    }
}

fn missing_index(index: &str) -> IndexError {
    IndexError::NotFound(format!("no such index [{index}]"))
}

fn write_response(index: &str, id: &str, result: &str) -> Value {
    json!({"_index": index, "_id": id, "result": result})
}

fn document_object(document: &Value) -> Result<&Map<String, Value>> {
    document.as_object().ok_or_else(|| IndexError::Server {
        status: 400,
        message: "document must be a JSON object".to_string(),
    })
}

impl State {
    fn index_mut(&mut self, index: &str) -> Result<&mut StoredIndex> {
        self.indices.get_mut(index).ok_or_else(|| missing_index(index))
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    /// Indexing into a missing index creates it, as the engine does.
    fn put(&mut self, index: &str, id: Option<&str>, document: &Value) -> Result<Value> {
        document_object(document)?;
        let id = match id {
            Some(id) => id.to_string(),
            None => self.allocate_id(),
        };
        let stored = self.indices.entry(index.to_string()).or_default();
        let result = match stored.documents.insert(id.clone(), document.clone()) {
            Some(_) => "updated",
            None => "created",
        };
        Ok(write_response(index, &id, result))
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let mut state = self.state.write().await;
        state.searches.push((index.to_string(), body.clone()));
        let stored = state.indices.get(index).ok_or_else(|| missing_index(index))?;
        let hits: Vec<Value> = stored
            .documents
            .iter()
            .map(|(id, source)| json!({"_index": index, "_id": id, "_score": 1.0, "_source": source}))
            .collect();
        Ok(json!({
            "took": 0,
            "timed_out": false,
            "hits": {"total": {"value": hits.len(), "relation": "eq"}, "hits": hits}
        }))
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        document: &Value,
        _refresh: bool,
    ) -> Result<Value> {
        self.state.write().await.put(index, id, document)
    }

    async fn bulk(&self, operations: &[Value], _refresh: bool) -> Result<Value> {
        let mut state = self.state.write().await;
        let mut items = Vec::new();
        let mut errors = false;

        for pair in operations.chunks(2) {
            let (action, source) = match pair {
                [action, source] => (action, source),
                _ => {
                    return Err(IndexError::Server {
                        status: 400,
                        message: "bulk body must end with a newline-terminated source".to_string(),
                    })
                }
            };
            let target = action
                .get("index")
                .and_then(|meta| meta.get("_index"))
                .and_then(Value::as_str);
            let item = match target {
                Some(index) => {
                    let id = action["index"].get("_id").and_then(Value::as_str);
                    match state.put(index, id, source) {
                        Ok(response) => json!({"index": response}),
                        Err(e) => {
                            errors = true;
                            json!({"index": {"_index": index, "error": e.to_string()}})
                        }
                    }
                }
                None => {
                    errors = true;
                    json!({"index": {"error": "unsupported bulk action"}})
                }
            };
            items.push(item);
        }

        Ok(json!({"took": 0, "errors": errors, "items": items}))
    }

    async fn update(&self, index: &str, id: &str, body: &Value, _refresh: bool) -> Result<Value> {
        let mut state = self.state.write().await;
        let patch = body.get("doc").map(document_object).transpose()?;
        let upsert = body
            .get("doc_as_upsert")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let stored = state.index_mut(index)?;
        if !stored.documents.contains_key(id) {
            return match patch {
                Some(patch) if upsert => {
                    stored
                        .documents
                        .insert(id.to_string(), Value::Object(patch.clone()));
                    Ok(write_response(index, id, "created"))
                }
                _ => Err(IndexError::NotFound(format!("[{id}]: document missing"))),
            };
        }

        let result = match (stored.documents.get_mut(id), patch) {
            (Some(Value::Object(existing)), Some(patch)) => {
                let before = existing.clone();
                for (key, value) in patch {
                    existing.insert(key.clone(), value.clone());
                }
                if *existing == before {
                    "noop"
                } else {
                    "updated"
                }
            }
            _ => "noop",
        };
        Ok(write_response(index, id, result))
    }

    async fn delete(&self, index: &str, id: &str, _refresh: bool) -> Result<Value> {
        let mut state = self.state.write().await;
        let stored = state.index_mut(index)?;
        let result = match stored.documents.remove(id) {
            Some(_) => "deleted",
            None => "not_found",
        };
        Ok(write_response(index, id, result))
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.state.read().await.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, mapping: Option<&Value>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.indices.contains_key(index) {
            return Err(IndexError::Server {
                status: 400,
                message: format!("index [{index}] already exists"),
            });
        }
        state.indices.insert(
            index.to_string(),
            StoredIndex {
                mapping: mapping.cloned(),
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.state
            .write()
            .await
            .indices
            .remove(index)
            .map(|_| ())
            .ok_or_else(|| missing_index(index))
    }

    async fn get_mapping(&self, index: &str) -> Result<Value> {
        let state = self.state.read().await;
        let stored = state.indices.get(index).ok_or_else(|| missing_index(index))?;
        let mappings = stored
            .mapping
            .as_ref()
            .and_then(|m| m.get("mappings"))
            .cloned()
            .unwrap_or_else(|| json!({}));
        let mut response = Map::new();
        response.insert(index.to_string(), json!({"mappings": mappings}));
        Ok(Value::Object(response))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_overwrite() {
        let backend = MemoryBackend::new();
        let first = backend
            .index_document("docs", Some("1"), &json!({"a": 1}), true)
            .await
            .unwrap();
        assert_eq!(first["result"], json!("created"));
        let second = backend
            .index_document("docs", Some("1"), &json!({"a": 2}), true)
            .await
            .unwrap();
        assert_eq!(second["result"], json!("updated"));
        assert_eq!(backend.len("docs").await, 1);
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let backend = MemoryBackend::new();
        for _ in 0..3 {
            backend
                .index_document("docs", None, &json!({"a": 1}), true)
                .await
                .unwrap();
        }
        assert_eq!(backend.len("docs").await, 3);
    }

    #[tokio::test]
    async fn test_update_noop_and_upsert() {
        let backend = MemoryBackend::new();
        backend.create_index("docs", None).await.unwrap();
        backend
            .index_document("docs", Some("1"), &json!({"a": 1}), true)
            .await
            .unwrap();

        let same = backend
            .update("docs", "1", &json!({"doc": {"a": 1}}), true)
            .await
            .unwrap();
        assert_eq!(same["result"], json!("noop"));

        let upserted = backend
            .update("docs", "2", &json!({"doc": {"b": 1}, "doc_as_upsert": true}), true)
            .await
            .unwrap();
        assert_eq!(upserted["result"], json!("created"));

        assert!(backend
            .update("docs", "3", &json!({"doc": {"b": 1}}), true)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_bulk_reports_item_errors() {
        let backend = MemoryBackend::new();
        let response = backend
            .bulk(
                &[
                    json!({"index": {"_index": "docs"}}),
                    json!({"a": 1}),
                    json!({"index": {"_index": "docs"}}),
                    json!("not a document"),
                ],
                true,
            )
            .await
            .unwrap();
        assert_eq!(response["errors"], json!(true));
        assert_eq!(backend.len("docs").await, 1);
    }

    #[tokio::test]
    async fn test_clear_searches_keeps_documents() {
        let backend = MemoryBackend::new();
        backend
            .index_document("docs", Some("1"), &json!({"a": 1}), true)
            .await
            .unwrap();
        backend.search("docs", &json!({"query": {"match_all": {}}})).await.unwrap();
        backend.search("docs", &json!({"size": 1})).await.unwrap();
        assert_eq!(backend.searches().await.len(), 2);

        backend.clear_searches().await;
        assert!(backend.searches().await.is_empty());
        assert_eq!(backend.len("docs").await, 1);
    }

    #[tokio::test]
    async fn test_mapping_round_trip() {
        let backend = MemoryBackend::new();
        let mapping = json!({"mappings": {"properties": {"a": {"type": "integer"}}}});
        backend.create_index("docs", Some(&mapping)).await.unwrap();
        let got = backend.get_mapping("docs").await.unwrap();
        assert_eq!(got["docs"]["mappings"], mapping["mappings"]);
        assert!(backend.create_index("docs", None).await.is_err());
    }
}
