// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for the index façade

use std::sync::Mutex;

use async_trait::async_trait;
use opal_index::{Index, IndexConfig, IndexError, MemoryBackend, Result, SearchBackend, SearchInput};
use opal_query::{field, Limit, Scorer};
use serde_json::{json, Value};

/// Backend answering every write with a fixed `result` and recording calls.
struct ScriptedBackend {
    result: &'static str,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(result: &'static str) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        self.record(format!("search {index} {body}"));
        Ok(json!({"hits": {"hits": [{"_id": "1", "_source": {"a": 1}}]}}))
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        _document: &Value,
        refresh: bool,
    ) -> Result<Value> {
        self.record(format!("index {index} {id:?} refresh={refresh}"));
        Ok(json!({"result": self.result}))
    }

    async fn bulk(&self, operations: &[Value], _refresh: bool) -> Result<Value> {
        self.record(format!("bulk {}", operations.len()));
        Ok(json!({"errors": self.result != "created", "items": []}))
    }

    async fn update(&self, index: &str, id: &str, body: &Value, _refresh: bool) -> Result<Value> {
        self.record(format!("update {index} {id} {body}"));
        Ok(json!({"result": self.result}))
    }

    async fn delete(&self, index: &str, id: &str, _refresh: bool) -> Result<Value> {
        self.record(format!("delete {index} {id}"));
        Ok(json!({"result": self.result}))
    }

    async fn index_exists(&self, _index: &str) -> Result<bool> {
        Ok(true)
    }

    async fn create_index(&self, index: &str, _mapping: Option<&Value>) -> Result<()> {
        self.record(format!("create {index}"));
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.record(format!("drop {index}"));
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> Result<Value> {
        Ok(json!({index: {"mappings": {}}}))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

async fn scripted(result: &'static str) -> Index<ScriptedBackend> {
    Index::open(ScriptedBackend::new(result), IndexConfig::new("docs"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_open_creates_missing_index() {
    let backend = MemoryBackend::new();
    let mapping = json!({"mappings": {"properties": {"value": {"type": "integer"}}}});
    let index = Index::open(backend.clone(), IndexConfig::new("docs").with_mapping(mapping))
        .await
        .unwrap();
    assert!(backend.index_exists("docs").await.unwrap());
    assert_eq!(
        index.mapping().await.unwrap()["docs"]["mappings"]["properties"]["value"]["type"],
        json!("integer")
    );
}

#[tokio::test]
async fn test_open_rejects_mapping_for_existing_index() {
    let backend = MemoryBackend::new();
    backend.create_index("docs", None).await.unwrap();
    let err = Index::open(backend, IndexConfig::new("docs").with_mapping(json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Config(_)));
}

#[tokio::test]
async fn test_find_forwards_body_and_returns_hits() {
    let backend = MemoryBackend::new();
    let index = Index::open(backend.clone(), IndexConfig::new("docs")).await.unwrap();
    index.insert_one(&json!({"value": 3}), Some("a")).await.unwrap();

    let query = (field("value").gt(2) & Scorer::new("doc['value'].value")) & Limit::new(5).unwrap();
    let hits = index.find(query.clone()).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["_source"], json!({"value": 3}));

    let searches = backend.searches().await;
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].0, "docs");
    assert_eq!(searches[0].1, query.to_body());
}

#[tokio::test]
async fn test_find_raw_returns_whole_response() {
    let index = scripted("created").await;
    let raw = index.find_raw(SearchInput::None).await.unwrap();
    assert!(raw["hits"]["hits"].is_array());
    assert!(index.backend().calls()[0].starts_with("search docs"));
}

#[tokio::test]
async fn test_empty_searches_are_equivalent() {
    let index = scripted("created").await;
    let none = index.canonical(SearchInput::None).unwrap();
    let empty = index.canonical(json!({})).unwrap();
    let explicit = index.canonical(index.match_all()).unwrap();
    assert_eq!(none, "match_all()");
    assert_eq!(none, empty);
    assert_eq!(none, explicit);
}

#[tokio::test]
async fn test_filter_and_condition_canonicalize_alike() {
    let index = scripted("created").await;
    let from_filter = index
        .canonical(json!({"$or": [{"value": {"$gt": 2, "$lt": 4}}, {"name": "x"}]}))
        .unwrap();
    let value = index.field("value");
    let built = (value.gt(2) & value.lt(4)) | opal_query::Condition::term("name", "x");
    assert_eq!(from_filter, index.canonical(built).unwrap());
}

#[tokio::test]
async fn test_insert_one_validation() {
    let index = scripted("created").await;
    for bad in [json!({}), json!([1, 2]), json!("doc"), Value::Null] {
        let err = index.insert_one(&bad, None).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidOperation { .. }));
    }
    // Nothing reached the backend.
    assert!(index.backend().calls().is_empty());

    index.insert_one(&json!({"a": 1}), Some("1")).await.unwrap();
    assert_eq!(index.backend().calls(), vec!["index docs Some(\"1\") refresh=true"]);
}

#[tokio::test]
async fn test_insert_one_unexpected_result() {
    let index = scripted("noop").await;
    let err = index.insert_one(&json!({"a": 1}), None).await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to insert document"));
}

#[tokio::test]
async fn test_insert_many() {
    let backend = MemoryBackend::new();
    let index = Index::open(backend.clone(), IndexConfig::new("docs")).await.unwrap();
    index
        .insert_many(&[json!({"a": 1}), json!({"a": 2}), json!({"a": 3})])
        .await
        .unwrap();
    assert_eq!(backend.len("docs").await, 3);

    let err = index
        .insert_many(&[json!({"a": 1}), json!(2)])
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidOperation { .. }));

    index.insert_many(&[]).await.unwrap();
    assert_eq!(backend.len("docs").await, 3);
}

#[tokio::test]
async fn test_insert_many_bulk_errors() {
    let index = scripted("failed").await;
    let err = index.insert_many(&[json!({"a": 1})]).await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to insert documents via bulk"));
    assert_eq!(index.backend().calls(), vec!["bulk 2"]);
}

#[tokio::test]
async fn test_update_one() {
    let backend = MemoryBackend::new();
    let index = Index::open(backend.clone(), IndexConfig::new("docs")).await.unwrap();
    index.insert_one(&json!({"a": 1, "b": 1}), Some("x")).await.unwrap();

    index.update_one("x", &json!({"b": 2}), false).await.unwrap();
    assert_eq!(
        backend.document("docs", "x").await,
        Some(json!({"a": 1, "b": 2}))
    );

    // A no-op update is only a warning.
    index.update_one("x", &json!({"b": 2}), false).await.unwrap();

    index.update_one("y", &json!({"c": 1}), true).await.unwrap();
    assert_eq!(backend.document("docs", "y").await, Some(json!({"c": 1})));

    let err = index.update_one("x", &json!({}), false).await.unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Update document must be provided for update_one"));
}

#[tokio::test]
async fn test_update_one_sends_doc_and_upsert_flag() {
    let index = scripted("updated").await;
    index.update_one("7", &json!({"a": 1}), true).await.unwrap();
    let calls = index.backend().calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(r#""doc":{"a":1}"#));
    assert!(calls[0].contains(r#""doc_as_upsert":true"#));
}

#[tokio::test]
async fn test_delete_one() {
    let backend = MemoryBackend::new();
    let index = Index::open(backend.clone(), IndexConfig::new("docs")).await.unwrap();
    index.insert_one(&json!({"a": 1}), Some("x")).await.unwrap();

    index.delete_one("x").await.unwrap();
    assert_eq!(backend.len("docs").await, 0);

    let err = index.delete_one("x").await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to delete document with ID x"));
}

#[tokio::test]
async fn test_delete_index_and_recreate() {
    let backend = MemoryBackend::new();
    let index = Index::open(backend.clone(), IndexConfig::new("docs")).await.unwrap();
    index.insert_one(&json!({"a": 1}), None).await.unwrap();

    index.delete_index(true).await.unwrap();
    assert!(backend.index_exists("docs").await.unwrap());
    assert_eq!(backend.len("docs").await, 0);

    index.delete_index(false).await.unwrap();
    assert!(!backend.index_exists("docs").await.unwrap());
}

#[tokio::test]
async fn test_open_existing_does_not_create() {
    let index = scripted("created").await;
    assert_eq!(index.name(), "docs");
    assert!(index.backend().calls().is_empty());
}
