// SPDX-License-Identifier: PMPL-1.0-or-later
//! Index façade.
//!
//! [`Index`] binds a backend to one index name. It accepts any query input
//! (a filter mapping, a condition, a scored query, a bare limit or scorer,
//! or nothing), turns it into a search body, and wraps the document write
//! calls with the validation the engine itself does not do.

use opal_normalizer::Canonicalizer;
use opal_query::{field, Condition, FieldRef, FilterTranslator, Limit, ScoredQuery, Scorer};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::backend::SearchBackend;
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};

/// Anything that can be turned into a search body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchInput {
    /// Every document.
    #[default]
    None,
    /// A filter mapping, translated with the index's translator settings.
    Filter(Value),
    Condition(Condition),
    Scored(ScoredQuery),
    /// Every document, capped.
    Limit(Limit),
    /// Every document, scored.
    Scorer(Scorer),
}

impl From<Value> for SearchInput {
    fn from(filter: Value) -> Self {
        SearchInput::Filter(filter)
    }
}

impl From<Option<Value>> for SearchInput {
    fn from(filter: Option<Value>) -> Self {
        filter.map_or(SearchInput::None, SearchInput::Filter)
    }
}

impl From<Condition> for SearchInput {
    fn from(condition: Condition) -> Self {
        SearchInput::Condition(condition)
    }
}

impl From<ScoredQuery> for SearchInput {
    fn from(query: ScoredQuery) -> Self {
        SearchInput::Scored(query)
    }
}

impl From<Limit> for SearchInput {
    fn from(limit: Limit) -> Self {
        SearchInput::Limit(limit)
    }
}

impl From<Scorer> for SearchInput {
    fn from(scorer: Scorer) -> Self {
        SearchInput::Scorer(scorer)
    }
}

/// A single index reached through a [`SearchBackend`].
#[derive(Debug)]
pub struct Index<B> {
    backend: B,
    config: IndexConfig,
    translator: FilterTranslator,
}

impl<B: SearchBackend> Index<B> {
    /// Bind to `config.name`, creating the index if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] if the index already exists and the
    /// configuration carries a mapping, since the mapping would be ignored.
    pub async fn open(backend: B, config: IndexConfig) -> Result<Self> {
        let exists = backend.index_exists(&config.name).await?;
        match (exists, &config.mapping) {
            (true, None) => {
                debug!(index = %config.name, backend = backend.name(), "opened existing index");
            }
            (true, Some(_)) => {
                return Err(IndexError::Config(format!(
                    "Index '{}' already exists, but an index mapping is provided. \
                     Delete the index first to recreate it or drop the mapping.",
                    config.name
                )));
            }
            (false, mapping) => {
                backend.create_index(&config.name, mapping.as_ref()).await?;
                debug!(index = %config.name, backend = backend.name(), "created index");
            }
        }

        let translator = FilterTranslator::new(config.translator.clone());
        Ok(Self {
            backend,
            config,
            translator,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The engine's mapping response for this index.
    pub async fn mapping(&self) -> Result<Value> {
        self.backend.get_mapping(&self.config.name).await
    }

    /// Reference a field of this index.
    pub fn field(&self, name: impl Into<String>) -> FieldRef {
        field(name)
    }

    pub fn match_all(&self) -> Condition {
        Condition::match_all()
    }

    /// The body `find` would send for `input`.
    pub fn search_body(&self, input: impl Into<SearchInput>) -> Result<Value> {
        let query = match input.into() {
            SearchInput::None => ScoredQuery::new(Condition::match_all()),
            SearchInput::Filter(filter) => ScoredQuery::new(self.translator.translate(&filter)?),
            SearchInput::Condition(condition) => ScoredQuery::new(condition),
            SearchInput::Scored(query) => query,
            SearchInput::Limit(limit) => Condition::match_all() & limit,
            SearchInput::Scorer(scorer) => Condition::match_all() & scorer,
        };
        Ok(query.to_body())
    }

    /// Canonical string of the body `find` would send for `input`.
    pub fn canonical(&self, input: impl Into<SearchInput>) -> Result<String> {
        let body = self.search_body(input)?;
        Ok(Canonicalizer::new().canonicalize(&body)?)
    }

    /// Search and return only the hits.
    pub async fn find(&self, input: impl Into<SearchInput>) -> Result<Vec<Value>> {
        let response = self.find_raw(input).await?;
        match response.get("hits").and_then(|h| h.get("hits")) {
            Some(Value::Array(hits)) => Ok(hits.clone()),
            _ => Err(IndexError::invalid("Search response carries no hits", response)),
        }
    }

    /// Search and return the whole engine response.
    pub async fn find_raw(&self, input: impl Into<SearchInput>) -> Result<Value> {
        let body = self.search_body(input)?;
        debug!(index = %self.config.name, body = %body, "searching");
        self.backend.search(&self.config.name, &body).await
    }

    /// Index a single non-empty document.
    #[instrument(skip(self, document), fields(index = %self.config.name))]
    pub async fn insert_one(&self, document: &Value, id: Option<&str>) -> Result<()> {
        if !is_non_empty_object(document) {
            return Err(IndexError::invalid(
                "Document for insert_one must be a non-empty object",
                document.clone(),
            ));
        }

        let response = self
            .backend
            .index_document(&self.config.name, id, document, self.config.refresh)
            .await?;
        match result_of(&response) {
            Some("created" | "updated") => Ok(()),
            _ => Err(IndexError::invalid("Failed to insert document", document.clone())),
        }
    }

    /// Index many documents through one bulk request.
    #[instrument(skip(self, documents), fields(index = %self.config.name, count = documents.len()))]
    pub async fn insert_many(&self, documents: &[Value]) -> Result<()> {
        if !documents.iter().all(Value::is_object) {
            return Err(IndexError::invalid(
                "Documents for insert_many must be a list of objects",
                Value::Array(documents.to_vec()),
            ));
        }
        if documents.is_empty() {
            debug!("nothing to insert");
            return Ok(());
        }

        let header = json!({"index": {"_index": self.config.name}});
        let operations: Vec<Value> = documents
            .iter()
            .flat_map(|doc| [header.clone(), doc.clone()])
            .collect();

        let response = self.backend.bulk(&operations, self.config.refresh).await?;
        if response.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            return Err(IndexError::invalid(
                "Failed to insert documents via bulk",
                response,
            ));
        }
        Ok(())
    }

    /// Merge `update` into a document, optionally creating it.
    ///
    /// A response other than `updated`/`created` (for example `noop`) is
    /// logged and not treated as a failure.
    #[instrument(skip(self, update), fields(index = %self.config.name))]
    pub async fn update_one(&self, id: &str, update: &Value, upsert: bool) -> Result<()> {
        if !is_non_empty_object(update) {
            return Err(IndexError::invalid(
                "Update document must be provided for update_one",
                update.clone(),
            ));
        }

        let body = json!({"doc": update, "doc_as_upsert": upsert});
        let response = self
            .backend
            .update(&self.config.name, id, &body, self.config.refresh)
            .await?;
        if !matches!(result_of(&response), Some("updated" | "created")) {
            warn!(response = %response, "No documents were updated for the given id");
        }
        Ok(())
    }

    /// Delete one document by id.
    #[instrument(skip(self), fields(index = %self.config.name))]
    pub async fn delete_one(&self, id: &str) -> Result<()> {
        let response = self
            .backend
            .delete(&self.config.name, id, self.config.refresh)
            .await?;
        if result_of(&response) != Some("deleted") {
            return Err(IndexError::invalid(
                format!("Failed to delete document with ID {id}"),
                response,
            ));
        }
        Ok(())
    }

    /// Drop the index, then optionally create it again with the configured
    /// mapping.
    pub async fn delete_index(&self, recreate: bool) -> Result<()> {
        self.backend.delete_index(&self.config.name).await?;
        debug!(index = %self.config.name, recreate, "deleted index");
        if recreate {
            self.backend
                .create_index(&self.config.name, self.config.mapping.as_ref())
                .await?;
        }
        Ok(())
    }
}

fn is_non_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| !map.is_empty())
}

fn result_of(response: &Value) -> Option<&str> {
    response.get("result").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    async fn open(name: &str) -> Index<MemoryBackend> {
        Index::open(MemoryBackend::new(), IndexConfig::new(name))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_inputs_share_a_body() {
        let index = open("docs").await;
        let none = index.search_body(SearchInput::None).unwrap();
        let empty = index.search_body(json!({})).unwrap();
        let null = index.search_body(Value::Null).unwrap();
        assert_eq!(none, json!({"query": {"match_all": {}}}));
        assert_eq!(none, empty);
        assert_eq!(none, null);
    }

    #[tokio::test]
    async fn test_limit_and_scorer_inputs_wrap_match_all() {
        let index = open("docs").await;
        let limited = index.search_body(Limit::new(3).unwrap()).unwrap();
        assert_eq!(limited, json!({"size": 3, "query": {"match_all": {}}}));

        let scored = index.search_body(Scorer::new("1")).unwrap();
        assert_eq!(
            scored["query"]["function_score"]["query"],
            json!({"match_all": {}})
        );
        assert_eq!(
            scored["query"]["function_score"]["score_mode"],
            json!("multiply")
        );
    }

    #[tokio::test]
    async fn test_translation_errors_surface() {
        let index = open("docs").await;
        let err = index.search_body(json!({"$nor": []})).unwrap_err();
        assert!(matches!(err, IndexError::Query(_)));
    }

    #[test]
    fn test_non_empty_object() {
        assert!(is_non_empty_object(&json!({"a": 1})));
        assert!(!is_non_empty_object(&json!({})));
        assert!(!is_non_empty_object(&json!([1])));
        assert!(!is_non_empty_object(&Value::Null));
    }
}
