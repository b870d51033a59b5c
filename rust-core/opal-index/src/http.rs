// SPDX-License-Identifier: PMPL-1.0-or-later
//! REST backend for OpenSearch-compatible engines.
//!
//! [`HttpBackend`] owns the base URL, the pooled `reqwest` client, the
//! credentials and the per-request timeout. Every method maps onto one REST
//! endpoint:
//!
//! | method           | request                              |
//! |------------------|--------------------------------------|
//! | `search`         | `POST /{index}/_search`              |
//! | `index_document` | `PUT /{index}/_doc/{id}` or `POST /{index}/_doc` |
//! | `bulk`           | `POST /_bulk` (NDJSON)               |
//! | `update`         | `POST /{index}/_update/{id}`         |
//! | `delete`         | `DELETE /{index}/_doc/{id}`          |
//! | `index_exists`   | `HEAD /{index}`                      |
//! | `create_index`   | `PUT /{index}`                       |
//! | `delete_index`   | `DELETE /{index}`                    |
//! | `get_mapping`    | `GET /{index}/_mapping`              |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::backend::SearchBackend;
use crate::config::{Auth, BackendConfig};
use crate::error::{IndexError, Result};

/// A [`SearchBackend`] speaking the OpenSearch REST API.
///
/// ```rust,no_run
/// use opal_index::{BackendConfig, HttpBackend};
///
/// # fn main() -> opal_index::Result<()> {
/// let backend = HttpBackend::new(&BackendConfig::from_env()?)?;
/// assert_eq!(backend.base_url().as_str(), "http://localhost:9200/");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    /// Parsed base URL of the engine.
    base_url: Url,
    /// Underlying `reqwest` client (connection-pooled, TLS-capable).
    http: reqwest::Client,
    auth: Auth,
    timeout: Duration,
}

impl HttpBackend {
    /// Build a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] if the URL cannot be parsed or the
    /// credentials are inconsistent.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| IndexError::Config(format!("Invalid base URL {:?}: {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(IndexError::Config(format!(
                "Base URL {:?} cannot carry a path",
                config.url
            )));
        }
        let auth = config.auth()?;
        let timeout = config.timeout();

        // A second install attempt fails harmlessly when a provider is already set.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IndexError::Network)?;

        debug!(url = %base_url, "created REST backend");
        Ok(Self {
            base_url,
            http,
            auth,
            timeout,
        })
    }

    /// Unauthenticated backend with the default timeout.
    pub fn connect(url: &str) -> Result<Self> {
        Self::new(&BackendConfig::new(url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str], refresh: Option<bool>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IndexError::Config(format!("Base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        if let Some(refresh) = refresh {
            url.query_pairs_mut()
                .append_pair("refresh", if refresh { "true" } else { "false" });
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        trace!(%method, %url, "sending request");
        let builder = self.http.request(method, url);
        match &self.auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }

    async fn send_json(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(IndexError::Network)?;
        handle_response(response).await
    }
}

/// Deserialize a successful response or extract an error from the body.
async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if status.is_success() {
        let body = response.text().await.map_err(IndexError::Network)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(IndexError::Serialization)
    } else {
        Err(extract_error(response).await)
    }
}

/// Turn a non-2xx response into the matching [`IndexError`] variant.
async fn extract_error(response: reqwest::Response) -> IndexError {
    let status = response.status().as_u16();
    let message = match response.json::<Value>().await {
        Ok(body) => error_reason(&body).unwrap_or_else(|| body.to_string()),
        Err(_) => format!("HTTP {status}"),
    };

    match status {
        404 => IndexError::NotFound(message),
        401 | 403 => IndexError::Unauthorized(message),
        _ => IndexError::Server { status, message },
    }
}

/// `error.reason` from an engine error body, or `error` when it is a string.
fn error_reason(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(s) => Some(s.clone()),
        error => error
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Encode bulk operations as newline-delimited JSON.
fn ndjson(operations: &[Value]) -> Result<String> {
    let mut out = String::new();
    for op in operations {
        out.push_str(&serde_json::to_string(op)?);
        out.push('\n');
    }
    Ok(out)
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let url = self.endpoint(&[index, "_search"], None)?;
        self.send_json(Method::POST, url, Some(body)).await
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        document: &Value,
        refresh: bool,
    ) -> Result<Value> {
        let (method, url) = match id {
            Some(id) => (Method::PUT, self.endpoint(&[index, "_doc", id], Some(refresh))?),
            None => (Method::POST, self.endpoint(&[index, "_doc"], Some(refresh))?),
        };
        self.send_json(method, url, Some(document)).await
    }

    async fn bulk(&self, operations: &[Value], refresh: bool) -> Result<Value> {
        let url = self.endpoint(&["_bulk"], Some(refresh))?;
        let response = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(ndjson(operations)?)
            .send()
            .await
            .map_err(IndexError::Network)?;
        handle_response(response).await
    }

    async fn update(&self, index: &str, id: &str, body: &Value, refresh: bool) -> Result<Value> {
        let url = self.endpoint(&[index, "_update", id], Some(refresh))?;
        self.send_json(Method::POST, url, Some(body)).await
    }

    async fn delete(&self, index: &str, id: &str, refresh: bool) -> Result<Value> {
        let url = self.endpoint(&[index, "_doc", id], Some(refresh))?;
        self.send_json(Method::DELETE, url, None).await
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = self.endpoint(&[index], None)?;
        let response = self
            .request(Method::HEAD, url)
            .send()
            .await
            .map_err(IndexError::Network)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(extract_error(response).await),
        }
    }

    async fn create_index(&self, index: &str, mapping: Option<&Value>) -> Result<()> {
        let url = self.endpoint(&[index], None)?;
        self.send_json(Method::PUT, url, mapping).await?;
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let url = self.endpoint(&[index], None)?;
        self.send_json(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> Result<Value> {
        let url = self.endpoint(&[index, "_mapping"], None)?;
        self.send_json(Method::GET, url, None).await
    }

    fn name(&self) -> &str {
        "opensearch-rest"
    }
}
