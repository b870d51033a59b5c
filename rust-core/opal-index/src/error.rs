// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the index layer.

use opal_normalizer::NormalizeError;
use opal_query::QueryError;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by the index façade and its backends.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A document operation was rejected, either before it was sent or
    /// because the backend reported an unexpected result.
    #[error("{}", render_operation(.message, .operation))]
    InvalidOperation { message: String, operation: Value },

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// An underlying HTTP transport error from `reqwest`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend returned an HTTP error status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IndexError {
    pub(crate) fn invalid(message: impl Into<String>, operation: Value) -> Self {
        IndexError::InvalidOperation {
            message: message.into(),
            operation,
        }
    }
}

/// The message alone when there is no payload, otherwise the message
/// followed by the pretty-printed payload.
fn render_operation(message: &str, operation: &Value) -> String {
    let empty = match operation {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if empty {
        return message.to_string();
    }
    let pretty = serde_json::to_string_pretty(operation).unwrap_or_else(|_| operation.to_string());
    format!("{message}: {pretty}")
}

/// Crate-level result alias using [`IndexError`].
pub type Result<T> = std::result::Result<T, IndexError>;
