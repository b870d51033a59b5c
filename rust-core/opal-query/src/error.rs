// SPDX-License-Identifier: PMPL-1.0-or-later
//! Query construction error types.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while building, combining or translating queries.
///
/// Every variant is terminal for the call that produced it. Nothing in this
/// crate retries or recovers internally.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A combinator received an operand of the wrong kind.
    #[error("invalid argument for {context}: expected {expected}, got {found}")]
    ArgumentType {
        /// The combinator or comparison that rejected the operand.
        context: String,
        /// What the combinator accepts.
        expected: &'static str,
        /// What it was given.
        found: &'static str,
    },

    /// Multiplicative (`and`) and max (`or`) scorers were mixed in one query.
    #[error("scorer conflict: {0}")]
    ScorerConflict(String),

    /// A result cap must be a positive integer.
    #[error("invalid limit: {0} (must be a positive integer)")]
    InvalidLimit(u64),

    /// The filter mapping has an invalid shape.
    #[error("{}: {}", .message, pretty(.fragment))]
    Translation {
        /// What was wrong.
        message: String,
        /// The offending sub-mapping.
        fragment: Value,
    },
}

impl QueryError {
    pub(crate) fn translation(message: impl Into<String>, fragment: &Value) -> Self {
        QueryError::Translation {
            message: message.into(),
            fragment: fragment.clone(),
        }
    }
}

fn pretty(fragment: &Value) -> String {
    serde_json::to_string_pretty(fragment).unwrap_or_else(|_| fragment.to_string())
}

/// Name of a JSON value's type, as used in error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_argument_type_display() {
        let err = QueryError::ArgumentType {
            context: "equality on `name`".to_string(),
            expected: "number or string",
            found: "bool",
        };
        assert_eq!(
            err.to_string(),
            "invalid argument for equality on `name`: expected number or string, got bool"
        );
    }

    #[test]
    fn test_translation_display_includes_fragment() {
        let err = QueryError::translation("$or expects an array", &json!({"$or": 3}));
        let msg = err.to_string();
        assert!(msg.starts_with("$or expects an array: "));
        assert!(msg.contains("\"$or\": 3"));
    }

    #[test]
    fn test_invalid_limit_display() {
        assert_eq!(
            QueryError::InvalidLimit(0).to_string(),
            "invalid limit: 0 (must be a positive integer)"
        );
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!(true)), "bool");
        assert_eq!(json_kind(&json!(1.5)), "number");
        assert_eq!(json_kind(&json!("x")), "string");
        assert_eq!(json_kind(&json!([1])), "array");
        assert_eq!(json_kind(&json!({})), "object");
    }
}
