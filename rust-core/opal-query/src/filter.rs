// SPDX-License-Identifier: PMPL-1.0-or-later
//! Filter mapping translator.
//!
//! Converts a nested document-query mapping into a [`Condition`]:
//!
//! ```text
//! {"$or": [{"value": {"$gt": 2, "$lt": 4}}, {"name": "x"}]}
//! ```
//!
//! Logical keys (`$or`, `$and`) are handled first, then every remaining key
//! names a field. A field maps either to a scalar (equality) or to a mapping
//! of operators, dispatched by precedence: range bounds, `$in`, `$ne`,
//! `$exists`, and finally equality on the mapping itself.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::condition::{Condition, RangeBound};
use crate::config::{NumericEquality, TranslatorConfig};
use crate::error::{json_kind, QueryError};
use crate::field::field;

/// Translate a filter mapping with the default configuration.
pub fn translate(filter: &Value) -> Result<Condition, QueryError> {
    FilterTranslator::default().translate(filter)
}

/// Converts filter mappings into condition trees.
#[derive(Debug, Clone, Default)]
pub struct FilterTranslator {
    config: TranslatorConfig,
}

impl FilterTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate a filter. `null` and `{}` match every document.
    pub fn translate(&self, filter: &Value) -> Result<Condition, QueryError> {
        debug!(filter = %filter, "translating filter");
        match filter {
            Value::Null => Ok(Condition::match_all()),
            Value::Object(map) => self.translate_mapping(map, filter),
            other => Err(QueryError::translation(
                format!("filter must be a mapping, got {}", json_kind(other)),
                other,
            )),
        }
    }

    fn translate_mapping(
        &self,
        map: &Map<String, Value>,
        whole: &Value,
    ) -> Result<Condition, QueryError> {
        if map.is_empty() {
            return Ok(Condition::match_all());
        }

        let mut conditions = Vec::new();

        if let Some(branches) = map.get("$or") {
            trace!(count = branch_count(branches), "translating $or");
            conditions.push(Condition::any(self.translate_branches("$or", branches)?));
        }
        if let Some(branches) = map.get("$and") {
            trace!(count = branch_count(branches), "translating $and");
            conditions.push(Condition::all(self.translate_branches("$and", branches)?));
        }

        for (key, value) in map {
            if key == "$or" || key == "$and" {
                continue;
            }
            if key.starts_with('$') {
                return Err(QueryError::translation(
                    format!("unsupported logical operator `{key}`"),
                    whole,
                ));
            }
            let condition = match value {
                Value::Object(ops) => self.translate_field(key, ops, value)?,
                scalar => self.translate_scalar(key, scalar)?,
            };
            conditions.push(condition);
        }

        if conditions.len() == 1 {
            Ok(conditions.remove(0))
        } else {
            Ok(Condition::all(conditions))
        }
    }

    fn translate_branches(&self, op: &str, branches: &Value) -> Result<Vec<Condition>, QueryError> {
        let items = match branches {
            Value::Array(items) if !items.is_empty() => items,
            other => {
                return Err(QueryError::translation(
                    format!("{op} expects a non-empty array of mappings"),
                    other,
                ))
            }
        };
        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => self.translate_mapping(map, item),
                other => Err(QueryError::translation(
                    format!("{op} branches must be mappings, got {}", json_kind(other)),
                    other,
                )),
            })
            .collect()
    }

    fn translate_field(
        &self,
        name: &str,
        ops: &Map<String, Value>,
        whole: &Value,
    ) -> Result<Condition, QueryError> {
        let bounds: Vec<Condition> = RangeBound::ALL
            .iter()
            .filter_map(|bound| {
                ops.get(&format!("${}", bound.as_str()))
                    .map(|value| Condition::range(name, *bound, value.clone()))
            })
            .collect();
        if !bounds.is_empty() {
            trace!(field = name, bounds = bounds.len(), "range operator");
            return Ok(Condition::all(bounds));
        }

        if let Some(values) = ops.get("$in") {
            return match values {
                Value::Array(items) => Ok(Condition::terms(name, items.clone())),
                other => Err(QueryError::translation(
                    format!("$in on `{name}` expects an array, got {}", json_kind(other)),
                    whole,
                )),
            };
        }

        if let Some(value) = ops.get("$ne") {
            return Ok(Condition::term(name, value.clone()).negated());
        }

        if let Some(flag) = ops.get("$exists") {
            return match flag {
                Value::Bool(true) => Ok(Condition::exists(name)),
                Value::Bool(false) => Ok(Condition::exists(name).negated()),
                other => Err(QueryError::translation(
                    format!("$exists on `{name}` expects a bool, got {}", json_kind(other)),
                    whole,
                )),
            };
        }

        trace!(field = name, "equality on mapping value");
        Ok(Condition::term(name, whole.clone()))
    }

    fn translate_scalar(&self, name: &str, value: &Value) -> Result<Condition, QueryError> {
        match (self.config.numeric_equality, value) {
            (NumericEquality::DualTyped, Value::Number(_)) => field(name).equals(value.clone()),
            _ => Ok(Condition::term(name, value.clone())),
        }
    }
}

fn branch_count(branches: &Value) -> usize {
    branches.as_array().map_or(0, Vec::len)
}
