// SPDX-License-Identifier: PMPL-1.0-or-later
//! Field references and the comparison combinators built on them.

use serde_json::{Number, Value};

use crate::condition::{Condition, RangeBound};
use crate::error::{json_kind, QueryError};

/// A handle on a (possibly dotted) document field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    path: String,
}

/// Reference a document field, e.g. `field("nested.field")`.
pub fn field(path: impl Into<String>) -> FieldRef {
    FieldRef { path: path.into() }
}

impl FieldRef {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `field < value`
    pub fn lt(&self, value: impl Into<Value>) -> Condition {
        Condition::range(self.path.as_str(), RangeBound::Lt, value)
    }

    /// `field <= value`
    pub fn lte(&self, value: impl Into<Value>) -> Condition {
        Condition::range(self.path.as_str(), RangeBound::Lte, value)
    }

    /// `field > value`
    pub fn gt(&self, value: impl Into<Value>) -> Condition {
        Condition::range(self.path.as_str(), RangeBound::Gt, value)
    }

    /// `field >= value`
    pub fn gte(&self, value: impl Into<Value>) -> Condition {
        Condition::range(self.path.as_str(), RangeBound::Gte, value)
    }

    /// Equality.
    ///
    /// Strings produce a single `term`. Numbers produce a `should` over a
    /// floating-point and an integral `term`, since the backend may have
    /// indexed the same value under either representation; the integral
    /// form truncates toward zero. Anything else is rejected.
    pub fn equals(&self, value: impl Into<Value>) -> Result<Condition, QueryError> {
        match value.into() {
            Value::String(s) => Ok(Condition::term(self.path.as_str(), s)),
            Value::Number(n) => {
                let (float, int) = self.dual_typed(&n)?;
                Ok(Condition::any(vec![
                    Condition::term(self.path.as_str(), float),
                    Condition::term(self.path.as_str(), int),
                ]))
            }
            other => Err(QueryError::ArgumentType {
                context: format!("equality on `{}`", self.path),
                expected: "number or string",
                found: json_kind(&other),
            }),
        }
    }

    /// Inequality, defined as the negation of [`FieldRef::equals`].
    pub fn not_equals(&self, value: impl Into<Value>) -> Result<Condition, QueryError> {
        Ok(self.equals(value)?.negated())
    }

    /// Membership in `values`.
    pub fn isin<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::terms(
            self.path.as_str(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// The field is present.
    pub fn exists(&self) -> Condition {
        Condition::exists(self.path.as_str())
    }

    fn dual_typed(&self, n: &Number) -> Result<(Value, Value), QueryError> {
        if let Some(i) = n.as_i64() {
            return Ok((Value::from(i as f64), Value::from(i)));
        }
        if let Some(u) = n.as_u64() {
            return Ok((Value::from(u as f64), Value::from(u)));
        }
        // Non-integral JSON numbers are always finite.
        let f = n.as_f64().unwrap_or_default();
        let truncated = f.trunc();
        if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
            return Err(QueryError::ArgumentType {
                context: format!("equality on `{}`", self.path),
                expected: "number with an integral representation",
                found: "out-of-range number",
            });
        }
        Ok((Value::from(f), Value::from(truncated as i64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range_comparisons() {
        let value = field("value");
        assert_eq!(value.lt(4).to_body(), json!({"range": {"value": {"lt": 4}}}));
        assert_eq!(value.lte(4).to_body(), json!({"range": {"value": {"lte": 4}}}));
        assert_eq!(value.gt(2).to_body(), json!({"range": {"value": {"gt": 2}}}));
        assert_eq!(
            value.gte(2.5).to_body(),
            json!({"range": {"value": {"gte": 2.5}}})
        );
    }

    #[test]
    fn test_string_equality_is_single_term() {
        let cond = field("nested.field").equals("value2").unwrap();
        assert_eq!(cond.to_body(), json!({"term": {"nested.field": "value2"}}));
    }

    #[test]
    fn test_integer_equality_is_dual_typed() {
        let body = field("value").equals(3).unwrap().to_body();
        assert_eq!(
            body,
            json!({"bool": {"should": [
                {"term": {"value": 3.0}},
                {"term": {"value": 3}}
            ]}})
        );
        // The float and the integer must stay distinct JSON numbers.
        let should = &body["bool"]["should"];
        assert!(should[0]["term"]["value"].is_f64());
        assert!(should[1]["term"]["value"].is_i64());
    }

    #[test]
    fn test_float_equality_truncates_integral_form() {
        let body = field("value").equals(3.7).unwrap().to_body();
        assert_eq!(body["bool"]["should"][0]["term"]["value"], json!(3.7));
        assert_eq!(body["bool"]["should"][1]["term"]["value"], json!(3));

        let body = field("value").equals(-2.5).unwrap().to_body();
        assert_eq!(body["bool"]["should"][1]["term"]["value"], json!(-2));
    }

    #[test]
    fn test_unsigned_equality() {
        let body = field("value").equals(u64::MAX).unwrap().to_body();
        assert_eq!(body["bool"]["should"][1]["term"]["value"], json!(u64::MAX));
    }

    #[test]
    fn test_equality_rejects_other_types() {
        for bad in [json!(true), json!(null), json!([1]), json!({"a": 1})] {
            let err = field("value").equals(bad).unwrap_err();
            assert!(matches!(err, QueryError::ArgumentType { .. }));
        }
        // Non-finite floats become JSON null and are rejected too.
        assert!(field("value").equals(f64::NAN).is_err());
    }

    #[test]
    fn test_not_equals_wraps_equality() {
        let body = field("name").not_equals("x").unwrap().to_body();
        assert_eq!(
            body,
            json!({"bool": {"must_not": [{"term": {"name": "x"}}]}})
        );
    }

    #[test]
    fn test_isin_and_exists() {
        assert_eq!(
            field("array").isin([1, 2]).to_body(),
            json!({"terms": {"array": [1, 2]}})
        );
        assert_eq!(
            field("tags").isin(vec!["a", "b"]).to_body(),
            json!({"terms": {"tags": ["a", "b"]}})
        );
        assert_eq!(
            field("array").exists().to_body(),
            json!({"exists": {"field": "array"}})
        );
    }
}
