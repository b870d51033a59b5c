// SPDX-License-Identifier: PMPL-1.0-or-later
//! The condition tree: leaf predicates and boolean composites.
//!
//! A [`Condition`] is an immutable value. Combinators never mutate their
//! inputs; they move them into a freshly allocated composite, so a subtree
//! may be cloned into any number of larger expressions.
//!
//! ## Body encoding
//!
//! | node      | body                                              |
//! |-----------|---------------------------------------------------|
//! | term      | `{"term": {"<field>": <value>}}`                  |
//! | range     | `{"range": {"<field>": {"<bound>": <value>}}}`    |
//! | terms     | `{"terms": {"<field>": [<values>]}}`              |
//! | exists    | `{"exists": {"field": "<field>"}}`                |
//! | match_all | `{"match_all": {}}`                               |
//! | bool      | `{"bool": {"<clause>": [<child bodies>]}}`        |

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// The bound of a single-sided range predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeBound {
    /// Strictly greater than.
    Gt,
    /// Strictly less than.
    Lt,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
}

impl RangeBound {
    /// All bounds, in the order the filter translator emits them.
    pub const ALL: [RangeBound; 4] = [
        RangeBound::Gt,
        RangeBound::Lt,
        RangeBound::Gte,
        RangeBound::Lte,
    ];

    /// Key used for this bound inside a range body.
    pub fn as_str(self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Lt => "lt",
            RangeBound::Gte => "gte",
            RangeBound::Lte => "lte",
        }
    }

    /// Parse a range body key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "gt" => Some(RangeBound::Gt),
            "lt" => Some(RangeBound::Lt),
            "gte" => Some(RangeBound::Gte),
            "lte" => Some(RangeBound::Lte),
            _ => None,
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clause of a boolean composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    /// Conjunction.
    Must,
    /// Disjunction.
    Should,
    /// Negation of exactly one child.
    MustNot,
}

impl Clause {
    /// Key used for this clause inside a bool body.
    pub fn as_str(self) -> &'static str {
        match self {
            Clause::Must => "must",
            Clause::Should => "should",
            Clause::MustNot => "must_not",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// Exact match on a single value.
    Term { field: String, value: Value },
    /// One-sided range comparison.
    Range {
        field: String,
        bound: RangeBound,
        value: Value,
    },
    /// Membership in a set of values.
    Terms { field: String, values: Vec<Value> },
    /// The field is present.
    Exists { field: String },
    /// Matches every document.
    MatchAll,
}

impl Leaf {
    /// Operator name, which is also the body key.
    pub fn operator(&self) -> &'static str {
        match self {
            Leaf::Term { .. } => "term",
            Leaf::Range { .. } => "range",
            Leaf::Terms { .. } => "terms",
            Leaf::Exists { .. } => "exists",
            Leaf::MatchAll => "match_all",
        }
    }

    /// Field path, absent for `match_all`.
    pub fn field(&self) -> Option<&str> {
        match self {
            Leaf::Term { field, .. }
            | Leaf::Range { field, .. }
            | Leaf::Terms { field, .. }
            | Leaf::Exists { field } => Some(field),
            Leaf::MatchAll => None,
        }
    }

    fn to_body(&self) -> Value {
        let payload = match self {
            Leaf::Term { field, value } => keyed(field, value.clone()),
            Leaf::Range {
                field,
                bound,
                value,
            } => keyed(field, keyed(bound.as_str(), value.clone())),
            Leaf::Terms { field, values } => keyed(field, Value::Array(values.clone())),
            Leaf::Exists { field } => keyed("field", Value::String(field.clone())),
            Leaf::MatchAll => Value::Object(Map::new()),
        };
        keyed(self.operator(), payload)
    }
}

/// A boolean composite.
///
/// Only constructible inside this crate, which keeps the `must_not`
/// single-child invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolQuery {
    clause: Clause,
    children: Vec<Condition>,
}

impl BoolQuery {
    pub fn clause(&self) -> Clause {
        self.clause
    }

    pub fn children(&self) -> &[Condition] {
        &self.children
    }
}

/// A single boolean query.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf(Leaf),
    Bool(BoolQuery),
}

impl Condition {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Leaf(Leaf::Term {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn range(field: impl Into<String>, bound: RangeBound, value: impl Into<Value>) -> Self {
        Condition::Leaf(Leaf::Range {
            field: field.into(),
            bound,
            value: value.into(),
        })
    }

    pub fn terms(field: impl Into<String>, values: Vec<Value>) -> Self {
        Condition::Leaf(Leaf::Terms {
            field: field.into(),
            values,
        })
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Condition::Leaf(Leaf::Exists {
            field: field.into(),
        })
    }

    pub fn match_all() -> Self {
        Condition::Leaf(Leaf::MatchAll)
    }

    /// Conjunction of `children`. Callers guarantee at least one child.
    pub(crate) fn all(children: Vec<Condition>) -> Self {
        Condition::Bool(BoolQuery {
            clause: Clause::Must,
            children,
        })
    }

    /// Disjunction of `children`. Callers guarantee at least one child.
    pub(crate) fn any(children: Vec<Condition>) -> Self {
        Condition::Bool(BoolQuery {
            clause: Clause::Should,
            children,
        })
    }

    /// Negation; the only way to build a `must_not` composite.
    pub fn negated(self) -> Self {
        Condition::Bool(BoolQuery {
            clause: Clause::MustNot,
            children: vec![self],
        })
    }

    /// Operator or clause name at the root of this tree.
    pub fn operator(&self) -> &'static str {
        match self {
            Condition::Leaf(leaf) => leaf.operator(),
            Condition::Bool(_) => "bool",
        }
    }

    /// Serialize to a query body fragment.
    pub fn to_body(&self) -> Value {
        match self {
            Condition::Leaf(leaf) => leaf.to_body(),
            Condition::Bool(b) => {
                let children = b.children.iter().map(Condition::to_body).collect();
                keyed("bool", keyed(b.clause.as_str(), Value::Array(children)))
            }
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_body().serialize(serializer)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_body())
    }
}

/// `{"<key>": value}`
pub(crate) fn keyed(key: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    Value::Object(map)
}
