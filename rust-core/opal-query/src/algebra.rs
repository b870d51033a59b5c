// SPDX-License-Identifier: PMPL-1.0-or-later
//! Boolean combinators over conditions.
//!
//! `and`, `or` and `not` accept anything convertible into an [`Operand`] so
//! that mixed runtime input is rejected with a precise error instead of a
//! panic. Only conditions are valid here; wrappers combine through the
//! operator impls in [`crate::scored`] or through [`crate::operand`].

use std::ops::{BitAnd, BitOr, Not};

use crate::condition::Condition;
use crate::error::QueryError;
use crate::operand::{Connective, Operand};

/// Conjunction of every item. Fails on an empty sequence or a non-condition.
pub fn and<I>(items: I) -> Result<Condition, QueryError>
where
    I: IntoIterator,
    I::Item: Into<Operand>,
{
    combine_all(Connective::And, items)
}

/// Disjunction of every item. Fails on an empty sequence or a non-condition.
pub fn or<I>(items: I) -> Result<Condition, QueryError>
where
    I: IntoIterator,
    I::Item: Into<Operand>,
{
    combine_all(Connective::Or, items)
}

/// Negation of a single condition.
pub fn not(item: impl Into<Operand>) -> Result<Condition, QueryError> {
    match item.into() {
        Operand::Condition(c) => Ok(c.negated()),
        other => Err(QueryError::ArgumentType {
            context: "not".to_string(),
            expected: "condition",
            found: other.kind(),
        }),
    }
}

/// A condition matching every document.
pub fn match_all() -> Condition {
    Condition::match_all()
}

fn combine_all<I>(conn: Connective, items: I) -> Result<Condition, QueryError>
where
    I: IntoIterator,
    I::Item: Into<Operand>,
{
    let children = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item.into() {
            Operand::Condition(c) => Ok(c),
            other => Err(QueryError::ArgumentType {
                context: format!("{} argument {}", conn.as_str(), index),
                expected: "condition",
                found: other.kind(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if children.is_empty() {
        return Err(QueryError::ArgumentType {
            context: conn.as_str().to_string(),
            expected: "at least one condition",
            found: "empty sequence",
        });
    }
    Ok(conn.join(children))
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        Connective::And.join(vec![self, rhs])
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Condition) -> Condition {
        Connective::Or.join(vec![self, rhs])
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        self.negated()
    }
}
