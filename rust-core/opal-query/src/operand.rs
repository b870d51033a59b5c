// SPDX-License-Identifier: PMPL-1.0-or-later
//! Dynamic dispatch over every value the combinators accept.
//!
//! The statically typed operator impls cover the common cases. [`Operand`]
//! exists for callers whose operand kinds are only known at runtime, such as
//! a query assembled from configuration. The dispatch table is:
//!
//! | lhs \ rhs | Condition | Scorer | Limit  | Scored |
//! |-----------|-----------|--------|--------|--------|
//! | Condition | Condition | Scored | Scored | Scored |
//! | Scorer    | Scored    | error  | error  | Scored |
//! | Limit     | Scored    | error  | Limit  | Scored |
//! | Scored    | Scored    | Scored | Scored | Scored |

use tracing::trace;

use crate::condition::Condition;
use crate::error::QueryError;
use crate::scored::{Limit, ScoredQuery, Scorer};

/// Which boolean connective a combination uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
        }
    }

    /// Combine conditions into the matching composite.
    pub(crate) fn join(self, children: Vec<Condition>) -> Condition {
        match self {
            Connective::And => Condition::all(children),
            Connective::Or => Condition::any(children),
        }
    }

    pub(crate) fn limit(self, a: Limit, b: Limit) -> Limit {
        match self {
            Connective::And => a.and(b),
            Connective::Or => a.or(b),
        }
    }
}

/// Any value a combinator can take.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Condition(Condition),
    Scorer(Scorer),
    Limit(Limit),
    Scored(ScoredQuery),
}

impl Operand {
    /// Kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Condition(_) => "condition",
            Operand::Scorer(_) => "scorer",
            Operand::Limit(_) => "limit",
            Operand::Scored(_) => "scored query",
        }
    }

    pub fn into_condition(self) -> Option<Condition> {
        match self {
            Operand::Condition(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_scored(self) -> Option<ScoredQuery> {
        match self {
            Operand::Scored(q) => Some(q),
            _ => None,
        }
    }
}

impl From<Condition> for Operand {
    fn from(c: Condition) -> Self {
        Operand::Condition(c)
    }
}

impl From<Scorer> for Operand {
    fn from(s: Scorer) -> Self {
        Operand::Scorer(s)
    }
}

impl From<Limit> for Operand {
    fn from(l: Limit) -> Self {
        Operand::Limit(l)
    }
}

impl From<ScoredQuery> for Operand {
    fn from(q: ScoredQuery) -> Self {
        Operand::Scored(q)
    }
}

/// `lhs & rhs` over runtime-typed operands.
pub fn conjoin(lhs: Operand, rhs: Operand) -> Result<Operand, QueryError> {
    combine(Connective::And, lhs, rhs)
}

/// `lhs | rhs` over runtime-typed operands.
pub fn disjoin(lhs: Operand, rhs: Operand) -> Result<Operand, QueryError> {
    combine(Connective::Or, lhs, rhs)
}

/// `!operand`. Only conditions and scored queries can be negated.
pub fn negate(operand: Operand) -> Result<Operand, QueryError> {
    match operand {
        Operand::Condition(c) => Ok(Operand::Condition(c.negated())),
        Operand::Scored(q) => Ok(Operand::Scored(q.negated())),
        other => Err(QueryError::ArgumentType {
            context: "not".to_string(),
            expected: "condition or scored query",
            found: other.kind(),
        }),
    }
}

fn combine(conn: Connective, lhs: Operand, rhs: Operand) -> Result<Operand, QueryError> {
    trace!(connective = conn.as_str(), lhs = lhs.kind(), rhs = rhs.kind(), "combining operands");

    let result = match (lhs, rhs) {
        (Operand::Condition(a), Operand::Condition(b)) => Operand::Condition(conn.join(vec![a, b])),

        (Operand::Condition(c), Operand::Scorer(s)) | (Operand::Scorer(s), Operand::Condition(c)) => {
            Operand::Scored(ScoredQuery::new(c).attach_scorer(conn, s)?)
        }
        (Operand::Condition(c), Operand::Limit(l)) | (Operand::Limit(l), Operand::Condition(c)) => {
            Operand::Scored(ScoredQuery::new(c).attach_limit(conn, l))
        }
        (Operand::Condition(c), Operand::Scored(q)) | (Operand::Scored(q), Operand::Condition(c)) => {
            Operand::Scored(q.attach_condition(conn, c))
        }

        (Operand::Scorer(s), Operand::Scored(q)) | (Operand::Scored(q), Operand::Scorer(s)) => {
            Operand::Scored(q.attach_scorer(conn, s)?)
        }
        (Operand::Limit(l), Operand::Scored(q)) | (Operand::Scored(q), Operand::Limit(l)) => {
            Operand::Scored(q.attach_limit(conn, l))
        }
        (Operand::Scored(a), Operand::Scored(b)) => Operand::Scored(a.attach_scored(conn, b)?),

        (Operand::Limit(a), Operand::Limit(b)) => Operand::Limit(conn.limit(a, b)),

        (lhs @ (Operand::Scorer(_) | Operand::Limit(_)), rhs) => {
            return Err(QueryError::ArgumentType {
                context: format!("{} with a {} operand", conn.as_str(), lhs.kind()),
                expected: "condition, scored query or limit",
                found: rhs.kind(),
            });
        }
    };
    Ok(result)
}
