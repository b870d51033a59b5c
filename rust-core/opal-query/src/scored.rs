// SPDX-License-Identifier: PMPL-1.0-or-later
//! Scored queries: a condition plus relevance scorers and a result cap.
//!
//! Scorers attached with `and` are combined multiplicatively, scorers
//! attached with `or` by maximum. The two modes never coexist in one
//! [`ScoredQuery`]; every operation that would mix them fails with
//! [`QueryError::ScorerConflict`].

use std::num::NonZeroU64;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::condition::{keyed, Condition};
use crate::error::QueryError;
use crate::operand::Connective;

/// An opaque scoring script with named parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorer {
    script: String,
    #[serde(default)]
    params: Map<String, Value>,
}

impl Scorer {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            params: Map::new(),
        }
    }

    pub fn with_params(script: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            script: script.into(),
            params,
        }
    }

    /// Add one named parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    fn to_function(&self) -> Value {
        json!({
            "script_score": {
                "script": {
                    "source": self.script,
                    "params": self.params,
                }
            }
        })
    }
}

/// A positive cap on the number of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Limit(NonZeroU64);

impl Limit {
    pub fn new(size: u64) -> Result<Self, QueryError> {
        NonZeroU64::new(size)
            .map(Limit)
            .ok_or(QueryError::InvalidLimit(size))
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Conjunction keeps the tighter bound.
    pub fn and(self, other: Limit) -> Limit {
        self.min(other)
    }

    /// Disjunction keeps the looser bound.
    pub fn or(self, other: Limit) -> Limit {
        self.max(other)
    }
}

impl BitAnd for Limit {
    type Output = Limit;

    fn bitand(self, rhs: Limit) -> Limit {
        self.and(rhs)
    }
}

impl BitOr for Limit {
    type Output = Limit;

    fn bitor(self, rhs: Limit) -> Limit {
        self.or(rhs)
    }
}

/// How the scoring functions of a query are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    Multiply,
    Max,
}

impl ScoreMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreMode::Multiply => "multiply",
            ScoreMode::Max => "max",
        }
    }
}

/// A condition with optional scorers and an optional result cap.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuery {
    condition: Condition,
    and_scorers: Vec<Scorer>,
    or_scorers: Vec<Scorer>,
    limit: Option<Limit>,
}

impl ScoredQuery {
    /// Wrap a condition with no scorers and no limit.
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            and_scorers: Vec::new(),
            or_scorers: Vec::new(),
            limit: None,
        }
    }

    /// Build a scored query from parts, enforcing the scorer invariant.
    pub fn with_scoring(
        condition: Condition,
        and_scorers: Vec<Scorer>,
        or_scorers: Vec<Scorer>,
        limit: Option<Limit>,
    ) -> Result<Self, QueryError> {
        if !and_scorers.is_empty() && !or_scorers.is_empty() {
            return Err(QueryError::ScorerConflict(
                "cannot have both and-scorers and or-scorers at the same time".to_string(),
            ));
        }
        Ok(Self {
            condition,
            and_scorers,
            or_scorers,
            limit,
        })
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn and_scorers(&self) -> &[Scorer] {
        &self.and_scorers
    }

    pub fn or_scorers(&self) -> &[Scorer] {
        &self.or_scorers
    }

    pub fn limit(&self) -> Option<Limit> {
        self.limit
    }

    /// Aggregation mode of the attached scorers, if any.
    pub fn score_mode(&self) -> Option<ScoreMode> {
        if !self.and_scorers.is_empty() {
            Some(ScoreMode::Multiply)
        } else if !self.or_scorers.is_empty() {
            Some(ScoreMode::Max)
        } else {
            None
        }
    }

    pub fn and_condition(self, condition: Condition) -> Self {
        self.attach_condition(Connective::And, condition)
    }

    pub fn or_condition(self, condition: Condition) -> Self {
        self.attach_condition(Connective::Or, condition)
    }

    pub fn and_scorer(self, scorer: Scorer) -> Result<Self, QueryError> {
        self.attach_scorer(Connective::And, scorer)
    }

    pub fn or_scorer(self, scorer: Scorer) -> Result<Self, QueryError> {
        self.attach_scorer(Connective::Or, scorer)
    }

    pub fn and_limit(self, limit: Limit) -> Self {
        self.attach_limit(Connective::And, limit)
    }

    pub fn or_limit(self, limit: Limit) -> Self {
        self.attach_limit(Connective::Or, limit)
    }

    pub fn and_scored(self, other: ScoredQuery) -> Result<Self, QueryError> {
        self.attach_scored(Connective::And, other)
    }

    pub fn or_scored(self, other: ScoredQuery) -> Result<Self, QueryError> {
        self.attach_scored(Connective::Or, other)
    }

    /// Negate the inner condition; scorers and limit pass through.
    pub fn negated(self) -> Self {
        Self {
            condition: self.condition.negated(),
            ..self
        }
    }

    pub(crate) fn attach_condition(self, connective: Connective, condition: Condition) -> Self {
        Self {
            condition: connective.join(vec![self.condition, condition]),
            ..self
        }
    }

    pub(crate) fn attach_scorer(
        mut self,
        connective: Connective,
        scorer: Scorer,
    ) -> Result<Self, QueryError> {
        match connective {
            Connective::And if !self.or_scorers.is_empty() => {
                debug!(script = %scorer.script, "rejecting and-scorer on or-scored query");
                Err(QueryError::ScorerConflict(
                    "cannot add an and-scorer when or-scorers already exist".to_string(),
                ))
            }
            Connective::Or if !self.and_scorers.is_empty() => {
                debug!(script = %scorer.script, "rejecting or-scorer on and-scored query");
                Err(QueryError::ScorerConflict(
                    "cannot add an or-scorer when and-scorers already exist".to_string(),
                ))
            }
            Connective::And => {
                self.and_scorers.push(scorer);
                Ok(self)
            }
            Connective::Or => {
                self.or_scorers.push(scorer);
                Ok(self)
            }
        }
    }

    pub(crate) fn attach_limit(self, connective: Connective, limit: Limit) -> Self {
        let limit = match self.limit {
            Some(current) => connective.limit(current, limit),
            None => limit,
        };
        Self {
            limit: Some(limit),
            ..self
        }
    }

    pub(crate) fn attach_scored(
        self,
        connective: Connective,
        other: ScoredQuery,
    ) -> Result<Self, QueryError> {
        let mut and_scorers = self.and_scorers;
        and_scorers.extend(other.and_scorers);
        let mut or_scorers = self.or_scorers;
        or_scorers.extend(other.or_scorers);

        let limit = match (self.limit, other.limit) {
            (Some(a), Some(b)) => Some(connective.limit(a, b)),
            (a, b) => a.or(b),
        };

        Self::with_scoring(
            connective.join(vec![self.condition, other.condition]),
            and_scorers,
            or_scorers,
            limit,
        )
    }

    /// Serialize to a complete search body.
    pub fn to_body(&self) -> Value {
        let condition = self.condition.to_body();
        let query = match self.score_mode() {
            None => condition,
            Some(mode) => {
                let scorers = match mode {
                    ScoreMode::Multiply => &self.and_scorers,
                    ScoreMode::Max => &self.or_scorers,
                };
                let functions: Vec<Value> = scorers.iter().map(Scorer::to_function).collect();
                keyed(
                    "function_score",
                    json!({
                        "query": condition,
                        "functions": functions,
                        "score_mode": mode.as_str(),
                    }),
                )
            }
        };

        let mut body = Map::new();
        if let Some(limit) = self.limit {
            body.insert("size".to_string(), Value::from(limit.get()));
        }
        body.insert("query".to_string(), query);
        Value::Object(body)
    }
}

impl From<Condition> for ScoredQuery {
    fn from(condition: Condition) -> Self {
        ScoredQuery::new(condition)
    }
}

impl Serialize for ScoredQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_body().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Operator overloads
//
// Combinations that cannot fail return the value directly; combinations that
// may mix scorer kinds return a `Result`.
// ---------------------------------------------------------------------------

impl BitAnd<Scorer> for Condition {
    type Output = ScoredQuery;

    fn bitand(self, rhs: Scorer) -> ScoredQuery {
        ScoredQuery {
            and_scorers: vec![rhs],
            ..ScoredQuery::new(self)
        }
    }
}

impl BitOr<Scorer> for Condition {
    type Output = ScoredQuery;

    fn bitor(self, rhs: Scorer) -> ScoredQuery {
        ScoredQuery {
            or_scorers: vec![rhs],
            ..ScoredQuery::new(self)
        }
    }
}

impl BitAnd<Condition> for Scorer {
    type Output = ScoredQuery;

    fn bitand(self, rhs: Condition) -> ScoredQuery {
        rhs & self
    }
}

impl BitOr<Condition> for Scorer {
    type Output = ScoredQuery;

    fn bitor(self, rhs: Condition) -> ScoredQuery {
        rhs | self
    }
}

impl BitAnd<Limit> for Condition {
    type Output = ScoredQuery;

    fn bitand(self, rhs: Limit) -> ScoredQuery {
        ScoredQuery::new(self).and_limit(rhs)
    }
}

impl BitOr<Limit> for Condition {
    type Output = ScoredQuery;

    fn bitor(self, rhs: Limit) -> ScoredQuery {
        ScoredQuery::new(self).or_limit(rhs)
    }
}

impl BitAnd<Condition> for Limit {
    type Output = ScoredQuery;

    fn bitand(self, rhs: Condition) -> ScoredQuery {
        rhs & self
    }
}

impl BitOr<Condition> for Limit {
    type Output = ScoredQuery;

    fn bitor(self, rhs: Condition) -> ScoredQuery {
        rhs | self
    }
}

impl BitAnd<ScoredQuery> for Condition {
    type Output = ScoredQuery;

    fn bitand(self, rhs: ScoredQuery) -> ScoredQuery {
        rhs.and_condition(self)
    }
}

impl BitOr<ScoredQuery> for Condition {
    type Output = ScoredQuery;

    fn bitor(self, rhs: ScoredQuery) -> ScoredQuery {
        rhs.or_condition(self)
    }
}

impl BitAnd<Condition> for ScoredQuery {
    type Output = ScoredQuery;

    fn bitand(self, rhs: Condition) -> ScoredQuery {
        self.and_condition(rhs)
    }
}

impl BitOr<Condition> for ScoredQuery {
    type Output = ScoredQuery;

    fn bitor(self, rhs: Condition) -> ScoredQuery {
        self.or_condition(rhs)
    }
}

impl BitAnd<Limit> for ScoredQuery {
    type Output = ScoredQuery;

    fn bitand(self, rhs: Limit) -> ScoredQuery {
        self.and_limit(rhs)
    }
}

impl BitOr<Limit> for ScoredQuery {
    type Output = ScoredQuery;

    fn bitor(self, rhs: Limit) -> ScoredQuery {
        self.or_limit(rhs)
    }
}

impl BitAnd<ScoredQuery> for Limit {
    type Output = ScoredQuery;

    fn bitand(self, rhs: ScoredQuery) -> ScoredQuery {
        rhs.and_limit(self)
    }
}

impl BitOr<ScoredQuery> for Limit {
    type Output = ScoredQuery;

    fn bitor(self, rhs: ScoredQuery) -> ScoredQuery {
        rhs.or_limit(self)
    }
}

impl BitAnd<Scorer> for ScoredQuery {
    type Output = Result<ScoredQuery, QueryError>;

    fn bitand(self, rhs: Scorer) -> Self::Output {
        self.and_scorer(rhs)
    }
}

impl BitOr<Scorer> for ScoredQuery {
    type Output = Result<ScoredQuery, QueryError>;

    fn bitor(self, rhs: Scorer) -> Self::Output {
        self.or_scorer(rhs)
    }
}

impl BitAnd<ScoredQuery> for Scorer {
    type Output = Result<ScoredQuery, QueryError>;

    fn bitand(self, rhs: ScoredQuery) -> Self::Output {
        rhs.and_scorer(self)
    }
}

impl BitOr<ScoredQuery> for Scorer {
    type Output = Result<ScoredQuery, QueryError>;

    fn bitor(self, rhs: ScoredQuery) -> Self::Output {
        rhs.or_scorer(self)
    }
}

impl BitAnd for ScoredQuery {
    type Output = Result<ScoredQuery, QueryError>;

    fn bitand(self, rhs: ScoredQuery) -> Self::Output {
        self.and_scored(rhs)
    }
}

impl BitOr for ScoredQuery {
    type Output = Result<ScoredQuery, QueryError>;

    fn bitor(self, rhs: ScoredQuery) -> Self::Output {
        self.or_scored(rhs)
    }
}

impl Not for ScoredQuery {
    type Output = ScoredQuery;

    fn not(self) -> ScoredQuery {
        self.negated()
    }
}
