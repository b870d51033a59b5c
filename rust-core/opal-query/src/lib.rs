// SPDX-License-Identifier: PMPL-1.0-or-later
//! OPAL Query
//!
//! Structured boolean search queries for OpenSearch-compatible engines.
//! Queries are built either with the condition algebra or by translating a
//! document-style filter mapping, and serialize to plain query bodies.
//!
//! ```
//! use opal_query::{field, translate, Limit, Scorer};
//! use serde_json::json;
//!
//! let built = field("value").gt(2) & field("value").lt(4);
//! let scored = (built & Scorer::new("doc['value'].value")) & Limit::new(10)?;
//! assert_eq!(scored.to_body()["size"], json!(10));
//!
//! let translated = translate(&json!({"name": {"$ne": "x"}}))?;
//! assert_eq!(
//!     translated.to_body(),
//!     json!({"bool": {"must_not": [{"term": {"name": "x"}}]}})
//! );
//! # Ok::<(), opal_query::QueryError>(())
//! ```

pub mod algebra;
pub mod condition;
pub mod config;
pub mod error;
pub mod field;
pub mod filter;
pub mod operand;
pub mod scored;

pub use algebra::{and, match_all, not, or};
pub use condition::{BoolQuery, Clause, Condition, Leaf, RangeBound};
pub use config::{NumericEquality, TranslatorConfig};
pub use error::QueryError;
pub use field::{field, FieldRef};
pub use filter::{translate, FilterTranslator};
pub use operand::{conjoin, disjoin, negate, Connective, Operand};
pub use scored::{Limit, ScoreMode, ScoredQuery, Scorer};
