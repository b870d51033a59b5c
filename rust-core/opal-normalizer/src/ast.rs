// SPDX-License-Identifier: PMPL-1.0-or-later
//! Canonical syntax tree.
//!
//! Deliberately separate from the buildable condition tree: nodes here only
//! live for the duration of one canonicalization and carry the logical
//! operators the rewrite rules need.

use std::fmt;

use serde_json::Value;

/// Logical connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Not => "not",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }

    /// Map a range body key to its operator.
    pub fn from_range_key(key: &str) -> Option<Self> {
        match key {
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Gte),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Logical { op: LogicalOp, children: Vec<Node> },
    Comparison { field: String, op: CompareOp, value: Value },
    Exists { field: String },
    MatchAll,
}

impl Node {
    pub fn and(children: Vec<Node>) -> Self {
        Node::Logical {
            op: LogicalOp::And,
            children,
        }
    }

    pub fn or(children: Vec<Node>) -> Self {
        Node::Logical {
            op: LogicalOp::Or,
            children,
        }
    }

    pub fn not(child: Node) -> Self {
        Node::Logical {
            op: LogicalOp::Not,
            children: vec![child],
        }
    }

    pub fn compare(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Node::Comparison {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Node::Exists {
            field: field.into(),
        }
    }

    /// Number of nodes in this tree.
    pub fn size(&self) -> usize {
        match self {
            Node::Logical { children, .. } => 1 + children.iter().map(Node::size).sum::<usize>(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range_keys() {
        assert_eq!(CompareOp::from_range_key("gte"), Some(CompareOp::Gte));
        assert_eq!(CompareOp::from_range_key("eq"), None);
    }

    #[test]
    fn test_size_counts_every_node() {
        let tree = Node::and(vec![
            Node::not(Node::exists("a")),
            Node::compare("b", CompareOp::Lt, json!(3)),
        ]);
        assert_eq!(tree.size(), 4);
    }
}
