// SPDX-License-Identifier: PMPL-1.0-or-later
//! Deterministic text rendering of a canonical tree.

use serde_json::Value;

use crate::ast::Node;

/// Render a tree. Logical children are sorted, so operand order never
/// affects the output.
pub fn render(node: &Node) -> String {
    match node {
        Node::Logical { op, children } => {
            let mut parts: Vec<String> = children.iter().map(render).collect();
            parts.sort();
            format!("{}({})", op, parts.join(", "))
        }
        Node::Comparison { field, op, value } => {
            format!("{} {} {}", field, op, render_value(value))
        }
        Node::Exists { field } => format!("exists({field})"),
        Node::MatchAll => "match_all()".to_string(),
    }
}

/// Strings render raw; everything else in compact JSON notation.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
