// SPDX-License-Identifier: PMPL-1.0-or-later
//! Logical-equivalence rewrites over the canonical tree.
//!
//! Three stages run in order:
//!
//! 1. [`normalize`] expresses `>` and `>=` through negated `<=` and `<`, and
//!    pushes every negation down to the leaves with De Morgan's laws.
//! 2. [`reduce_double_negation`] removes `not(not(x))` pairs.
//! 3. [`flatten`] merges nested `and`/`or` nodes into their same-op parent.
//!
//! After the three stages, `not` only ever wraps a leaf.

use crate::ast::{CompareOp, LogicalOp, Node};

/// Bottom-up normalization.
pub fn normalize(node: Node) -> Node {
    match node {
        Node::Logical {
            op: LogicalOp::Not,
            mut children,
        } => match children.pop() {
            Some(child) => negate(normalize(child)),
            None => Node::not(Node::MatchAll),
        },
        Node::Logical { op, children } => Node::Logical {
            op,
            children: children.into_iter().map(normalize).collect(),
        },
        Node::Comparison {
            field,
            op: CompareOp::Gt,
            value,
        } => Node::not(Node::compare(field, CompareOp::Lte, value)),
        Node::Comparison {
            field,
            op: CompareOp::Gte,
            value,
        } => Node::not(Node::compare(field, CompareOp::Lt, value)),
        other => other,
    }
}

/// Negate an already normalized node.
fn negate(node: Node) -> Node {
    match node {
        Node::Logical {
            op: LogicalOp::And,
            children,
        } => Node::or(children.into_iter().map(negate).collect()),
        Node::Logical {
            op: LogicalOp::Or,
            children,
        } => Node::and(children.into_iter().map(negate).collect()),
        Node::Comparison { field, op, value } => match op {
            CompareOp::Gt => Node::compare(field, CompareOp::Lte, value),
            CompareOp::Gte => Node::compare(field, CompareOp::Lt, value),
            CompareOp::Ne => Node::compare(field, CompareOp::Eq, value),
            _ => Node::not(Node::Comparison { field, op, value }),
        },
        // `not` itself, exists and match_all stay explicitly wrapped.
        other => Node::not(other),
    }
}

/// Remove `not(not(x))` pairs at every depth.
pub fn reduce_double_negation(node: Node) -> Node {
    match node {
        Node::Logical { op, children } => {
            let mut children: Vec<Node> =
                children.into_iter().map(reduce_double_negation).collect();
            if op == LogicalOp::Not {
                if let [Node::Logical {
                    op: LogicalOp::Not,
                    children: inner,
                }] = children.as_mut_slice()
                {
                    if inner.len() == 1 {
                        return inner.remove(0);
                    }
                }
            }
            Node::Logical { op, children }
        }
        other => other,
    }
}

/// Merge `and`/`or` children into a parent with the same operator.
pub fn flatten(node: Node) -> Node {
    match node {
        Node::Logical { op, children } => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.into_iter().map(flatten) {
                match child {
                    Node::Logical {
                        op: child_op,
                        children: grandchildren,
                    } if child_op == op && op != LogicalOp::Not => flat.extend(grandchildren),
                    other => flat.push(other),
                }
            }
            Node::Logical { op, children: flat }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lt(f: &str, v: i64) -> Node {
        Node::compare(f, CompareOp::Lt, json!(v))
    }

    fn gt(f: &str, v: i64) -> Node {
        Node::compare(f, CompareOp::Gt, json!(v))
    }

    fn lte(f: &str, v: i64) -> Node {
        Node::compare(f, CompareOp::Lte, json!(v))
    }

    #[test]
    fn test_gt_becomes_negated_lte() {
        assert_eq!(normalize(gt("a", 1)), Node::not(lte("a", 1)));
        assert_eq!(
            normalize(Node::compare("a", CompareOp::Gte, json!(1))),
            Node::not(lt("a", 1))
        );
        assert_eq!(normalize(lt("a", 1)), lt("a", 1));
    }

    #[test]
    fn test_not_gt_becomes_lte() {
        let out = reduce_double_negation(normalize(Node::not(gt("a", 1))));
        assert_eq!(out, lte("a", 1));
    }

    #[test]
    fn test_not_lt_stays_explicit() {
        assert_eq!(normalize(Node::not(lt("a", 1))), Node::not(lt("a", 1)));
    }

    #[test]
    fn test_ne_is_negated_to_eq() {
        let ne = Node::compare("a", CompareOp::Ne, json!("x"));
        assert_eq!(
            normalize(Node::not(ne)),
            Node::compare("a", CompareOp::Eq, json!("x"))
        );
    }

    #[test]
    fn test_de_morgan_reaches_leaves() {
        let tree = Node::not(Node::and(vec![
            Node::or(vec![lt("a", 1), Node::exists("b")]),
            lt("c", 2),
        ]));
        let out = normalize(tree);
        assert_eq!(
            out,
            Node::or(vec![
                Node::and(vec![Node::not(lt("a", 1)), Node::not(Node::exists("b"))]),
                Node::not(lt("c", 2)),
            ])
        );
    }

    #[test]
    fn test_double_negation_is_removed_recursively() {
        let tree = Node::and(vec![
            Node::not(Node::not(Node::not(Node::not(Node::exists("x"))))),
            Node::not(Node::not(Node::not(Node::MatchAll))),
        ]);
        assert_eq!(
            reduce_double_negation(tree),
            Node::and(vec![Node::exists("x"), Node::not(Node::MatchAll)])
        );
    }

    #[test]
    fn test_flatten_merges_same_op() {
        let tree = Node::and(vec![
            Node::and(vec![lt("a", 1), Node::and(vec![lt("b", 2)])]),
            Node::or(vec![Node::or(vec![lt("c", 3)]), lt("d", 4)]),
        ]);
        assert_eq!(
            flatten(tree),
            Node::and(vec![
                lt("a", 1),
                lt("b", 2),
                Node::or(vec![lt("c", 3), lt("d", 4)]),
            ])
        );
    }

    #[test]
    fn test_flatten_keeps_not_boundaries() {
        let tree = Node::not(Node::not(Node::exists("x")));
        assert_eq!(flatten(tree.clone()), tree);
    }
}
