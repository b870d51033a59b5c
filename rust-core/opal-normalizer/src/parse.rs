// SPDX-License-Identifier: PMPL-1.0-or-later
//! Query body to canonical tree.

use serde_json::{Map, Value};
use tracing::trace;

use crate::ast::{CompareOp, Node};
use crate::error::NormalizeError;

const BOOL_CLAUSES: [&str; 4] = ["must", "filter", "should", "must_not"];

/// Rebuild a canonical tree from a query body.
///
/// An outer `"query"` key is unwrapped first, so both complete search bodies
/// and bare clauses are accepted. Scoring wrappers are not modeled.
pub fn parse_body(body: &Value) -> Result<Node, NormalizeError> {
    let clause = match body.get("query") {
        Some(inner) => inner,
        None => body,
    };
    parse_clause(clause)
}

fn parse_clause(clause: &Value) -> Result<Node, NormalizeError> {
    let (kind, payload) = single_entry(clause)
        .ok_or_else(|| NormalizeError::unsupported("expected a single-key clause", clause))?;

    trace!(kind, "parsing clause");
    match kind {
        "bool" => parse_bool(payload, clause),
        "term" => {
            let (field, value) = field_entry(payload, clause)?;
            Ok(Node::compare(field, CompareOp::Eq, value.clone()))
        }
        "terms" => {
            let (field, values) = field_entry(payload, clause)?;
            let values = values
                .as_array()
                .ok_or_else(|| NormalizeError::unsupported("terms expects an array", clause))?;
            Ok(Node::or(
                values
                    .iter()
                    .map(|v| Node::compare(field, CompareOp::Eq, v.clone()))
                    .collect(),
            ))
        }
        "range" => parse_range(payload, clause),
        "exists" => payload
            .get("field")
            .and_then(Value::as_str)
            .map(Node::exists)
            .ok_or_else(|| NormalizeError::unsupported("exists expects a field name", clause)),
        "match_all" => Ok(Node::MatchAll),
        other => Err(NormalizeError::unsupported(
            format!("unknown clause `{other}`"),
            clause,
        )),
    }
}

fn parse_bool(payload: &Value, clause: &Value) -> Result<Node, NormalizeError> {
    let map = payload
        .as_object()
        .ok_or_else(|| NormalizeError::unsupported("bool expects a mapping", clause))?;

    if let Some(key) = map.keys().find(|k| !BOOL_CLAUSES.contains(&k.as_str())) {
        return Err(NormalizeError::unsupported(
            format!("unknown bool key `{key}`"),
            clause,
        ));
    }

    let mut children = Vec::new();
    for key in ["must", "filter"] {
        for item in clause_items(map, key, clause)? {
            children.push(parse_clause(item)?);
        }
    }

    // All should clauses together make up one member of the conjunction.
    let mut alternatives = clause_items(map, "should", clause)?
        .iter()
        .map(parse_clause)
        .collect::<Result<Vec<_>, _>>()?;
    match alternatives.len() {
        0 => {}
        1 => children.push(alternatives.remove(0)),
        _ => children.push(Node::or(alternatives)),
    }

    for item in clause_items(map, "must_not", clause)? {
        children.push(Node::not(parse_clause(item)?));
    }

    Ok(match children.len() {
        0 => Node::MatchAll,
        1 => children.remove(0),
        _ => Node::and(children),
    })
}

fn parse_range(payload: &Value, clause: &Value) -> Result<Node, NormalizeError> {
    let (field, bounds) = field_entry(payload, clause)?;
    let bounds = bounds
        .as_object()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| NormalizeError::unsupported("range expects a mapping of bounds", clause))?;

    let mut comparisons = bounds
        .iter()
        .map(|(key, value)| {
            CompareOp::from_range_key(key)
                .map(|op| Node::compare(field, op, value.clone()))
                .ok_or_else(|| {
                    NormalizeError::unsupported(format!("unknown range bound `{key}`"), clause)
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if comparisons.len() == 1 {
        comparisons.remove(0)
    } else {
        Node::and(comparisons)
    })
}

/// Elements of one bool clause; a lone mapping counts as a one-element list.
fn clause_items<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    clause: &Value,
) -> Result<&'a [Value], NormalizeError> {
    match map.get(key) {
        None => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(item @ Value::Object(_)) => Ok(std::slice::from_ref(item)),
        Some(_) => Err(NormalizeError::unsupported(
            format!("bool `{key}` expects a list of clauses"),
            clause,
        )),
    }
}

fn single_entry(value: &Value) -> Option<(&str, &Value)> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.iter().next().map(|(k, v)| (k.as_str(), v))
}

fn field_entry<'a>(payload: &'a Value, clause: &Value) -> Result<(&'a str, &'a Value), NormalizeError> {
    single_entry(payload)
        .ok_or_else(|| NormalizeError::unsupported("expected exactly one field", clause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LogicalOp;
    use serde_json::json;

    #[test]
    fn test_unwraps_query_key() {
        let node = parse_body(&json!({"size": 3, "query": {"match_all": {}}})).unwrap();
        assert_eq!(node, Node::MatchAll);
    }

    #[test]
    fn test_term_and_terms() {
        assert_eq!(
            parse_body(&json!({"term": {"a": 1}})).unwrap(),
            Node::compare("a", CompareOp::Eq, json!(1))
        );
        assert_eq!(
            parse_body(&json!({"terms": {"a": [1]}})).unwrap(),
            Node::or(vec![Node::compare("a", CompareOp::Eq, json!(1))])
        );
    }

    #[test]
    fn test_range_multiple_bounds() {
        let node = parse_body(&json!({"range": {"v": {"gt": 1, "lte": 5}}})).unwrap();
        assert_eq!(
            node,
            Node::and(vec![
                Node::compare("v", CompareOp::Gt, json!(1)),
                Node::compare("v", CompareOp::Lte, json!(5)),
            ])
        );
    }

    #[test]
    fn test_bool_collapses_single_child() {
        let node = parse_body(&json!({"bool": {"must": [{"exists": {"field": "x"}}]}})).unwrap();
        assert_eq!(node, Node::exists("x"));
    }

    #[test]
    fn test_empty_bool_is_match_all() {
        assert_eq!(parse_body(&json!({"bool": {}})).unwrap(), Node::MatchAll);
    }

    #[test]
    fn test_bool_operator_choice() {
        let should = parse_body(&json!({"bool": {"should": [
            {"term": {"a": 1}}, {"term": {"b": 2}}
        ]}}))
        .unwrap();
        assert!(matches!(should, Node::Logical { op: LogicalOp::Or, .. }));

        let must_not = parse_body(&json!({"bool": {"must_not": [
            {"term": {"a": 1}}, {"term": {"b": 2}}
        ]}}))
        .unwrap();
        assert!(matches!(must_not, Node::Logical { op: LogicalOp::And, .. }));
    }

    #[test]
    fn test_should_beside_other_clauses_is_one_disjunction() {
        let node = parse_body(&json!({"bool": {
            "should": [{"term": {"a": 1}}, {"term": {"b": 1}}],
            "must_not": [{"term": {"c": 1}}]
        }}))
        .unwrap();
        assert_eq!(
            node,
            Node::and(vec![
                Node::or(vec![
                    Node::compare("a", CompareOp::Eq, json!(1)),
                    Node::compare("b", CompareOp::Eq, json!(1)),
                ]),
                Node::not(Node::compare("c", CompareOp::Eq, json!(1))),
            ])
        );

        let mixed = json!({"bool": {
            "should": [{"term": {"a": 1}}, {"term": {"b": 1}}],
            "must_not": [{"term": {"c": 1}}]
        }});
        let conjunction = json!({"bool": {"must": [
            {"term": {"a": 1}},
            {"term": {"b": 1}},
            {"bool": {"must_not": [{"term": {"c": 1}}]}}
        ]}});
        assert!(!crate::equivalent(&mixed, &conjunction).unwrap());
        assert_eq!(
            crate::canonicalize(&mixed).unwrap(),
            "and(not(c == 1), or(a == 1, b == 1))"
        );
    }

    #[test]
    fn test_filter_joins_must() {
        let node = parse_body(&json!({"bool": {
            "filter": {"term": {"a": 1}},
            "must": [{"term": {"b": 2}}]
        }}))
        .unwrap();
        assert_eq!(
            node,
            Node::and(vec![
                Node::compare("b", CompareOp::Eq, json!(2)),
                Node::compare("a", CompareOp::Eq, json!(1)),
            ])
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        for body in [
            json!({"wildcard": {"a": "x*"}}),
            json!({"term": {"a": 1}, "exists": {"field": "b"}}),
            json!({"range": {"v": {"between": [1, 2]}}}),
            json!({"bool": {"minimum_should_match": 1}}),
            json!({"query": {"function_score": {"query": {"match_all": {}}}}}),
            json!("term"),
        ] {
            assert!(
                matches!(parse_body(&body), Err(NormalizeError::UnsupportedQuery { .. })),
                "accepted {body}"
            );
        }
    }
}
