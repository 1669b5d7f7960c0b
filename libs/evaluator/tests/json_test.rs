//! Trees and configuration handed over as JSON

use docmatch_evaluator::{CompareOp, EngineConfig, Error, Match, MarkerKind, Node};
use serde_json::json;

mod test_support;
use test_support::{evaluate, person};

fn parse(value: serde_json::Value) -> Node {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_tree_from_json() {
    let tree = parse(json!({
        "node": "and",
        "children": [
            {
                "node": "compare",
                "op": "EQ",
                "left": { "node": "identifier", "name": "NAME" },
                "right": { "node": "literal", "value": "bob" }
            },
            {
                "node": "function",
                "namespace": "filter",
                "name": "between",
                "args": [
                    { "node": "identifier", "name": "AGE" },
                    { "node": "literal", "value": 18 },
                    { "node": "literal", "value": 65 }
                ]
            }
        ]
    }));

    assert_eq!(
        tree,
        Node::and(vec![
            Node::eq("NAME", "bob"),
            Node::function(
                "filter",
                "between",
                vec![Node::ident("AGE"), Node::lit(18), Node::lit(65)]
            ),
        ])
    );
    assert!(evaluate(&tree, &person()));
}

#[test]
fn test_marker_from_json() {
    let tree = parse(json!({
        "node": "marker",
        "kind": { "type": "exceeded_or", "field": "CITY", "candidates": "cities" },
        "source": { "node": "compare", "op": "EQ",
                    "left": { "node": "identifier", "name": "CITY" },
                    "right": { "node": "literal", "value": "lisbon" } }
    }));
    match tree {
        Node::Marker { kind, .. } => assert_eq!(
            kind,
            MarkerKind::ExceededOr {
                field: "CITY".to_string(),
                candidates: "cities".to_string(),
            }
        ),
        other => panic!("expected marker, got {:?}", other),
    }
}

#[test]
fn test_null_literal_and_defaults() {
    let tree = parse(json!({
        "node": "compare",
        "op": "NE",
        "left": { "node": "identifier", "name": "NAME" },
        "right": { "node": "literal" }
    }));
    assert_eq!(tree, Node::compare(CompareOp::Ne, Node::ident("NAME"), Node::null()));

    let call = parse(json!({ "node": "method", "name": "size",
                             "target": { "node": "identifier", "name": "NAME" } }));
    assert_eq!(call, Node::method(Node::ident("NAME"), "size", vec![]));
}

#[test]
fn test_unknown_node_is_rejected() {
    let result: Result<Node, _> = serde_json::from_value(json!({ "node": "xor", "children": [] }));
    assert!(result.is_err());
}

#[test]
fn test_match_serializes_upper_case() {
    assert_eq!(serde_json::to_value(Match::Unknown).unwrap(), json!("UNKNOWN"));
}

#[test]
fn test_engine_config_from_json() {
    let config = EngineConfig::from_json_str(r#"{ "strict": true, "pattern_cache_capacity": 16 }"#)
        .unwrap();
    assert!(config.strict);
    assert_eq!(config.pattern_cache_capacity, 16);
    assert_eq!(config.lazy_field_cache_capacity, EngineConfig::default().lazy_field_cache_capacity);

    let err = EngineConfig::from_json_str(r#"{ "pattern_cache_capacity": 0 }"#).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}
