//! Range collapse and query-property marker tests

use docmatch_evaluator::{
    ArithmeticKind, CandidateSet, CompareOp, Error, EvalOptions, MapContext, MarkerKind, Node,
    Range, RangeFinder, ValueRange,
};
use std::collections::BTreeSet;

mod test_support;
use test_support::{engine, evaluate, evaluate_ctx, person};

fn age(op: CompareOp, value: i32) -> Node {
    Node::term("AGE", op, value)
}

fn try_evaluate(tree: &Node, ctx: &mut MapContext) -> Result<bool, Error> {
    engine().evaluate(tree, ctx, ArithmeticKind::Default, &EvalOptions::default())
}

// ============================================================================
// Range collapse
// ============================================================================

#[test]
fn test_inclusive_range_matches_between() {
    let doc = person();
    let range = Node::and(vec![age(CompareOp::Ge, 18), age(CompareOp::Le, 65)]);
    let between = Node::function(
        "filter",
        "between",
        vec![Node::ident("AGE"), Node::lit(18), Node::lit(65)],
    );
    assert_eq!(evaluate(&range, &doc), evaluate(&between, &doc));
    assert!(evaluate(&range, &doc));

    let edge = Node::and(vec![age(CompareOp::Ge, 30), age(CompareOp::Le, 30)]);
    assert!(evaluate(&edge, &doc));
}

#[test]
fn test_exclusive_range() {
    let doc = person();
    assert!(!evaluate(&Node::and(vec![age(CompareOp::Gt, 30), age(CompareOp::Lt, 65)]), &doc));
    assert!(!evaluate(&Node::and(vec![age(CompareOp::Gt, 18), age(CompareOp::Lt, 30)]), &doc));
    assert!(evaluate(&Node::and(vec![age(CompareOp::Gt, 18), age(CompareOp::Lt, 31)]), &doc));
}

#[test]
fn test_range_child_order_is_irrelevant() {
    let doc = person();
    let forward = Node::and(vec![age(CompareOp::Ge, 18), age(CompareOp::Lt, 65)]);
    let reversed = Node::and(vec![age(CompareOp::Lt, 65), age(CompareOp::Ge, 18)]);
    assert_eq!(evaluate(&forward, &doc), evaluate(&reversed, &doc));

    let finder = RangeFinder::new();
    assert_eq!(finder.find(&forward).unwrap(), finder.find(&reversed).unwrap());
}

#[test]
fn test_range_over_two_fields_is_plain_and() {
    let doc = person();
    let tree = Node::and(vec![age(CompareOp::Ge, 18), Node::term("HEIGHT", CompareOp::Le, 200)]);
    assert_eq!(RangeFinder::new().find(&tree).unwrap(), None);
    assert!(!evaluate(&tree, &doc));
}

#[test]
fn test_literal_type_decides_range_type() {
    let tree = Node::and(vec![
        Node::term("NAME", CompareOp::Ge, "a"),
        Node::term("NAME", CompareOp::Lt, "c"),
    ]);
    assert!(matches!(RangeFinder::new().find(&tree).unwrap(), Some(Range::String(_))));

    let tree = Node::and(vec![
        Node::term("SCORE", CompareOp::Ge, 1.5),
        Node::term("SCORE", CompareOp::Lt, 9.5),
    ]);
    assert!(matches!(RangeFinder::new().find(&tree).unwrap(), Some(Range::Double(_))));
}

#[test]
fn test_string_range() {
    let doc = person();
    let tree = Node::and(vec![
        Node::term("CITY", CompareOp::Ge, "k"),
        Node::term("CITY", CompareOp::Lt, "m"),
    ]);
    assert!(evaluate(&tree, &doc));
}

// ============================================================================
// Bounded marker
// ============================================================================

#[test]
fn test_bounded_marker() {
    let doc = person();
    let tree = Node::marker(
        MarkerKind::Bounded,
        Node::and(vec![age(CompareOp::Ge, 18), age(CompareOp::Le, 65)]),
    );
    assert!(evaluate(&tree, &doc));
    assert_eq!(
        tree.to_string(),
        "((_Bounded_ = true) && ((AGE >= 18 && AGE <= 65)))"
    );
}

#[test]
fn test_malformed_bounded_marker_is_fatal() {
    let doc = person();
    let mut ctx = doc.context();

    let mismatched = Node::marker(
        MarkerKind::Bounded,
        Node::and(vec![age(CompareOp::Ge, 18), Node::term("HEIGHT", CompareOp::Le, 65)]),
    );
    let err = try_evaluate(&mismatched, &mut ctx).unwrap_err();
    assert!(err.is_fatal(), "got {:?}", err);

    let three_terms = Node::marker(
        MarkerKind::Bounded,
        Node::and(vec![
            age(CompareOp::Ge, 18),
            age(CompareOp::Le, 65),
            age(CompareOp::Ne, 40),
        ]),
    );
    assert!(try_evaluate(&three_terms, &mut ctx).unwrap_err().is_fatal());

    let missing_literal = Node::marker(
        MarkerKind::Bounded,
        Node::and(vec![
            Node::compare(CompareOp::Ge, Node::ident("AGE"), Node::null()),
            age(CompareOp::Le, 65),
        ]),
    );
    assert!(try_evaluate(&missing_literal, &mut ctx).unwrap_err().is_fatal());
}

#[test]
fn test_with_marker_requires_marker() {
    let tree = Node::and(vec![age(CompareOp::Ge, 18), age(CompareOp::Le, 65)]);
    let err = RangeFinder::new().with_marker().find(&tree).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_not_delayed_stops_at_markers() {
    let range = Node::and(vec![age(CompareOp::Ge, 18), age(CompareOp::Le, 65)]);
    let delayed = Node::marker(MarkerKind::Delayed, range);
    assert!(RangeFinder::new().find(&delayed).unwrap().is_some());
    assert!(RangeFinder::new().not_delayed().find(&delayed).unwrap().is_none());
}

#[test]
fn test_recursive_search() {
    let range = Node::and(vec![age(CompareOp::Ge, 18), age(CompareOp::Le, 65)]);
    let tree = Node::or(vec![Node::eq("NAME", "bob"), Node::group(range)]);
    assert!(RangeFinder::new().find(&tree).unwrap().is_none());
    let found = RangeFinder::new().recursive().find(&tree).unwrap().unwrap();
    assert_eq!(found.field(), "AGE");
    assert_eq!(RangeFinder::new().find_all(&tree).unwrap().len(), 1);
}

// ============================================================================
// Transparent markers
// ============================================================================

#[test]
fn test_delayed_and_evaluation_only_markers_are_transparent() {
    let doc = person();
    for kind in [MarkerKind::Delayed, MarkerKind::EvaluationOnly] {
        assert!(evaluate(&Node::marker(kind.clone(), Node::eq("NAME", "bob")), &doc));
        assert!(!evaluate(&Node::marker(kind, Node::eq("NAME", "alice")), &doc));
    }
}

// ============================================================================
// Threshold markers
// ============================================================================

#[test]
fn test_exceeded_or_against_value_set() {
    let doc = person();
    let tree = Node::marker(
        MarkerKind::ExceededOr {
            field: "CITY".to_string(),
            candidates: "cities".to_string(),
        },
        Node::or(vec![Node::eq("CITY", "lisbon"), Node::eq("CITY", "porto")]),
    );

    let mut ctx = doc
        .context()
        .with_candidates("cities", CandidateSet::values(["porto", "lisbon", "faro"]));
    assert!(evaluate_ctx(&tree, &mut ctx));

    let mut ctx = doc
        .context()
        .with_candidates("cities", CandidateSet::values(["porto", "faro"]));
    assert!(!evaluate_ctx(&tree, &mut ctx));
}

#[test]
fn test_exceeded_value_against_fst() {
    let doc = person();
    let tree = Node::marker(
        MarkerKind::ExceededValue {
            candidates: "names".to_string(),
        },
        Node::compare(CompareOp::Er, Node::ident("NAME"), Node::lit("rob.*")),
    );

    let candidates = CandidateSet::fst(["roberta", "robert", "robbie"]).unwrap();
    let mut ctx = doc.context().with_candidates("names", candidates);
    assert!(evaluate_ctx(&tree, &mut ctx));

    let candidates = CandidateSet::fst(["roberta", "robbie"]).unwrap();
    let mut ctx = doc.context().with_candidates("names", candidates);
    assert!(!evaluate_ctx(&tree, &mut ctx));
}

#[test]
fn test_exceeded_or_against_ranges() {
    let doc = person();
    let tree = Node::marker(
        MarkerKind::ExceededOr {
            field: "AGE".to_string(),
            candidates: "ages".to_string(),
        },
        Node::eq("AGE", 30),
    );

    let candidates = CandidateSet::ranges(vec![
        ValueRange::inclusive(0, 10),
        ValueRange::inclusive(25, 30),
    ]);
    let mut ctx = doc.context().with_candidates("ages", candidates);
    assert!(evaluate_ctx(&tree, &mut ctx));

    let candidates = CandidateSet::ranges(vec![ValueRange::exclusive(30, 40)]);
    let mut ctx = doc.context().with_candidates("ages", candidates);
    assert!(!evaluate_ctx(&tree, &mut ctx));
}

#[test]
fn test_threshold_hits_are_recorded() {
    let doc = person();
    let tree = Node::marker(
        MarkerKind::ExceededOr {
            field: "NAME".to_string(),
            candidates: "names".to_string(),
        },
        Node::eq("NAME", "bob"),
    );
    let mut ctx = doc
        .context()
        .with_candidates("names", CandidateSet::values(["bob", "robert", "alice"]));
    let mut interpreter = engine().interpreter(ArithmeticKind::HitList);
    assert!(interpreter.evaluate(&tree, &mut ctx).unwrap());
    assert_eq!(
        interpreter.hit_set(),
        ["NAME:Bob", "NAME:Robert"]
            .iter()
            .map(|s| s.to_string())
            .collect::<BTreeSet<String>>()
    );
}

#[test]
fn test_missing_candidate_set() {
    let doc = person();
    let tree = Node::marker(
        MarkerKind::ExceededOr {
            field: "CITY".to_string(),
            candidates: "cities".to_string(),
        },
        Node::eq("CITY", "lisbon"),
    );
    let err = try_evaluate(&tree, &mut doc.context()).unwrap_err();
    assert!(matches!(err, Error::Evaluation(_)));
}
