//! Namespaced filter function tests

use docmatch_evaluator::{ArithmeticKind, CompareOp, Error, EvalOptions, Node};

mod test_support;
use test_support::{engine, evaluate, person};

fn filter(name: &str, args: Vec<Node>) -> Node {
    Node::function("filter", name, args)
}

fn evaluation_error(tree: &Node) -> Error {
    let doc = person();
    let mut ctx = doc.context();
    engine()
        .evaluate(tree, &mut ctx, ArithmeticKind::Default, &EvalOptions::default())
        .unwrap_err()
}

// ============================================================================
// Regex functions
// ============================================================================

#[test]
fn test_include_regex() {
    let doc = person();
    assert!(evaluate(&filter("includeRegex", vec![Node::ident("NAME"), Node::lit("rob.*")]), &doc));
    assert!(!evaluate(&filter("includeRegex", vec![Node::ident("NAME"), Node::lit("al.*")]), &doc));
    // Short namespace alias.
    assert!(evaluate(
        &Node::function("f", "includeRegex", vec![Node::ident("NAME"), Node::lit("bo.")]),
        &doc
    ));
}

#[test]
fn test_exclude_regex() {
    let doc = person();
    assert!(evaluate(&filter("excludeRegex", vec![Node::ident("NAME"), Node::lit("bob")]), &doc));
    assert!(!evaluate(
        &filter("excludeRegex", vec![Node::ident("NAME"), Node::lit("bob|robert")]),
        &doc
    ));
}

#[test]
fn test_get_all_matches_size() {
    let doc = person();
    let matches = filter("getAllMatches", vec![Node::ident("NAME"), Node::lit(".*b.*")]);
    let size = Node::method(matches, "size", vec![]);
    assert!(evaluate(&Node::compare(CompareOp::Eq, size, Node::lit(2)), &doc));
}

#[test]
fn test_invalid_pattern_becomes_evaluation_error() {
    let err = evaluation_error(&filter("includeRegex", vec![Node::ident("NAME"), Node::lit("(")]));
    assert!(matches!(err, Error::Evaluation(_)), "got {:?}", err);
}

#[test]
fn test_invalid_pattern_in_comparison_matches_function_error() {
    for op in [CompareOp::Er, CompareOp::Nr] {
        let err = evaluation_error(&Node::term("NAME", op, "("));
        assert!(matches!(err, Error::Evaluation(_)), "got {:?}", err);
        assert!(err.is_query_error());
    }
}

// ============================================================================
// Existence and counting
// ============================================================================

#[test]
fn test_is_null_and_is_not_null() {
    let doc = person();
    assert!(evaluate(&filter("isNull", vec![Node::ident("MISSING")]), &doc));
    assert!(!evaluate(&filter("isNull", vec![Node::ident("NAME")]), &doc));
    assert!(evaluate(&filter("isNotNull", vec![Node::ident("NAME")]), &doc));
    assert!(!evaluate(&filter("isNotNull", vec![Node::ident("MISSING")]), &doc));
}

#[test]
fn test_matches_at_least_count_of() {
    let doc = person();
    let args = |count: i32| {
        vec![
            Node::lit(count),
            Node::ident("NAME"),
            Node::lit("bob"),
            Node::lit("robert"),
            Node::lit("alice"),
        ]
    };
    assert!(evaluate(&filter("matchesAtLeastCountOf", args(1)), &doc));
    assert!(evaluate(&filter("matchesAtLeastCountOf", args(2)), &doc));
    assert!(!evaluate(&filter("matchesAtLeastCountOf", args(3)), &doc));
}

#[test]
fn test_occurrence() {
    let doc = person();
    assert!(evaluate(&filter("occurrence", vec![Node::ident("NAME"), Node::lit(2)]), &doc));
    assert!(evaluate(
        &filter("occurrence", vec![Node::ident("NAME"), Node::lit(">"), Node::lit(1)]),
        &doc
    ));
    assert!(!evaluate(
        &filter("occurrence", vec![Node::ident("NAME"), Node::lit("<"), Node::lit(2)]),
        &doc
    ));
    assert!(evaluate(&filter("occurrence", vec![Node::ident("MISSING"), Node::lit(0)]), &doc));

    let err = evaluation_error(&filter(
        "occurrence",
        vec![Node::ident("NAME"), Node::lit("~"), Node::lit(1)],
    ));
    assert!(matches!(err, Error::Evaluation(_)));
}

#[test]
fn test_between() {
    let doc = person();
    let between = |lo: i32, hi: i32| filter("between", vec![Node::ident("AGE"), Node::lit(lo), Node::lit(hi)]);
    assert!(evaluate(&between(18, 65), &doc));
    assert!(evaluate(&between(30, 30), &doc));
    assert!(!evaluate(&between(31, 65), &doc));

    let exclusive = filter(
        "between",
        vec![
            Node::ident("AGE"),
            Node::lit(30),
            Node::lit(65),
            Node::lit(false),
            Node::lit(true),
        ],
    );
    assert!(!evaluate(&exclusive, &doc));
}

// ============================================================================
// Dates
// ============================================================================

#[test]
fn test_date_functions() {
    let doc = person();
    let born = || Node::ident("BORN");
    assert!(evaluate(
        &filter("betweenDates", vec![born(), Node::lit("1990-01-01"), Node::lit("2000-01-01")]),
        &doc
    ));
    assert!(!evaluate(
        &filter("betweenDates", vec![born(), Node::lit("2000-01-01"), Node::lit("2010-01-01")]),
        &doc
    ));
    assert!(evaluate(&filter("afterDate", vec![born(), Node::lit("19940516")]), &doc));
    assert!(!evaluate(&filter("afterDate", vec![born(), Node::lit("1994-05-17")]), &doc));
    assert!(evaluate(&filter("beforeDate", vec![born(), Node::lit("2000-01-01")]), &doc));
}

#[test]
fn test_date_with_explicit_pattern() {
    let doc = person();
    let tree = filter(
        "afterDate",
        vec![Node::ident("BORN"), Node::lit("31/12/1993"), Node::lit("%d/%m/%Y")],
    );
    assert!(evaluate(&tree, &doc));
}

#[test]
fn test_unparseable_date_bound() {
    let err = evaluation_error(&filter("afterDate", vec![Node::ident("BORN"), Node::lit("soon")]));
    assert!(matches!(err, Error::Evaluation(_)));
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_unknown_function() {
    let err = evaluation_error(&filter("frobnicate", vec![Node::ident("NAME")]));
    assert!(matches!(err, Error::Evaluation(_)));

    let err = evaluation_error(&Node::function("other", "isNull", vec![Node::ident("NAME")]));
    assert!(matches!(err, Error::Evaluation(_)));
}

#[test]
fn test_wrong_arity() {
    let err = evaluation_error(&filter("isNull", vec![]));
    assert!(matches!(err, Error::Evaluation(_)));

    let err = evaluation_error(&filter(
        "includeRegex",
        vec![Node::ident("NAME"), Node::lit("a"), Node::lit("b")],
    ));
    assert!(matches!(err, Error::Evaluation(_)));
}
