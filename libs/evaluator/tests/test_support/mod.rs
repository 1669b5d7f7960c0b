#![allow(dead_code)]

use docmatch_evaluator::{
    ArithmeticKind, ComparisonRules, DefaultRules, Document, Engine, EngineConfig, EvalOptions,
    MapContext, Match, Node, Scalar,
};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock};

static ENGINE: OnceLock<Engine> = OnceLock::new();

pub fn engine() -> &'static Engine {
    ENGINE.get_or_init(|| Engine::new(EngineConfig::default()).expect("default config is valid"))
}

/// A person record with a multi-valued NAME field.
pub fn person() -> Document {
    Document::new("person-1")
        .with_text("NAME", "Bob")
        .with_text("NAME", "Robert")
        .with_text("CITY", "Lisbon")
        .with_number("AGE", 30)
        .expect("encodable age")
        .with_text("BORN", "1994-05-17")
}

pub fn evaluate(tree: &Node, doc: &Document) -> bool {
    let mut ctx = doc.context();
    engine()
        .evaluate(tree, &mut ctx, ArithmeticKind::Default, &EvalOptions::default())
        .expect("evaluation succeeds")
}

pub fn evaluate_ctx(tree: &Node, ctx: &mut MapContext) -> bool {
    engine()
        .evaluate(tree, ctx, ArithmeticKind::Default, &EvalOptions::default())
        .expect("evaluation succeeds")
}

pub fn evaluate_partial(tree: &Node, doc: &Document, incomplete: &[&str]) -> Match {
    let mut ctx = doc.context();
    let options = EvalOptions::default().incomplete(incomplete.iter().copied());
    engine()
        .evaluate_partial(tree, &mut ctx, ArithmeticKind::Default, &options)
        .expect("evaluation succeeds")
}

pub fn set(terms: &[&str]) -> HashSet<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

/// Default comparison rules that count how often they are consulted.
#[derive(Debug, Default)]
pub struct CountingRules {
    calls: AtomicUsize,
}

impl CountingRules {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }
}

impl ComparisonRules for CountingRules {
    fn compare(&self, left: &Scalar, right: &Scalar) -> Option<Ordering> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        DefaultRules.compare(left, right)
    }
}
