//! Tree-walking interpreter
//!
//! One [`Interpreter`] evaluates one document at a time. Two rule sets share the same
//! traversal core:
//!
//! - **Full mode** ([`Interpreter::evaluate`]) yields a boolean. Internally nodes produce a
//!   [`Value`]: booleans, functional sets carrying the evidence for a match, or null.
//! - **Partial mode** ([`Interpreter::evaluate_partial`]) yields a three-valued [`Match`]
//!   for documents whose fields may be incomplete.
//!
//! Per-evaluation state (the memo of rendered sub-expressions and the hit recorder inside
//! the arithmetic) is owned here and never shared between threads.

mod full;
pub mod functions;
mod partial;

use crate::arithmetic::{Arithmetic, ComparisonRules, DefaultRules};
use crate::ast::Node;
use crate::context::DocumentContext;
use crate::error::Result;
use crate::matching::Match;
use crate::value::{Scalar, Value, ValueTuple};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Evaluates expression trees against document contexts.
#[derive(Debug)]
pub struct Interpreter {
    arithmetic: Arithmetic,
    strict: bool,
    /// Results keyed by canonical rendered text, cleared per evaluation.
    memo: HashMap<String, Value>,
}

impl Interpreter {
    pub fn new(arithmetic: Arithmetic) -> Self {
        Self {
            arithmetic,
            strict: false,
            memo: HashMap::new(),
        }
    }

    /// Raise on identifiers the context cannot resolve instead of treating them as null.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn arithmetic(&self) -> &Arithmetic {
        &self.arithmetic
    }

    /// Evaluate `tree` in full mode.
    pub fn evaluate(&mut self, tree: &Node, ctx: &mut dyn DocumentContext) -> Result<bool> {
        let value = self.evaluate_value(tree, ctx)?;
        self.matched(&value)
    }

    /// Evaluate `tree` in full mode, returning the raw result.
    pub fn evaluate_value(&mut self, tree: &Node, ctx: &mut dyn DocumentContext) -> Result<Value> {
        self.memo.clear();
        self.visit(tree, ctx, false)
    }

    /// Evaluate `tree` in partial mode. Failing results that depend on a field listed in
    /// `incomplete` are reported as [`Match::Unknown`].
    pub fn evaluate_partial(
        &mut self,
        tree: &Node,
        ctx: &mut dyn DocumentContext,
        incomplete: &HashSet<String>,
    ) -> Result<Match> {
        self.memo.clear();
        let result = self.visit_partial(tree, ctx, incomplete, false)?;
        Ok(result.to_match())
    }

    /// Tuples that contributed to positive comparisons. Empty unless the arithmetic records
    /// hits.
    pub fn hit_tuples(&self) -> HashSet<ValueTuple> {
        self.arithmetic
            .hits()
            .map(|h| h.tuples().clone())
            .unwrap_or_default()
    }

    /// Hits formatted as `field:value`.
    pub fn hit_set(&self) -> BTreeSet<String> {
        self.arithmetic
            .hits()
            .map(|h| h.hit_set())
            .unwrap_or_default()
    }

    pub fn clear_hits(&mut self) {
        self.arithmetic.clear_hits();
    }

    /// Number of memoized sub-expressions from the last evaluation.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    fn matched(&self, value: &Value) -> Result<bool> {
        match value {
            Value::Scalar(Scalar::Bool(b)) => Ok(*b),
            other => self.arithmetic.is_truthy(other),
        }
    }
}

/// Normalize a raw evaluation result to a boolean: a non-empty collection is true.
pub fn is_matched(value: &Value) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Scalar(s) => Ok(DefaultRules.is_truthy(s)),
        Value::Tuple(_) => Ok(true),
        Value::Set(set) => Ok(!set.is_empty()),
        Value::Lazy(lazy) => lazy.is_empty().map(|empty| !empty),
    }
}
