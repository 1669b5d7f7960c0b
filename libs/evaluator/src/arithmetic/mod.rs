//! Comparison and coercion strategy
//!
//! An [`Arithmetic`] is two parts composed: immutable [`ComparisonRules`] shared by every
//! evaluation, and an optional [`HitRecorder`] owned by exactly one evaluation. Only the
//! rules are ever cached; [`Arithmetic::clone_without_state`] hands out a copy with an
//! empty recorder.
//!
//! Every comparison is existential over multi-valued operands: it holds if any pairing of a
//! left element with a right element satisfies the scalar comparison.

pub mod hits;
pub mod patterns;
pub mod rules;

use crate::encoding;
use crate::error::{Error, Result};
use crate::functional_set::FunctionalSet;
use crate::number::Number;
use crate::value::{Scalar, Value, ValueTuple};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

pub use hits::{column_visibility_for_hit, HitRecorder};
pub use patterns::PatternCache;
pub use rules::{ComparisonRules, DefaultRules, NormalizedRules};

/// Arithmetic variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticKind {
    /// Numeric-aware comparison, no hit tracking.
    Default,
    /// Default comparison plus hit recording.
    HitList,
    /// Plain string comparison of already-normalized values; regex matches are deferred.
    Normalized,
}

impl ArithmeticKind {
    pub fn rules(self) -> Arc<dyn ComparisonRules> {
        match self {
            ArithmeticKind::Default | ArithmeticKind::HitList => Arc::new(DefaultRules),
            ArithmeticKind::Normalized => Arc::new(NormalizedRules),
        }
    }
}

impl fmt::Display for ArithmeticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithmeticKind::Default => "default",
            ArithmeticKind::HitList => "hit_list",
            ArithmeticKind::Normalized => "normalized",
        })
    }
}

/// One element of an operand.
#[derive(Debug, Clone, Copy)]
enum Element<'a> {
    Null,
    Scalar(&'a Scalar),
    Tuple(&'a ValueTuple),
}

impl<'a> Element<'a> {
    /// Form used for comparison: the normalized value of a tuple.
    fn scalar(self) -> Option<&'a Scalar> {
        match self {
            Element::Null => None,
            Element::Scalar(s) => Some(s),
            Element::Tuple(t) => Some(t.value()),
        }
    }

    fn tuple(self) -> Option<&'a ValueTuple> {
        match self {
            Element::Tuple(t) => Some(t),
            _ => None,
        }
    }
}

fn for_each_element<F>(value: &Value, mut f: F) -> Result<ControlFlow<()>>
where
    F: FnMut(Element<'_>) -> Result<ControlFlow<()>>,
{
    match value {
        Value::Null => f(Element::Null),
        Value::Scalar(s) => f(Element::Scalar(s)),
        Value::Tuple(t) => f(Element::Tuple(t)),
        Value::Set(set) => {
            for tuple in set {
                if f(Element::Tuple(tuple))?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
            Ok(ControlFlow::Continue(()))
        }
        Value::Lazy(lazy) => {
            for tuple in lazy.iter() {
                let tuple = tuple?;
                if f(Element::Tuple(&tuple))?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
            Ok(ControlFlow::Continue(()))
        }
    }
}

/// Comparison strategy plus optional per-evaluation hit state.
pub struct Arithmetic {
    kind: ArithmeticKind,
    rules: Arc<dyn ComparisonRules>,
    patterns: Arc<PatternCache>,
    hits: Option<HitRecorder>,
}

impl Arithmetic {
    pub fn new(
        kind: ArithmeticKind,
        rules: Arc<dyn ComparisonRules>,
        patterns: Arc<PatternCache>,
        hits: Option<HitRecorder>,
    ) -> Self {
        Self {
            kind,
            rules,
            patterns,
            hits,
        }
    }

    /// Arithmetic of `kind` with its standard rules. `HitList` gets an empty recorder.
    pub fn for_kind(kind: ArithmeticKind, patterns: Arc<PatternCache>, exhaustive: bool) -> Self {
        let hits = match kind {
            ArithmeticKind::HitList => Some(HitRecorder::new(exhaustive)),
            _ => None,
        };
        Self::new(kind, kind.rules(), patterns, hits)
    }

    /// Same rules, same exhaustive flag, no accumulated hits.
    pub fn clone_without_state(&self) -> Self {
        Self {
            kind: self.kind,
            rules: self.rules.clone(),
            patterns: self.patterns.clone(),
            hits: self.hits.as_ref().map(HitRecorder::fresh),
        }
    }

    pub fn kind(&self) -> ArithmeticKind {
        self.kind
    }

    pub fn rules(&self) -> &Arc<dyn ComparisonRules> {
        &self.rules
    }

    pub fn hits(&self) -> Option<&HitRecorder> {
        self.hits.as_ref()
    }

    pub fn clear_hits(&mut self) {
        if let Some(hits) = self.hits.as_mut() {
            hits.clear();
        }
    }

    pub fn record_all(&mut self, set: &FunctionalSet) {
        if let Some(hits) = self.hits.as_mut() {
            hits.extend(set.iter().cloned());
        }
    }

    /// Compiled form of a regex, from the shared cache.
    pub fn pattern(&self, pattern: &str) -> Result<Arc<regex::Regex>> {
        self.patterns.get(pattern)
    }

    fn exhaustive(&self) -> bool {
        self.hits.as_ref().is_some_and(HitRecorder::is_exhaustive)
    }

    /// Whether any (left, right) element pairing satisfies `pred`. Matching tuples are
    /// recorded when `record` is set.
    fn exists<P>(&mut self, left: &Value, right: &Value, record: bool, pred: P) -> Result<bool>
    where
        P: Fn(Element<'_>, Element<'_>) -> Result<bool>,
    {
        let exhaustive = self.exhaustive();
        let mut hits = if record { self.hits.as_mut() } else { None };
        let mut found = false;

        let _ = for_each_element(left, |l| {
            for_each_element(right, |r| {
                if !pred(l, r)? {
                    return Ok(ControlFlow::Continue(()));
                }
                found = true;
                if let Some(recorder) = hits.as_deref_mut() {
                    for tuple in [l.tuple(), r.tuple()].into_iter().flatten() {
                        recorder.record(tuple.clone());
                    }
                }
                if exhaustive {
                    Ok(ControlFlow::Continue(()))
                } else {
                    Ok(ControlFlow::Break(()))
                }
            })
        })?;
        Ok(found)
    }

    fn ordered(&mut self, left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> Result<bool> {
        let rules = self.rules.clone();
        self.exists(left, right, true, move |l, r| {
            Ok(match (l.scalar(), r.scalar()) {
                (Some(a), Some(b)) => rules.compare(a, b).is_some_and(accept),
                _ => false,
            })
        })
    }

    fn equality(&mut self, left: &Value, right: &Value, record: bool) -> Result<bool> {
        let rules = self.rules.clone();
        self.exists(left, right, record, move |l, r| {
            Ok(match (l.scalar(), r.scalar()) {
                (None, None) => true,
                (Some(a), Some(b)) => rules.equals(a, b),
                _ => false,
            })
        })
    }

    pub fn equals(&mut self, left: &Value, right: &Value) -> Result<bool> {
        self.equality(left, right, true)
    }

    /// Negation of [`Arithmetic::equals`]; records nothing.
    pub fn not_equals(&mut self, left: &Value, right: &Value) -> Result<bool> {
        self.equality(left, right, false).map(|b| !b)
    }

    pub fn less_than(&mut self, left: &Value, right: &Value) -> Result<bool> {
        self.ordered(left, right, Ordering::is_lt)
    }

    pub fn less_than_or_equal(&mut self, left: &Value, right: &Value) -> Result<bool> {
        self.ordered(left, right, Ordering::is_le)
    }

    pub fn greater_than(&mut self, left: &Value, right: &Value) -> Result<bool> {
        self.ordered(left, right, Ordering::is_gt)
    }

    pub fn greater_than_or_equal(&mut self, left: &Value, right: &Value) -> Result<bool> {
        self.ordered(left, right, Ordering::is_ge)
    }

    fn regex_match(&mut self, values: &Value, patterns: &Value, record: bool) -> Result<bool> {
        if self.rules.defers_regex() {
            return Ok(true);
        }
        let cache = self.patterns.clone();
        self.exists(values, patterns, record, move |l, r| {
            let (Some(value), Some(pattern)) = (l.scalar(), r.scalar()) else {
                return Ok(false);
            };
            let regex = cache.get(&pattern.to_string())?;
            if regex.is_match(&value.to_string()) {
                return Ok(true);
            }
            Ok(l.tuple().is_some_and(|t| regex.is_match(&t.raw().to_string())))
        })
    }

    /// Regex match of `values` against one or more `patterns`, on both the normalized and
    /// raw form of each value.
    pub fn contains(&mut self, values: &Value, patterns: &Value) -> Result<bool> {
        self.regex_match(values, patterns, true)
    }

    pub fn not_contains(&mut self, values: &Value, patterns: &Value) -> Result<bool> {
        if self.rules.defers_regex() {
            return Ok(true);
        }
        self.regex_match(values, patterns, false).map(|b| !b)
    }

    /// Tuples of `values` accepted by `pred`. Bare scalars are wrapped as synthetic tuples
    /// and nulls are skipped. Records nothing.
    pub fn select<P>(&self, values: &Value, mut pred: P) -> Result<FunctionalSet>
    where
        P: FnMut(&ValueTuple) -> Result<bool>,
    {
        let mut selected = FunctionalSet::new();
        let _ = for_each_element(values, |element| {
            let tuple = match element {
                Element::Null => return Ok(ControlFlow::Continue(())),
                Element::Scalar(s) => ValueTuple::synthetic(s.clone()),
                Element::Tuple(t) => t.clone(),
            };
            if pred(&tuple)? {
                selected.insert(tuple);
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(selected)
    }

    /// First tuple of `values` accepted by `pred`, fetching no further than needed.
    pub fn find_first<P>(&self, values: &Value, mut pred: P) -> Result<Option<ValueTuple>>
    where
        P: FnMut(&ValueTuple) -> Result<bool>,
    {
        let mut found = None;
        let _ = for_each_element(values, |element| {
            let tuple = match element {
                Element::Null => return Ok(ControlFlow::Continue(())),
                Element::Scalar(s) => ValueTuple::synthetic(s.clone()),
                Element::Tuple(t) => t.clone(),
            };
            if pred(&tuple)? {
                found = Some(tuple);
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(found)
    }

    /// Whether a single scalar lies within the given bounds.
    pub fn in_range(
        &self,
        value: &Scalar,
        lower: &Scalar,
        upper: &Scalar,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> bool {
        let above = match self.rules.compare(value, lower) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => lower_inclusive,
            _ => false,
        };
        above
            && match self.rules.compare(value, upper) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => upper_inclusive,
                _ => false,
            }
    }

    /// Tuples of `values` within the bounds.
    pub fn within(
        &self,
        values: &Value,
        lower: &Scalar,
        upper: &Scalar,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Result<FunctionalSet> {
        self.select(values, |t| {
            Ok(self.in_range(t.value(), lower, upper, lower_inclusive, upper_inclusive))
        })
    }

    pub fn is_truthy(&self, value: &Value) -> Result<bool> {
        match value {
            Value::Null => Ok(false),
            Value::Scalar(s) => Ok(self.rules.is_truthy(s)),
            Value::Tuple(_) => Ok(true),
            Value::Set(set) => Ok(!set.is_empty()),
            Value::Lazy(lazy) => lazy.is_empty().map(|empty| !empty),
        }
    }

    /// Tuple standing for a value: the tuple itself, or a synthetic one.
    pub fn get_tuple(value: &Value) -> Option<ValueTuple> {
        match value {
            Value::Tuple(t) => Some(t.clone()),
            Value::Scalar(s) => Some(ValueTuple::synthetic(s.clone())),
            _ => None,
        }
    }

    /// Set form of a value. A non-collection contributes its tuple if truthy and nothing
    /// otherwise.
    pub fn to_functional_set(&self, value: &Value) -> Result<FunctionalSet> {
        match value {
            Value::Set(set) => Ok(set.clone()),
            Value::Lazy(lazy) => Ok(lazy.to_vec()?.into_iter().collect()),
            other => {
                if self.is_truthy(other)? {
                    Ok(Self::get_tuple(other)
                        .map(FunctionalSet::singleton)
                        .unwrap_or_default())
                } else {
                    Ok(FunctionalSet::new())
                }
            }
        }
    }

    pub fn add(&self, left: &Value, right: &Value) -> Result<Value> {
        if left.is_null() && right.is_null() {
            return Err(Error::Arithmetic("cannot add two null operands".to_string()));
        }
        match (numeric_operand(left)?, numeric_operand(right)?) {
            (Some(l), Some(r)) => l
                .checked_add(&r)
                .map(Value::number)
                .ok_or_else(|| Error::Arithmetic(format!("cannot add {} and {}", l, r))),
            (Some(n), None) | (None, Some(n)) if left.is_null() || right.is_null() => {
                Ok(Value::number(n))
            }
            _ => Ok(Value::string(format!(
                "{}{}",
                operand_text(left),
                operand_text(right)
            ))),
        }
    }

    pub fn subtract(&self, left: &Value, right: &Value) -> Result<Value> {
        if left.is_null() && right.is_null() {
            return Err(Error::Arithmetic(
                "cannot subtract two null operands".to_string(),
            ));
        }
        let zero = Number::Integer(0);
        let l = numeric_operand(left)?;
        let r = numeric_operand(right)?;
        let (l, r) = match (l, r) {
            (Some(l), Some(r)) => (l, r),
            (Some(l), None) if right.is_null() => (l, zero),
            (None, Some(r)) if left.is_null() => (zero, r),
            _ => {
                return Err(Error::Arithmetic(format!(
                    "cannot subtract {} from {}",
                    right, left
                )))
            }
        };
        l.checked_sub(&r)
            .map(Value::number)
            .ok_or_else(|| Error::Arithmetic(format!("cannot subtract {} from {}", r, l)))
    }
}

impl fmt::Debug for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arithmetic")
            .field("kind", &self.kind)
            .field("hits", &self.hits.as_ref().map(HitRecorder::len))
            .finish()
    }
}

/// Number held by an arithmetic operand. `Ok(None)` for null and for text that is not
/// numeric.
fn numeric_operand(value: &Value) -> Result<Option<Number>> {
    let from_scalar = |s: &Scalar| -> Option<Number> {
        match s {
            Scalar::Number(n) => Some(n.clone()),
            Scalar::String(text) => encoding::decode(text)
                .map(Number::BigDecimal)
                .or_else(|| Number::parse(text)),
            Scalar::Bool(_) => None,
        }
    };
    match value {
        Value::Null => Ok(None),
        Value::Scalar(s) => Ok(from_scalar(s)),
        Value::Tuple(t) => Ok(from_scalar(t.raw()).or_else(|| from_scalar(t.value()))),
        Value::Set(_) | Value::Lazy(_) => Err(Error::Arithmetic(format!(
            "arithmetic on multi-valued operand {}",
            value
        ))),
    }
}

fn operand_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Tuple(t) => t.raw().to_string(),
        other => other.to_string(),
    }
}
