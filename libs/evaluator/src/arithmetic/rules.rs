//! Scalar comparison rules
//!
//! Rules compare two scalars and decide truthiness. They hold no state and are shared
//! between every arithmetic built from the same engine.

use crate::encoding;
use crate::number::Number;
use crate::value::Scalar;
use std::cmp::Ordering;
use std::fmt::Debug;

/// Immutable comparison and coercion strategy.
pub trait ComparisonRules: Send + Sync + Debug {
    /// Ordering of two scalars, or `None` if they are not comparable.
    fn compare(&self, left: &Scalar, right: &Scalar) -> Option<Ordering>;

    fn equals(&self, left: &Scalar, right: &Scalar) -> bool {
        self.compare(left, right) == Some(Ordering::Equal)
    }

    fn is_truthy(&self, value: &Scalar) -> bool {
        match value {
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => !n.is_zero(),
            Scalar::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
        }
    }

    /// Regex matches are left to a later filter stage and always succeed here.
    fn defers_regex(&self) -> bool {
        false
    }
}

/// Numeric-aware rules, consistent with how numbers were encoded at index time.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRules;

impl DefaultRules {
    /// Number held by a string: its decoded form if encoded, else its plain parse.
    fn numeric(text: &str) -> Option<Number> {
        match encoding::decode(text) {
            Some(d) => Some(Number::BigDecimal(d)),
            None => Number::parse(text),
        }
    }

    fn compare_strings(left: &str, right: &str) -> Ordering {
        if left == right {
            return Ordering::Equal;
        }
        // An encoded value against a plain numeric literal compares as numbers. Two encoded
        // values already sort correctly as strings.
        let (le, re) = (encoding::decode(left), encoding::decode(right));
        let numeric = match (le, re) {
            (Some(l), None) => Number::parse(right).map(|r| (Number::BigDecimal(l), r)),
            (None, Some(r)) => Number::parse(left).map(|l| (l, Number::BigDecimal(r))),
            _ => None,
        };
        numeric
            .and_then(|(l, r)| l.compare(&r))
            .unwrap_or_else(|| left.cmp(right))
    }
}

impl ComparisonRules for DefaultRules {
    fn compare(&self, left: &Scalar, right: &Scalar) -> Option<Ordering> {
        match (left, right) {
            (Scalar::Number(l), Scalar::Number(r)) => l.compare(r),
            (Scalar::Number(n), Scalar::String(s)) => match Self::numeric(s) {
                Some(m) => n.compare(&m),
                None => Some(n.to_string().as_str().cmp(s)),
            },
            (Scalar::String(s), Scalar::Number(n)) => match Self::numeric(s) {
                Some(m) => m.compare(n),
                None => Some(s.as_ref().cmp(n.to_string().as_str())),
            },
            (Scalar::String(l), Scalar::String(r)) => Some(Self::compare_strings(l, r)),
            (Scalar::Bool(l), Scalar::Bool(r)) => Some(l.cmp(r)),
            (Scalar::Bool(b), Scalar::String(s)) => parse_bool(s).map(|v| b.cmp(&v)),
            (Scalar::String(s), Scalar::Bool(b)) => parse_bool(s).map(|v| v.cmp(b)),
            (Scalar::Bool(_), Scalar::Number(_)) | (Scalar::Number(_), Scalar::Bool(_)) => None,
        }
    }
}

/// Rules for values that were both normalized already: plain string comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedRules;

impl ComparisonRules for NormalizedRules {
    fn compare(&self, left: &Scalar, right: &Scalar) -> Option<Ordering> {
        match (left, right) {
            (Scalar::String(l), Scalar::String(r)) => Some(l.cmp(r)),
            _ => Some(left.to_string().cmp(&right.to_string())),
        }
    }

    fn defers_regex(&self) -> bool {
        true
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
