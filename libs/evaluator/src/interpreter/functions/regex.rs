//! Regex filter functions: `includeRegex`, `excludeRegex`, `getAllMatches`.
//!
//! Patterns come from the shared cache and so follow its whole-value, case-insensitive,
//! dot-all semantics.

use super::helpers::{regex_matches, text_arg};
use crate::arithmetic::Arithmetic;
use crate::error::Result;
use crate::functional_set::FunctionalSet;
use crate::value::Value;

/// First value matching the pattern.
pub fn include_regex(arithmetic: &Arithmetic, values: &Value, pattern: &Value) -> Result<Value> {
    if arithmetic.rules().defers_regex() {
        return arithmetic.to_functional_set(values).map(Value::Set);
    }
    let regex = arithmetic.pattern(&text_arg(pattern, "includeRegex", 2)?)?;
    let first = arithmetic.find_first(values, |t| Ok(regex_matches(&regex, t)))?;
    Ok(Value::Set(first.map(FunctionalSet::singleton).unwrap_or_default()))
}

/// Every value not matching the pattern.
pub fn exclude_regex(arithmetic: &Arithmetic, values: &Value, pattern: &Value) -> Result<Value> {
    if arithmetic.rules().defers_regex() {
        return arithmetic.to_functional_set(values).map(Value::Set);
    }
    let regex = arithmetic.pattern(&text_arg(pattern, "excludeRegex", 2)?)?;
    arithmetic
        .select(values, |t| Ok(!regex_matches(&regex, t)))
        .map(Value::Set)
}

/// Every value matching the pattern.
pub fn get_all_matches(arithmetic: &Arithmetic, values: &Value, pattern: &Value) -> Result<Value> {
    if arithmetic.rules().defers_regex() {
        return arithmetic.to_functional_set(values).map(Value::Set);
    }
    let regex = arithmetic.pattern(&text_arg(pattern, "getAllMatches", 2)?)?;
    arithmetic
        .select(values, |t| Ok(regex_matches(&regex, t)))
        .map(Value::Set)
}
