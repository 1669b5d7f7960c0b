//! Shared argument handling for filter functions.

use crate::error::{Error, Result};
use crate::value::{Scalar, Value, ValueTuple};
use regex::Regex;

/// A single scalar argument. A lone tuple contributes its normalized value.
pub fn scalar_arg(value: &Value, function: &str, position: usize) -> Result<Scalar> {
    match value {
        Value::Scalar(s) => Ok(s.clone()),
        Value::Tuple(t) => Ok(t.value().clone()),
        other => Err(Error::Evaluation(format!(
            "{} expects a single value as argument {}, got {}",
            function, position, other
        ))),
    }
}

pub fn text_arg(value: &Value, function: &str, position: usize) -> Result<String> {
    scalar_arg(value, function, position).map(|s| s.to_string())
}

pub fn bool_arg(value: Option<&Value>, function: &str, position: usize) -> Result<bool> {
    match value {
        None => Ok(true),
        Some(v) => match scalar_arg(v, function, position)? {
            Scalar::Bool(b) => Ok(b),
            Scalar::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Scalar::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(Error::Evaluation(format!(
                "{} expects a boolean as argument {}, got {}",
                function, position, other
            ))),
        },
    }
}

pub fn count_arg(value: &Value, function: &str, position: usize) -> Result<usize> {
    let scalar = scalar_arg(value, function, position)?;
    let count = match &scalar {
        Scalar::Number(n) => n.to_i64(),
        Scalar::String(s) => s.trim().parse::<i64>().ok(),
        Scalar::Bool(_) => None,
    };
    count
        .and_then(|c| usize::try_from(c).ok())
        .ok_or_else(|| {
            Error::Evaluation(format!(
                "{} expects a non-negative count as argument {}, got {}",
                function, position, scalar
            ))
        })
}

/// Number of values a field holds.
pub fn cardinality(value: &Value) -> Result<usize> {
    match value {
        Value::Null => Ok(0),
        Value::Scalar(_) | Value::Tuple(_) => Ok(1),
        Value::Set(set) => Ok(set.len()),
        Value::Lazy(lazy) => lazy.len(),
    }
}

/// Regex match on the normalized or the raw form of a tuple.
pub fn regex_matches(regex: &Regex, tuple: &ValueTuple) -> bool {
    regex.is_match(&tuple.value().to_string()) || regex.is_match(&tuple.raw().to_string())
}
