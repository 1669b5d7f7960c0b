//! Date filter functions: `betweenDates`, `afterDate`, `beforeDate`.
//!
//! Field values are parsed from their raw form (falling back to the normalized form) with
//! the optional pattern argument, else with the default formats below. Values that do not
//! parse are ignored; a bound that does not parse is an error.

use super::helpers::text_arg;
use crate::arithmetic::Arithmetic;
use crate::error::{Error, Result};
use crate::value::{Scalar, Value, ValueTuple};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DEFAULT_FORMATS: &[&str] = &[
    "%Y%m%d%H%M%S",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y%m%d %H%M%S",
];

const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

fn parse_with(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub(crate) fn parse_date(text: &str, pattern: Option<&str>) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(pattern) = pattern {
        if let Some(parsed) = parse_with(text, pattern) {
            return Some(parsed);
        }
    }
    DEFAULT_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DEFAULT_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        // Epoch milliseconds.
        .or_else(|| {
            text.parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .map(|d| d.naive_utc())
        })
}

fn scalar_date(value: &Scalar, pattern: Option<&str>) -> Option<NaiveDateTime> {
    match value {
        Scalar::Number(n) => n.to_i64().and_then(DateTime::from_timestamp_millis).map(|d| d.naive_utc()),
        other => parse_date(&other.to_string(), pattern),
    }
}

fn tuple_date(tuple: &ValueTuple, pattern: Option<&str>) -> Option<NaiveDateTime> {
    scalar_date(tuple.raw(), pattern).or_else(|| scalar_date(tuple.value(), pattern))
}

fn bound(value: &Value, function: &str, position: usize, pattern: Option<&str>) -> Result<NaiveDateTime> {
    let text = text_arg(value, function, position)?;
    parse_date(&text, pattern).ok_or_else(|| {
        Error::Evaluation(format!(
            "{} could not parse date '{}' (argument {})",
            function, text, position
        ))
    })
}

fn pattern_arg(args: &[Value], index: usize, function: &str) -> Result<Option<String>> {
    args.get(index)
        .map(|v| text_arg(v, function, index + 1))
        .transpose()
}

/// `betweenDates(FIELD, start, end[, pattern])`, inclusive on both ends.
pub fn between_dates(arithmetic: &Arithmetic, args: &[Value]) -> Result<Value> {
    let pattern = pattern_arg(args, 3, "betweenDates")?;
    let pattern = pattern.as_deref();
    let start = bound(&args[1], "betweenDates", 2, pattern)?;
    let end = bound(&args[2], "betweenDates", 3, pattern)?;
    arithmetic
        .select(&args[0], |t| {
            Ok(tuple_date(t, pattern).is_some_and(|d| d >= start && d <= end))
        })
        .map(Value::Set)
}

/// `afterDate(FIELD, date[, pattern])`, exclusive.
pub fn after_date(arithmetic: &Arithmetic, args: &[Value]) -> Result<Value> {
    let pattern = pattern_arg(args, 2, "afterDate")?;
    let pattern = pattern.as_deref();
    let limit = bound(&args[1], "afterDate", 2, pattern)?;
    arithmetic
        .select(&args[0], |t| Ok(tuple_date(t, pattern).is_some_and(|d| d > limit)))
        .map(Value::Set)
}

/// `beforeDate(FIELD, date[, pattern])`, exclusive.
pub fn before_date(arithmetic: &Arithmetic, args: &[Value]) -> Result<Value> {
    let pattern = pattern_arg(args, 2, "beforeDate")?;
    let pattern = pattern.as_deref();
    let limit = bound(&args[1], "beforeDate", 2, pattern)?;
    arithmetic
        .select(&args[0], |t| Ok(tuple_date(t, pattern).is_some_and(|d| d < limit)))
        .map(Value::Set)
}
