//! Counting and range filter functions: `matchesAtLeastCountOf`, `occurrence`, `between`.

use super::helpers::{bool_arg, cardinality, count_arg, scalar_arg, text_arg};
use crate::arithmetic::Arithmetic;
use crate::error::{Error, Result};
use crate::functional_set::FunctionalSet;
use crate::value::{Scalar, Value};

/// `matchesAtLeastCountOf(count, FIELD, v1, v2, ...)`: the field values equal to any listed
/// value, provided at least `count` distinct ones match.
pub fn matches_at_least_count_of(arithmetic: &Arithmetic, args: &[Value]) -> Result<Value> {
    let count = count_arg(&args[0], "matchesAtLeastCountOf", 1)?;
    let candidates = args[2..]
        .iter()
        .enumerate()
        .map(|(i, v)| scalar_arg(v, "matchesAtLeastCountOf", i + 3))
        .collect::<Result<Vec<Scalar>>>()?;

    let rules = arithmetic.rules();
    let matched = arithmetic.select(&args[1], |t| {
        Ok(candidates.iter().any(|c| rules.equals(t.value(), c)))
    })?;
    if matched.len() >= count {
        Ok(Value::Set(matched))
    } else {
        Ok(Value::Set(FunctionalSet::new()))
    }
}

/// `occurrence(FIELD, count)` or `occurrence(FIELD, operator, count)`: compares how many
/// values the field holds.
pub fn occurrence(args: &[Value]) -> Result<Value> {
    let actual = cardinality(&args[0])?;
    let (operator, expected) = match args {
        [_, count] => ("==".to_string(), count_arg(count, "occurrence", 2)?),
        [_, operator, count] => (
            text_arg(operator, "occurrence", 2)?,
            count_arg(count, "occurrence", 3)?,
        ),
        _ => {
            return Err(Error::Evaluation(format!(
                "occurrence takes 2 or 3 arguments, got {}",
                args.len()
            )))
        }
    };

    let result = match operator.as_str() {
        "==" | "=" => actual == expected,
        "!=" => actual != expected,
        "<" => actual < expected,
        "<=" => actual <= expected,
        ">" => actual > expected,
        ">=" => actual >= expected,
        other => {
            return Err(Error::Evaluation(format!(
                "occurrence does not support operator '{}'",
                other
            )))
        }
    };
    Ok(Value::bool(result))
}

/// `between(FIELD, lower, upper[, lowerInclusive[, upperInclusive]])`: the field values
/// within the bounds. Both ends are inclusive unless stated otherwise.
pub fn between(arithmetic: &Arithmetic, args: &[Value]) -> Result<Value> {
    let lower = scalar_arg(&args[1], "between", 2)?;
    let upper = scalar_arg(&args[2], "between", 3)?;
    let lower_inclusive = bool_arg(args.get(3), "between", 4)?;
    let upper_inclusive = bool_arg(args.get(4), "between", 5)?;
    arithmetic
        .within(&args[0], &lower, &upper, lower_inclusive, upper_inclusive)
        .map(Value::Set)
}
