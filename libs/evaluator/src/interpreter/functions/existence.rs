//! Existence filter functions: `isNull`, `isNotNull`.

use crate::arithmetic::Arithmetic;
use crate::error::Result;
use crate::value::Value;

/// True when the field is absent or holds no values.
pub fn is_null(values: &Value) -> Result<Value> {
    let null = match values {
        Value::Null => true,
        Value::Set(set) => set.is_empty(),
        Value::Lazy(lazy) => lazy.is_empty()?,
        Value::Scalar(_) | Value::Tuple(_) => false,
    };
    Ok(Value::bool(null))
}

/// The field's values, empty when it has none.
pub fn is_not_null(arithmetic: &Arithmetic, values: &Value) -> Result<Value> {
    arithmetic.select(values, |_| Ok(true)).map(Value::Set)
}
