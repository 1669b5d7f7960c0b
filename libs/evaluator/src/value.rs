//! Values carried through evaluation
//!
//! A leaf resolves to a [`Value`]: nothing (`Null`), a plain [`Scalar`], a single indexed
//! occurrence ([`ValueTuple`]), or several occurrences of the same field (a
//! [`FunctionalSet`] or a lazily fetched set).

use crate::document::Attribute;
use crate::error::Result;
use crate::functional_set::FunctionalSet;
use crate::lazy::LazyFetchingSet;
use crate::number::Number;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Field name given to tuples synthesized from values that did not come from a document.
pub const UNKNOWN_FIELD: &str = "_UNKNOWN_";

/// A single literal or stored value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(Arc<str>),
}

impl Scalar {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Scalar::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Scalar::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(Arc::from(v))
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(Arc::from(v))
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<Number> for Scalar {
    fn from(v: Number) -> Self {
        Scalar::Number(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Number(Number::Integer(v))
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Number(Number::Long(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Number(Number::Double(v))
    }
}

impl From<Decimal> for Scalar {
    fn from(v: Decimal) -> Self {
        Scalar::Number(Number::BigDecimal(v))
    }
}

/// One observed occurrence of a field in a document.
///
/// Set membership is decided by field, normalized value and raw value; the provenance link
/// is ignored.
#[derive(Debug, Clone)]
pub struct ValueTuple {
    field: Arc<str>,
    value: Scalar,
    raw: Scalar,
    source: Option<Weak<Attribute>>,
}

impl ValueTuple {
    pub fn new(field: impl Into<Arc<str>>, value: impl Into<Scalar>, raw: impl Into<Scalar>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            raw: raw.into(),
            source: None,
        }
    }

    /// Tuple for a value that has no originating field.
    pub fn synthetic(value: Scalar) -> Self {
        Self {
            field: Arc::from(UNKNOWN_FIELD),
            raw: value.clone(),
            value,
            source: None,
        }
    }

    pub fn from_attribute(attribute: &Arc<Attribute>) -> Self {
        Self {
            field: attribute.field.clone(),
            value: attribute.normalized.clone(),
            raw: attribute.raw.clone(),
            source: Some(Arc::downgrade(attribute)),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Normalized value, the form used for comparison.
    pub fn value(&self) -> &Scalar {
        &self.value
    }

    pub fn raw(&self) -> &Scalar {
        &self.raw
    }

    /// The originating attribute, if it is still alive.
    pub fn source(&self) -> Option<Arc<Attribute>> {
        self.source.as_ref().and_then(Weak::upgrade)
    }

    /// `field:raw`, the form hits are reported in.
    pub fn hit_term(&self) -> String {
        format!("{}:{}", self.field, self.raw)
    }
}

impl PartialEq for ValueTuple {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.value == other.value && self.raw == other.raw
    }
}

impl Eq for ValueTuple {}

impl Hash for ValueTuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.value.hash(state);
        self.raw.hash(state);
    }
}

impl fmt::Display for ValueTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.value)
    }
}

/// Result of resolving or evaluating an expression.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Tuple(ValueTuple),
    Set(FunctionalSet),
    Lazy(Arc<LazyFetchingSet<ValueTuple>>),
}

impl Value {
    pub fn bool(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }

    pub fn number(n: impl Into<Number>) -> Self {
        Value::Scalar(Scalar::Number(n.into()))
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Set(_) | Value::Lazy(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Emptiness of a collection value. Non-collections report `None`.
    ///
    /// A lazy set fetches at most one element to answer.
    pub fn collection_is_empty(&self) -> Result<Option<bool>> {
        match self {
            Value::Set(set) => Ok(Some(set.is_empty())),
            Value::Lazy(lazy) => lazy.is_empty().map(Some),
            _ => Ok(None),
        }
    }

    /// All tuples held by this value; a lone tuple yields itself.
    pub fn tuples(&self) -> Result<Vec<ValueTuple>> {
        match self {
            Value::Tuple(t) => Ok(vec![t.clone()]),
            Value::Set(set) => Ok(set.iter().cloned().collect()),
            Value::Lazy(lazy) => lazy.to_vec(),
            Value::Null | Value::Scalar(_) => Ok(Vec::new()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Scalar> for Value {
    fn from(v: Scalar) -> Self {
        Value::Scalar(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(Scalar::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(Scalar::Bool(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(Scalar::from(v))
    }
}

impl From<ValueTuple> for Value {
    fn from(v: ValueTuple) -> Self {
        Value::Tuple(v)
    }
}

impl From<FunctionalSet> for Value {
    fn from(v: FunctionalSet) -> Self {
        Value::Set(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Tuple(t) => write!(f, "{}", t),
            Value::Set(set) => write!(f, "{}", set),
            Value::Lazy(_) => f.write_str("[lazy]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_identity_ignores_source() {
        let attribute = Arc::new(Attribute::new("NAME", "bob", "Bob"));
        let linked = ValueTuple::from_attribute(&attribute);
        let plain = ValueTuple::new("NAME", "bob", "Bob");
        assert_eq!(linked, plain);
        assert!(linked.source().is_some());
        assert!(plain.source().is_none());
    }

    #[test]
    fn test_scalar_json_shapes() {
        let parsed: Vec<Scalar> = serde_json::from_str(r#"[true, 30, 1.5, "bob"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Scalar::Bool(true),
                Scalar::Number(Number::Integer(30)),
                Scalar::Number(Number::Double(1.5)),
                Scalar::from("bob"),
            ]
        );
    }

    #[test]
    fn test_hit_term_uses_raw_value() {
        let tuple = ValueTuple::new("AGE", "+bE3", Number::Integer(30));
        assert_eq!(tuple.hit_term(), "AGE:30");
    }
}
