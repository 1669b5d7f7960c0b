//! Numeric values carried through evaluation.
//!
//! Numbers keep the precision class they were indexed or written with. Comparisons and
//! arithmetic promote the lower-precision operand to the higher-precision class observed on
//! the other side, using the ordering
//! `BigDecimal > BigInteger > Double > Float > Long > Integer > Short > Byte`.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Precision class of a [`Number`], ordered from lowest to highest precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumberKind {
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
}

impl NumberKind {
    fn is_floating(self) -> bool {
        matches!(self, NumberKind::Float | NumberKind::Double)
    }

    fn is_integral(self) -> bool {
        matches!(
            self,
            NumberKind::Byte
                | NumberKind::Short
                | NumberKind::Integer
                | NumberKind::Long
                | NumberKind::BigInteger
        )
    }

    /// Common class two operands are promoted to.
    ///
    /// A fractional operand is never truncated into `BigInteger`; that pairing widens to
    /// `BigDecimal` instead.
    pub fn promote(self, other: NumberKind) -> NumberKind {
        let target = self.max(other);
        if target == NumberKind::BigInteger && (self.is_floating() || other.is_floating()) {
            NumberKind::BigDecimal
        } else {
            target
        }
    }
}

/// A typed numeric value.
#[derive(Debug, Clone)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(BigInt),
    Float(f32),
    Double(f64),
    BigDecimal(Decimal),
}

impl Number {
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::Byte(_) => NumberKind::Byte,
            Number::Short(_) => NumberKind::Short,
            Number::Integer(_) => NumberKind::Integer,
            Number::Long(_) => NumberKind::Long,
            Number::BigInteger(_) => NumberKind::BigInteger,
            Number::Float(_) => NumberKind::Float,
            Number::Double(_) => NumberKind::Double,
            Number::BigDecimal(_) => NumberKind::BigDecimal,
        }
    }

    /// Parse a plain (non-encoded) numeric string, choosing the narrowest fitting class.
    pub fn parse(text: &str) -> Option<Number> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(v) = text.parse::<i64>() {
            return Some(match i32::try_from(v) {
                Ok(v) => Number::Integer(v),
                Err(_) => Number::Long(v),
            });
        }

        let digits = text.strip_prefix('-').unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return BigInt::from_str(text).ok().map(Number::BigInteger);
        }

        // Reject "inf", "NaN" and friends, which f64 parsing accepts.
        if !text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        {
            return None;
        }
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Number::Double)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Byte(v) => *v == 0,
            Number::Short(v) => *v == 0,
            Number::Integer(v) => *v == 0,
            Number::Long(v) => *v == 0,
            Number::BigInteger(v) => v.is_zero(),
            Number::Float(v) => *v == 0.0,
            Number::Double(v) => *v == 0.0,
            Number::BigDecimal(v) => v.is_zero(),
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Number::Byte(v) => Some(i64::from(*v)),
            Number::Short(v) => Some(i64::from(*v)),
            Number::Integer(v) => Some(i64::from(*v)),
            Number::Long(v) => Some(*v),
            Number::BigInteger(v) => v.to_i64(),
            Number::Float(v) => integral_f64(f64::from(*v)),
            Number::Double(v) => integral_f64(*v),
            Number::BigDecimal(v) => {
                if v.fract().is_zero() {
                    v.to_i64()
                } else {
                    None
                }
            }
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Number::Byte(v) => Some(f64::from(*v)),
            Number::Short(v) => Some(f64::from(*v)),
            Number::Integer(v) => Some(f64::from(*v)),
            Number::Long(v) => Some(*v as f64),
            Number::BigInteger(v) => v.to_f64(),
            Number::Float(v) => Some(f64::from(*v)),
            Number::Double(v) => Some(*v),
            Number::BigDecimal(v) => v.to_f64(),
        }
    }

    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Number::BigInteger(v) => Some(v.clone()),
            Number::BigDecimal(v) => {
                if v.fract().is_zero() {
                    BigInt::from_str(&v.trunc().to_string()).ok()
                } else {
                    None
                }
            }
            Number::Float(_) | Number::Double(_) => {
                let v = self.to_f64()?;
                if v.fract() == 0.0 {
                    BigInt::from_f64(v)
                } else {
                    None
                }
            }
            _ => self.to_i64().map(BigInt::from),
        }
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Number::BigDecimal(v) => Some(*v),
            Number::BigInteger(v) => Decimal::from_str(&v.to_string()).ok(),
            Number::Float(v) => Decimal::from_f32(*v),
            Number::Double(v) => Decimal::from_f64(*v),
            _ => self.to_i64().map(Decimal::from),
        }
    }

    /// Compare two numbers after promoting both to their common precision class.
    ///
    /// Returns `None` when the values are not comparable (NaN, or a value that cannot be
    /// represented in the promoted class).
    pub fn compare(&self, other: &Number) -> Option<Ordering> {
        let target = self.kind().promote(other.kind());
        match target {
            NumberKind::Byte | NumberKind::Short | NumberKind::Integer | NumberKind::Long => {
                Some(self.to_i64()?.cmp(&other.to_i64()?))
            }
            NumberKind::Float | NumberKind::Double => self.to_f64()?.partial_cmp(&other.to_f64()?),
            NumberKind::BigInteger => Some(self.to_bigint()?.cmp(&other.to_bigint()?)),
            NumberKind::BigDecimal => match (self.to_decimal(), other.to_decimal()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                // Out of Decimal range: fall back to double precision.
                _ => self.to_f64()?.partial_cmp(&other.to_f64()?),
            },
        }
    }

    pub fn checked_add(&self, other: &Number) -> Option<Number> {
        self.combine(other, i64::checked_add, |a, b| a + b, |a, b| a + b, Decimal::checked_add)
    }

    pub fn checked_sub(&self, other: &Number) -> Option<Number> {
        self.combine(other, i64::checked_sub, |a, b| a - b, |a, b| a - b, Decimal::checked_sub)
    }

    fn combine(
        &self,
        other: &Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
        big_op: fn(BigInt, BigInt) -> BigInt,
        dec_op: fn(Decimal, Decimal) -> Option<Decimal>,
    ) -> Option<Number> {
        let target = self.kind().promote(other.kind());
        match target {
            NumberKind::Byte | NumberKind::Short | NumberKind::Integer | NumberKind::Long => {
                let (a, b) = (self.to_i64()?, other.to_i64()?);
                match int_op(a, b) {
                    Some(v) if target == NumberKind::Long => Some(Number::Long(v)),
                    Some(v) => Some(
                        i32::try_from(v)
                            .map(Number::Integer)
                            .unwrap_or(Number::Long(v)),
                    ),
                    // Overflow widens instead of wrapping.
                    None => Some(Number::BigInteger(big_op(BigInt::from(a), BigInt::from(b)))),
                }
            }
            NumberKind::Float => {
                let v = float_op(self.to_f64()?, other.to_f64()?);
                Some(Number::Float(v as f32))
            }
            NumberKind::Double => {
                Some(Number::Double(float_op(self.to_f64()?, other.to_f64()?)))
            }
            NumberKind::BigInteger => Some(Number::BigInteger(big_op(
                self.to_bigint()?,
                other.to_bigint()?,
            ))),
            NumberKind::BigDecimal => {
                dec_op(self.to_decimal()?, other.to_decimal()?).map(Number::BigDecimal)
            }
        }
    }

    pub fn is_integral(&self) -> bool {
        self.kind().is_integral()
    }
}

fn integral_f64(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Byte(v) => write!(f, "{}", v),
            Number::Short(v) => write!(f, "{}", v),
            Number::Integer(v) => write!(f, "{}", v),
            Number::Long(v) => write!(f, "{}", v),
            Number::BigInteger(v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{}", v),
            Number::Double(v) => write!(f, "{}", v),
            Number::BigDecimal(v) => write!(f, "{}", v),
        }
    }
}

// Structural equality: same class, same bits. Cross-class equality is the job of
// `Number::compare`.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Byte(a), Number::Byte(b)) => a == b,
            (Number::Short(a), Number::Short(b)) => a == b,
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Long(a), Number::Long(b)) => a == b,
            (Number::BigInteger(a), Number::BigInteger(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a.to_bits() == b.to_bits(),
            (Number::Double(a), Number::Double(b)) => a.to_bits() == b.to_bits(),
            (Number::BigDecimal(a), Number::BigDecimal(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Number::Byte(v) => v.hash(state),
            Number::Short(v) => v.hash(state),
            Number::Integer(v) => v.hash(state),
            Number::Long(v) => v.hash(state),
            Number::BigInteger(v) => v.hash(state),
            Number::Float(v) => v.to_bits().hash(state),
            Number::Double(v) => v.to_bits().hash(state),
            Number::BigDecimal(v) => v.hash(state),
        }
    }
}

impl From<i8> for Number {
    fn from(v: i8) -> Self {
        Number::Byte(v)
    }
}

impl From<i16> for Number {
    fn from(v: i16) -> Self {
        Number::Short(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Integer(v)
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Long(v)
    }
}

impl From<BigInt> for Number {
    fn from(v: BigInt) -> Self {
        Number::BigInteger(v)
    }
}

impl From<f32> for Number {
    fn from(v: f32) -> Self {
        Number::Float(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Double(v)
    }
}

impl From<Decimal> for Number {
    fn from(v: Decimal) -> Self {
        Number::BigDecimal(v)
    }
}

// JSON carries integers and doubles natively; the wide classes travel as strings inside
// `{"bigint": ".."}` / `{"decimal": ".."}` objects so they survive a round trip.
impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match self {
            Number::Byte(v) => serializer.serialize_i8(*v),
            Number::Short(v) => serializer.serialize_i16(*v),
            Number::Integer(v) => serializer.serialize_i32(*v),
            Number::Long(v) => serializer.serialize_i64(*v),
            Number::Float(v) => serializer.serialize_f32(*v),
            Number::Double(v) => serializer.serialize_f64(*v),
            Number::BigInteger(v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("bigint", &v.to_string())?;
                map.end()
            }
            Number::BigDecimal(v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("decimal", &v.to_string())?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumberVisitor;

        impl<'de> Visitor<'de> for NumberVisitor {
            type Value = Number;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number, or a {\"bigint\"|\"decimal\": string} object")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Number, E> {
                Ok(i32::try_from(v)
                    .map(Number::Integer)
                    .unwrap_or(Number::Long(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Number, E> {
                match i64::try_from(v) {
                    Ok(v) => self.visit_i64(v),
                    Err(_) => Ok(Number::BigInteger(BigInt::from(v))),
                }
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Number, E> {
                Ok(Number::Double(v))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Number, A::Error> {
                let (key, text): (String, String) = map
                    .next_entry()?
                    .ok_or_else(|| de::Error::custom("empty number object"))?;
                match key.as_str() {
                    "bigint" => BigInt::from_str(&text)
                        .map(Number::BigInteger)
                        .map_err(de::Error::custom),
                    "decimal" => Decimal::from_str(&text)
                        .map(Number::BigDecimal)
                        .map_err(de::Error::custom),
                    other => Err(de::Error::unknown_field(other, &["bigint", "decimal"])),
                }
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_order() {
        assert_eq!(NumberKind::Integer.promote(NumberKind::Long), NumberKind::Long);
        assert_eq!(NumberKind::Long.promote(NumberKind::Float), NumberKind::Float);
        assert_eq!(NumberKind::Double.promote(NumberKind::Float), NumberKind::Double);
        assert_eq!(
            NumberKind::BigInteger.promote(NumberKind::Long),
            NumberKind::BigInteger
        );
        assert_eq!(
            NumberKind::BigInteger.promote(NumberKind::Double),
            NumberKind::BigDecimal
        );
    }

    #[test]
    fn test_cross_class_compare() {
        assert_eq!(
            Number::Integer(30).compare(&Number::Double(30.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Number::Long(5).compare(&Number::BigDecimal(Decimal::new(55, 1))),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::BigInteger(BigInt::from(10)).compare(&Number::Double(9.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Number::Double(f64::NAN).compare(&Number::Integer(1)), None);
    }

    #[test]
    fn test_parse_picks_narrowest_class() {
        assert_eq!(Number::parse("42"), Some(Number::Integer(42)));
        assert_eq!(Number::parse("4000000000"), Some(Number::Long(4_000_000_000)));
        assert!(matches!(
            Number::parse("123456789012345678901234567890"),
            Some(Number::BigInteger(_))
        ));
        assert_eq!(Number::parse("1.5"), Some(Number::Double(1.5)));
        assert_eq!(Number::parse("NaN"), None);
        assert_eq!(Number::parse("bob"), None);
    }

    #[test]
    fn test_overflow_widens() {
        let sum = Number::Long(i64::MAX).checked_add(&Number::Long(1)).unwrap();
        assert_eq!(sum.kind(), NumberKind::BigInteger);
    }
}
