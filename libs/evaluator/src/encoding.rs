//! Sortable string encoding of numbers, as written into the index.
//!
//! An encoded number is `<sign><exponent>E<mantissa>`:
//!
//! - sign is `+` for zero and positive values, `!` for negative ones (`!` sorts before `+`),
//! - exponent is the base-10 exponent of the normalized mantissa, mapped to a letter so that
//!   letters sort in exponent order (`A`..`Z` for -26..-1 and `a`..`z` for 0..25 when
//!   positive; reversed for negative values),
//! - mantissa is `1 <= m < 10` for positive values and `10 - m` for negative ones.
//!
//! Zero encodes as `+AE0`. Byte-wise ordering of encoded strings equals numeric ordering.

use crate::number::Number;
use rust_decimal::Decimal;
use std::str::FromStr;

const MIN_EXPONENT: i32 = -26;
const MAX_EXPONENT: i32 = 25;
const ZERO: &str = "+AE0";

/// Encode a number. Returns `None` for non-finite values and for magnitudes whose exponent
/// falls outside `-26..=25`.
pub fn encode(number: &Number) -> Option<String> {
    encode_decimal(number.to_decimal()?)
}

pub fn encode_decimal(value: Decimal) -> Option<String> {
    if value.is_zero() {
        return Some(ZERO.to_string());
    }

    let negative = value.is_sign_negative();
    let (exponent, mantissa) = split_scientific(value.abs())?;
    if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        return None;
    }

    if negative {
        let complement = (Decimal::TEN - Decimal::from_str(&mantissa).ok()?).normalize();
        Some(format!("!{}E{}", negative_exponent_char(exponent), complement))
    } else {
        Some(format!("+{}E{}", positive_exponent_char(exponent), mantissa))
    }
}

/// Decode an encoded number. Returns `None` if `text` is not a well-formed encoding.
pub fn decode(text: &str) -> Option<Decimal> {
    let bytes = text.as_bytes();
    if bytes.len() < 4 || bytes[2] != b'E' {
        return None;
    }
    let mantissa = Decimal::from_str(&text[3..]).ok()?;
    if mantissa.is_sign_negative() || mantissa >= Decimal::TEN {
        return None;
    }

    let (negative, exponent) = match bytes[0] {
        b'+' => (false, positive_exponent(bytes[1])?),
        b'!' => (true, negative_exponent(bytes[1])?),
        _ => return None,
    };

    if negative {
        scale(Decimal::TEN - mantissa, exponent).map(|v| -v)
    } else {
        scale(mantissa, exponent)
    }
}

/// Whether `text` is a well-formed encoded number.
pub fn is_encoded(text: &str) -> bool {
    decode(text).is_some()
}

/// Split a positive decimal into (exponent, normalized mantissa text).
fn split_scientific(value: Decimal) -> Option<(i32, String)> {
    let text = value.normalize().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text.as_str(), ""),
    };

    let (exponent, digits) = if int_part != "0" {
        let exponent = i32::try_from(int_part.len()).ok()? - 1;
        (exponent, format!("{}{}", int_part, frac_part))
    } else {
        let leading = frac_part.bytes().take_while(|b| *b == b'0').count();
        let exponent = -(i32::try_from(leading).ok()? + 1);
        (exponent, frac_part[leading..].to_string())
    };

    let digits = digits.trim_end_matches('0');
    let (first, rest) = digits.split_at(1.min(digits.len()));
    if first.is_empty() {
        return None;
    }
    let mantissa = if rest.is_empty() {
        first.to_string()
    } else {
        format!("{}.{}", first, rest)
    };
    Some((exponent, mantissa))
}

fn scale(mantissa: Decimal, exponent: i32) -> Option<Decimal> {
    if exponent >= 0 {
        let factor = Decimal::from_i128_with_scale(10i128.checked_pow(exponent as u32)?, 0);
        mantissa.checked_mul(factor)
    } else {
        mantissa.checked_mul(Decimal::new(1, exponent.unsigned_abs()))
    }
}

fn positive_exponent_char(exponent: i32) -> char {
    if exponent >= 0 {
        (b'a' + exponent as u8) as char
    } else {
        (b'A' + (exponent - MIN_EXPONENT) as u8) as char
    }
}

fn negative_exponent_char(exponent: i32) -> char {
    if exponent >= 0 {
        (b'Z' - exponent as u8) as char
    } else {
        (b'z' - (exponent - MIN_EXPONENT) as u8) as char
    }
}

fn positive_exponent(c: u8) -> Option<i32> {
    match c {
        b'a'..=b'z' => Some(i32::from(c - b'a')),
        b'A'..=b'Z' => Some(i32::from(c - b'A') + MIN_EXPONENT),
        _ => None,
    }
}

fn negative_exponent(c: u8) -> Option<i32> {
    match c {
        b'A'..=b'Z' => Some(i32::from(b'Z' - c)),
        b'a'..=b'z' => Some(i32::from(b'z' - c) + MIN_EXPONENT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(v: &str) -> String {
        encode_decimal(Decimal::from_str(v).unwrap()).unwrap()
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(enc("0"), "+AE0");
        assert_eq!(enc("1"), "+aE1");
        assert_eq!(enc("25"), "+bE2.5");
        assert_eq!(enc("30"), "+bE3");
        assert_eq!(enc("0.015"), "+YE1.5");
        assert_eq!(enc("-1"), "!ZE9");
        assert_eq!(enc("-25"), "!YE7.5");
    }

    #[test]
    fn test_decode_inverts_encode() {
        for v in ["0", "1", "25", "-25", "0.015", "-0.5", "123456.789", "-98000"] {
            let d = Decimal::from_str(v).unwrap();
            assert_eq!(decode(&enc(v)), Some(d), "value {}", v);
        }
    }

    #[test]
    fn test_ordering_preserved() {
        let values = ["-1000", "-25", "-1.5", "-1", "-0.01", "0", "0.01", "1", "1.5", "25", "1000"];
        let encoded: Vec<String> = values.iter().map(|v| enc(v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn test_rejects_plain_strings() {
        assert!(!is_encoded("bob"));
        assert!(!is_encoded("30"));
        assert!(!is_encoded("+bX3"));
        assert!(is_encoded("+bE3"));
    }
}
