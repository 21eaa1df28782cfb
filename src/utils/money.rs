//! Lenient serde codec for money fields
//!
//! Loan documents come from several generations of clients and from hand
//! edits, so a money field may arrive as a JSON number, a numeric string,
//! `null`, or something else entirely. Anything that is not a finite number
//! in money range decodes to zero instead of failing the whole document.
//! Values are always written back as JSON numbers.

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;
use std::str::FromStr;

/// Longest coefficient accepted from text
pub const MAX_DIGITS: u64 = 64;
/// Largest number of digits before the decimal point
pub const MAX_INTEGER_DIGITS: i64 = 30;
/// Finer fractions are truncated to this many places
pub const MAX_SCALE: i64 = 18;

/// Parse a decimal from user-ish text, falling back to zero
///
/// Values beyond [`MAX_INTEGER_DIGITS`] integer digits or with an oversized
/// coefficient are zero; anything below `1e-18` is zero.
pub fn parse_lenient(text: &str) -> BigDecimal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return BigDecimal::zero();
    }
    BigDecimal::from_str(trimmed)
        .ok()
        .and_then(bounded)
        .unwrap_or_else(BigDecimal::zero)
}

/// Clamp a parsed value to money range before any arithmetic rescales it
fn bounded(value: BigDecimal) -> Option<BigDecimal> {
    let digits = value.digits();
    if digits > MAX_DIGITS {
        return None;
    }
    let digits = digits as i64;
    let (_, scale) = value.as_bigint_and_exponent();

    // magnitude is below 10^(digits - scale)
    if digits.saturating_sub(scale) > MAX_INTEGER_DIGITS {
        return None;
    }
    if scale.saturating_sub(digits) >= MAX_SCALE {
        return Some(BigDecimal::zero());
    }
    if scale > MAX_SCALE {
        return Some(value.with_scale(MAX_SCALE));
    }
    Some(value)
}

/// Convert a float to a decimal using its shortest round-trip representation
pub fn from_f64_lenient(value: f64) -> BigDecimal {
    if !value.is_finite() {
        return BigDecimal::zero();
    }
    parse_lenient(&value.to_string())
}

pub fn serialize<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.to_f64().unwrap_or(0.0))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientMoney)
}

struct LenientMoney;

impl<'de> Visitor<'de> for LenientMoney {
    type Value = BigDecimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a monetary amount")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(from_f64_lenient(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(parse_lenient(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(BigDecimal::zero())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BigDecimal::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BigDecimal::zero())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(LenientMoney)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(BigDecimal::zero())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(BigDecimal::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(default, with = "super")]
        value: BigDecimal,
    }

    fn decode(json: &str) -> BigDecimal {
        serde_json::from_str::<Wrapper>(json).unwrap().value
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        assert_eq!(decode(r#"{"value": 80}"#), BigDecimal::from(80));
        assert_eq!(decode(r#"{"value": 0.1}"#), BigDecimal::from_str("0.1").unwrap());
        assert_eq!(decode(r#"{"value": " 12.50 "}"#), BigDecimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_malformed_values_become_zero() {
        assert_eq!(decode(r#"{"value": null}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": "abc"}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": true}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": [1, 2]}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": {"x": 1}}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{}"#), BigDecimal::zero());
    }

    #[test]
    fn test_out_of_range_values_become_zero() {
        assert_eq!(decode(r#"{"value": "1e2000000"}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": "1e200000000"}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": "-1e40"}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": "1e-2000000"}"#), BigDecimal::zero());
        assert_eq!(decode(r#"{"value": 1e300}"#), BigDecimal::zero());
        assert_eq!(parse_lenient(&"9".repeat(65)), BigDecimal::zero());
    }

    #[test]
    fn test_large_but_sane_values_survive() {
        assert_eq!(decode(r#"{"value": "2.5e6"}"#), BigDecimal::from(2_500_000));
        assert_eq!(
            decode(r#"{"value": "123456789012345678901234567890"}"#),
            BigDecimal::from_str("123456789012345678901234567890").unwrap()
        );
        assert_eq!(
            decode(r#"{"value": "0.12345678901234567891"}"#),
            BigDecimal::from_str("0.123456789012345678").unwrap()
        );
    }

    #[test]
    fn test_huge_exponent_does_not_blow_up_totals() {
        let json = r#"{"id": "01/2024", "history": [
            {"amount": "1e2000000", "type": "Amortização"},
            {"amount": 1, "type": "Amortização"}
        ]}"#;
        let loan: crate::types::Loan = serde_json::from_str(json).unwrap();

        let loan = crate::reconciliation::ReconciliationService::default().reconcile(loan);
        assert_eq!(loan.total_paid_capital, BigDecimal::from(1));
    }

    #[test]
    fn test_written_as_json_number() {
        let wrapper = Wrapper {
            value: BigDecimal::from_str("920.5").unwrap(),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert_eq!(json, r#"{"value":920.5}"#);
    }
}
