//! Tolerant numeric parsing for values typed into the underwriting grids.
//!
//! Underwriting data is entered a keystroke at a time, so a numeric field may
//! arrive as a JSON number, a comma-formatted string (`"1,000,000"`), an empty
//! string, `null`, or something else entirely. None of these are errors:
//! anything that does not parse is treated as absent.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse a user-entered number, ignoring thousands separators, currency and
/// percent signs, and whitespace. Returns `None` when nothing numeric remains.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// [`parse_decimal`] with the engine's fallback of zero.
pub fn decimal_or_zero(raw: &str) -> Decimal {
    parse_decimal(raw).unwrap_or(Decimal::ZERO)
}

fn decimal_from_f64(v: f64) -> Option<Decimal> {
    if !v.is_finite() {
        return None;
    }
    // Display gives the shortest round-trip form, so 0.1 stays 0.1.
    Decimal::from_str(&v.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(v))
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = Option<Decimal>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string, or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(decimal_from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(parse_decimal(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(None)
    }
}

/// `deserialize_with` adapter: any unparseable value becomes zero.
pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    Ok(deserializer
        .deserialize_any(LenientVisitor)?
        .unwrap_or(Decimal::ZERO))
}

/// `deserialize_with` adapter: any unparseable value becomes `None`.
pub fn optional_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    deserializer.deserialize_any(LenientVisitor)
}

/// `deserialize_with` adapter for month columns. Fractions truncate; anything
/// unparseable becomes 0, which the evaluator treats as "unset".
pub fn month<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(deserializer
        .deserialize_any(LenientVisitor)?
        .and_then(|d| d.trunc().to_i32())
        .unwrap_or(0))
}

struct IdentifierVisitor;

impl<'de> Visitor<'de> for IdentifierVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(String::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(String::new())
    }
}

/// `deserialize_with` adapter for row ids, which the grids emit either as
/// UUID strings or as integers.
pub fn identifier<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(IdentifierVisitor)
}

/// `deserialize_with` adapter for free-text columns that may be `null`.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A keyed model value whose raw form may be a number or a formatted string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValue(#[serde(deserialize_with = "optional_decimal")] pub Option<Decimal>);

impl FieldValue {
    pub fn value(&self) -> Option<Decimal> {
        self.0
    }
}

impl From<Decimal> for FieldValue {
    fn from(d: Decimal) -> Self {
        FieldValue(Some(d))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue(parse_decimal(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Deserialize)]
    struct SampleRow {
        #[serde(default, deserialize_with = "decimal")]
        amount: Decimal,
        #[serde(default, deserialize_with = "optional_decimal")]
        statistic: Option<Decimal>,
        #[serde(default, deserialize_with = "month")]
        start_month: i32,
    }

    fn sample_row(json: &str) -> SampleRow {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_comma_formatted() {
        assert_eq!(parse_decimal("1,000,000"), Some(dec!(1000000)));
        assert_eq!(parse_decimal(" $2,500.50 "), Some(dec!(2500.50)));
        assert_eq!(parse_decimal("7.5%"), Some(dec!(7.5)));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("N/A"), None);
        assert_eq!(parse_decimal("12abc"), None);
        assert_eq!(decimal_or_zero("abc"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(parse_decimal("1e3"), Some(dec!(1000)));
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let p = sample_row(r#"{"amount": 0.1, "statistic": "20", "start_month": 3}"#);
        assert_eq!(p.amount, dec!(0.1));
        assert_eq!(p.statistic, Some(dec!(20)));
        assert_eq!(p.start_month, 3);
    }

    #[test]
    fn test_deserialize_null_and_missing() {
        let p = sample_row(r#"{"amount": null, "statistic": null}"#);
        assert_eq!(p.amount, Decimal::ZERO);
        assert_eq!(p.statistic, None);
        assert_eq!(p.start_month, 0);
    }

    #[test]
    fn test_deserialize_nested_junk_is_absorbed() {
        let p = sample_row(r#"{"amount": [1, 2], "statistic": {"x": 1}, "start_month": "soon"}"#);
        assert_eq!(p.amount, Decimal::ZERO);
        assert_eq!(p.statistic, None);
        assert_eq!(p.start_month, 0);
    }

    #[test]
    fn test_month_truncates_fraction() {
        let p = sample_row(r#"{"start_month": 4.9}"#);
        assert_eq!(p.start_month, 4);
    }

    #[test]
    fn test_field_value_transparent() {
        let v: FieldValue = serde_json::from_str(r#""1,000,000""#).unwrap();
        assert_eq!(v.value(), Some(dec!(1000000)));
        let v: FieldValue = serde_json::from_str("null").unwrap();
        assert_eq!(v.value(), None);
    }
}
