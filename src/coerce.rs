// ABOUTME: Total coercion laws between variant subtypes, plus comparison and numeric promotion

use crate::error::EngineError;
use crate::value::Value;

/// Coerce to Boolean. Numbers are truthy iff nonzero; strings must be exactly
/// "True"/"False" (case-insensitive); Empty is False; Null is not coercible.
pub fn to_bool(v: &Value) -> Result<bool, EngineError> {
    match v {
        Value::Boolean(b) => Ok(*b),
        Value::Empty => Ok(false),
        Value::Byte(n) => Ok(*n != 0),
        Value::Integer(n) => Ok(*n != 0),
        Value::Long(n) => Ok(*n != 0),
        Value::Single(n) => Ok(*n != 0.0),
        Value::Double(n) => Ok(*n != 0.0),
        Value::Currency(n) => Ok(*n != 0),
        Value::Date(d) => Ok(*d != 0.0),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(EngineError::type_mismatch(format!("cannot coerce '{s}' to Boolean"))),
        },
        Value::Null => Err(EngineError::type_mismatch("Null cannot be coerced to Boolean")),
        other => Err(EngineError::type_mismatch(format!("{} cannot be coerced to Boolean", other.type_name()))),
    }
}

/// Coerce to an `f64`, the common numeric representation used for arithmetic and
/// comparisons before re-narrowing to the result's natural type.
pub fn to_f64(v: &Value) -> Result<f64, EngineError> {
    match v {
        Value::Empty => Ok(0.0),
        Value::Boolean(b) => Ok(if *b { -1.0 } else { 0.0 }),
        Value::Byte(n) => Ok(*n as f64),
        Value::Integer(n) => Ok(*n as f64),
        Value::Long(n) => Ok(*n as f64),
        Value::Single(n) => Ok(*n as f64),
        Value::Double(n) => Ok(*n),
        Value::Currency(n) => Ok(*n as f64 / 10_000.0),
        Value::Date(d) => Ok(*d),
        Value::String(s) => parse_numeric_str(s)
            .ok_or_else(|| EngineError::type_mismatch(format!("'{s}' is not numeric"))),
        Value::Null => Err(EngineError::type_mismatch("Null cannot be coerced to a number")),
        other => Err(EngineError::type_mismatch(format!("{} cannot be coerced to a number", other.type_name()))),
    }
}

fn parse_numeric_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(hex) = trimmed.strip_prefix("&H").or_else(|| trimmed.strip_prefix("&h")) {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    if let Some(oct) = trimmed.strip_prefix("&O").or_else(|| trimmed.strip_prefix("&o")) {
        return i64::from_str_radix(oct, 8).ok().map(|n| n as f64);
    }
    trimmed.parse::<f64>().ok()
}

/// Coerce to `Long` (32-bit signed), raising *Overflow* outside range.
pub fn to_long(v: &Value) -> Result<i32, EngineError> {
    let f = to_f64(v)?;
    let rounded = f.round();
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(EngineError::overflow(format!("{f} does not fit in Long")));
    }
    Ok(rounded as i32)
}

/// Coerce to `Integer` (16-bit signed), raising *Overflow* outside range.
pub fn to_integer(v: &Value) -> Result<i16, EngineError> {
    let f = to_f64(v)?;
    let rounded = f.round();
    if rounded < i16::MIN as f64 || rounded > i16::MAX as f64 {
        return Err(EngineError::overflow(format!("{f} does not fit in Integer")));
    }
    Ok(rounded as i16)
}

/// Coerce to `Byte` (0..=255), raising *Overflow* outside range.
pub fn to_byte(v: &Value) -> Result<u8, EngineError> {
    let f = to_f64(v)?;
    let rounded = f.round();
    if !(0.0..=255.0).contains(&rounded) {
        return Err(EngineError::overflow(format!("{f} does not fit in Byte")));
    }
    Ok(rounded as u8)
}

pub fn to_currency(v: &Value) -> Result<i64, EngineError> {
    let f = to_f64(v)?;
    Ok((f * 10_000.0).round() as i64)
}

/// Coerce to String using the dialect's own display rules (not Rust's `Debug`).
pub fn to_display_string(v: &Value) -> Result<String, EngineError> {
    match v {
        Value::Null => Err(EngineError::type_mismatch("Null cannot be coerced to a String")),
        Value::Object(_) => Err(EngineError::type_mismatch("an Object cannot be coerced to a String")),
        Value::Array(_) => Err(EngineError::type_mismatch("an Array cannot be coerced to a String")),
        other => Ok(format!("{other}")),
    }
}

/// `&` concatenation never errors: Null behaves as empty string, everything else stringifies.
pub fn to_concat_string(v: &Value) -> String {
    match v {
        Value::Null | Value::Empty => String::new(),
        other => format!("{other}"),
    }
}

pub fn is_numeric_string(s: &str) -> bool {
    parse_numeric_str(s).is_some()
}

/// The dialect's notion of "truthy for `If`": numbers are compared to zero, booleans
/// pass straight through, strings must parse as Boolean.
pub fn is_truthy(v: &Value) -> Result<bool, EngineError> {
    to_bool(v)
}

/// Numeric promotion used by binary arithmetic: integers combine to `Long` while in
/// range, anything involving a fractional/Double/Single operand promotes to `Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promoted {
    Long,
    Double,
}

pub fn promotion_of(a: &Value, b: &Value) -> Promoted {
    let is_integral = |v: &Value| {
        matches!(v, Value::Byte(_) | Value::Integer(_) | Value::Long(_) | Value::Boolean(_) | Value::Empty)
    };
    if is_integral(a) && is_integral(b) {
        Promoted::Long
    } else {
        Promoted::Double
    }
}

/// Re-narrow an `f64` arithmetic result per the promotion it was computed under.
pub fn narrow(result: f64, promotion: Promoted) -> Value {
    match promotion {
        Promoted::Long if result >= i32::MIN as f64 && result <= i32::MAX as f64 && result.fract() == 0.0 => {
            Value::Long(result as i32)
        }
        _ => Value::Double(result),
    }
}

/// Ordering comparison honouring the dialect's string-vs-numeric dispatch: if either
/// side is a String, compare as (case-insensitive, binary-collation) strings; else compare
/// numerically. Returns `None` when either operand is Null (comparisons involving Null
/// propagate Null rather than a concrete Boolean at the call site).
pub fn compare(a: &Value, b: &Value) -> Result<Option<std::cmp::Ordering>, EngineError> {
    if matches!(a, Value::Null) || matches!(b, Value::Null) {
        return Ok(None);
    }
    if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
        let sa = to_display_string(a)?;
        let sb = to_display_string(b)?;
        Ok(Some(sa.to_lowercase().cmp(&sb.to_lowercase())))
    } else {
        let fa = to_f64(a)?;
        let fb = to_f64(b)?;
        Ok(fa.partial_cmp(&fb))
    }
}

/// Value equality for `=`/`<>`, following the same string-vs-numeric dispatch as `compare`.
pub fn values_equal(a: &Value, b: &Value) -> Result<bool, EngineError> {
    Ok(matches!(compare(a, b)?, Some(std::cmp::Ordering::Equal)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_equality_is_case_insensitive() {
        let a = Value::String("Hello".into());
        let b = Value::String("HELLO".into());
        assert!(values_equal(&a, &b).unwrap());
    }

    #[test]
    fn numeric_strings_coerce_to_numbers() {
        assert_eq!(to_f64(&Value::String("42".into())).unwrap(), 42.0);
        assert!(to_f64(&Value::String("abc".into())).is_err());
    }

    #[test]
    fn hex_and_octal_literals_parse() {
        assert_eq!(to_f64(&Value::String("&HFF".into())).unwrap(), 255.0);
        assert_eq!(to_f64(&Value::String("&O17".into())).unwrap(), 15.0);
    }

    #[test]
    fn overflow_is_detected_on_narrowing_conversions() {
        assert!(to_integer(&Value::Long(100_000)).is_err());
        assert!(to_byte(&Value::Long(-1)).is_err());
    }

    #[test]
    fn promotion_stays_long_for_integral_operands_in_range() {
        assert_eq!(promotion_of(&Value::Long(1), &Value::Integer(2)), Promoted::Long);
        assert_eq!(promotion_of(&Value::Long(1), &Value::Double(2.5)), Promoted::Double);
    }

    #[test]
    fn concat_treats_null_as_empty_string() {
        assert_eq!(to_concat_string(&Value::Null), "");
        assert_eq!(to_concat_string(&Value::Long(5)), "5");
    }

    #[test]
    fn null_comparisons_have_no_ordering() {
        assert_eq!(compare(&Value::Null, &Value::Long(1)).unwrap(), None);
    }
}
