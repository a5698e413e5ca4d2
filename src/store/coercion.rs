//! Read-time value coercion.
//!
//! Values that travelled through JSON text or through older string-only
//! backends arrive as strings. Reads normalize them back into typed values
//! with a fixed precedence:
//!
//! 1. `"true"` / `true` and `"false"` / `false` become booleans
//! 2. `"undefined"` becomes `None`
//! 3. `"null"` / `null` become `null`
//! 4. `""` stays the empty string
//! 5. arrays pass through untouched
//! 6. number-like values become numbers
//! 7. everything else is returned as stored
//!
//! The coercion is lossy by nature: a string `"42"` that was meant to stay
//! a string reads back as the number `42`.

use serde_json::{Number, Value};

/// Largest integer a float holds without rounding (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Coerces a stored value into its typed form.
///
/// Returns `None` for the `"undefined"` sentinel.
pub fn coerce(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Null => Some(Value::Null),
        Value::String(s) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            "undefined" => None,
            "null" => Some(Value::Null),
            "" => Some(Value::String(String::new())),
            text => Some(parse_number(text).unwrap_or_else(|| value.clone())),
        },
        Value::Array(_) | Value::Number(_) | Value::Object(_) => Some(value.clone()),
    }
}

/// Parses text the way a JavaScript `Number()` conversion does.
///
/// Returns `None` when the text is not numeric or the result is not finite.
pub fn parse_number(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Value::from(0));
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &trimmed[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        return u64::from_str_radix(digits, radix)
            .ok()
            .map(|n| number_value(n as f64));
    }

    // f64's parser also accepts "inf" and "nan"; JS literals never contain letters besides the exponent
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(number_value)
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Reads a timestamp (epoch millis) stored as a number or numeric string.
pub(crate) fn as_millis(value: &Value) -> Option<f64> {
    match coerce(value)? {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
