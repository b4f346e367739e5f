//! Numeric operators
//!
//! Operands coerce to `f64`. Strings are parsed; strings that are not finite
//! numbers (including `"NaN"` and `"inf"`) count as `0`. Arrays, objects and null are not comparable.

use serde_json::Value;

use super::expected_items;

/// Coerce a value to `f64`
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(
            s.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
        ),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Compare `actual` against each expected number; true if any comparison holds
pub fn compare(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    let Some(actual) = to_number(actual) else {
        return false;
    };
    expected_items(expected)
        .into_iter()
        .filter_map(to_number)
        .any(|e| cmp(actual, e))
}

/// `NumericEquals`
pub fn equals(actual: &Value, expected: &Value) -> bool {
    compare(actual, expected, |a, e| a == e)
}

/// `NumericNotEquals`: a numeric actual equal to none of the expected values
pub fn not_equals(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = to_number(actual) else {
        return false;
    };
    let expected: Vec<f64> = expected_items(expected).into_iter().filter_map(to_number).collect();
    !expected.is_empty() && expected.iter().all(|e| *e != actual)
}

/// `NumericBetween`: `[min, max]` or `{"min": .., "max": ..}`, inclusive
pub fn between(actual: &Value, expected: &Value) -> bool {
    let Some(actual) = to_number(actual) else {
        return false;
    };
    let bounds = match expected {
        Value::Array(items) if items.len() == 2 => (to_number(&items[0]), to_number(&items[1])),
        Value::Object(map) => (
            map.get("min").and_then(to_number),
            map.get("max").and_then(to_number),
        ),
        _ => return false,
    };
    match bounds {
        (Some(min), Some(max)) => min <= actual && actual <= max,
        _ => false,
    }
}
