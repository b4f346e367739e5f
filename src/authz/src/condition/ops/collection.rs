//! Array operators

use serde_json::Value;

use super::numeric::to_number;
use super::{as_text, expected_items};

/// Loose equality: identical JSON, or equal scalar text (`1` equals `"1"`)
fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_text(a), as_text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn contains_value(haystack: &[Value], needle: &Value) -> bool {
    haystack.iter().any(|item| loosely_equal(item, needle))
}

/// `ArrayContains`: the actual array contains any expected value
pub fn contains(actual: &Value, expected: &Value) -> bool {
    let Some(items) = actual.as_array() else {
        return false;
    };
    expected_items(expected)
        .into_iter()
        .any(|needle| contains_value(items, needle))
}

/// `ArrayNotContains`: the actual array contains none of the expected values
pub fn not_contains(actual: &Value, expected: &Value) -> bool {
    let Some(items) = actual.as_array() else {
        return false;
    };
    expected_items(expected)
        .into_iter()
        .all(|needle| !contains_value(items, needle))
}

/// `ArraySize`: a literal size, or `{op: value}` comparisons (all must hold)
///
/// Comparison keys: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`.
pub fn size(actual: &Value, expected: &Value) -> bool {
    let Some(items) = actual.as_array() else {
        return false;
    };
    let len = items.len() as f64;

    match expected {
        Value::Object(comparisons) if !comparisons.is_empty() => comparisons.iter().all(|(op, value)| {
            let Some(target) = to_number(value) else {
                return false;
            };
            match op.as_str() {
                "eq" => len == target,
                "ne" => len != target,
                "gt" => len > target,
                "gte" => len >= target,
                "lt" => len < target,
                "lte" => len <= target,
                _ => false,
            }
        }),
        Value::Number(_) | Value::String(_) => to_number(expected).is_some_and(|n| n == len),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains() {
        let roles = json!(["admin", "editor", 7]);
        assert!(contains(&roles, &json!("admin")));
        assert!(contains(&roles, &json!(["viewer", "editor"])));
        assert!(contains(&roles, &json!("7")));
        assert!(!contains(&roles, &json!("viewer")));
        assert!(!contains(&json!("admin"), &json!("admin")));
    }

    #[test]
    fn test_not_contains() {
        let roles = json!(["admin", "editor"]);
        assert!(not_contains(&roles, &json!("viewer")));
        assert!(!not_contains(&roles, &json!(["viewer", "admin"])));
        assert!(!not_contains(&json!(null), &json!("viewer")));
    }

    #[test]
    fn test_size() {
        let items = json!([1, 2, 3]);
        assert!(size(&items, &json!(3)));
        assert!(size(&items, &json!("3")));
        assert!(!size(&items, &json!(2)));
        assert!(size(&items, &json!({ "gte": 2, "lt": 4 })));
        assert!(!size(&items, &json!({ "gt": 3 })));
        assert!(size(&items, &json!({ "ne": 0 })));
        assert!(!size(&items, &json!({ "between": 3 })));
        assert!(!size(&items, &json!({})));
        assert!(!size(&json!("abc"), &json!(3)));
    }
}
