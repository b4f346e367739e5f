//! Operator implementations, grouped by family
//!
//! Every function takes the resolved actual value (never absent; the evaluator
//! fails absent operands before dispatch) and the expected value from the policy,
//! and returns `false` on any type mismatch.

pub mod collection;
pub mod network;
pub mod numeric;
pub mod string;
pub mod temporal;

use serde_json::Value;
use std::borrow::Cow;

/// Textual form of a scalar value
pub(crate) fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Expected values as a list: arrays expand, scalars stand alone
pub(crate) fn expected_items(expected: &Value) -> Vec<&Value> {
    match expected {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Boolean coercion: literal bools, `"true"`/`"false"` (any case), nonzero numbers
pub(crate) fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

/// `Bool` operator
pub fn bool_equals(actual: &Value, expected: &Value) -> bool {
    match (to_bool(actual), to_bool(expected)) {
        (Some(a), Some(e)) => a == e,
        _ => false,
    }
}
