//! `${namespace:key}` variable substitution
//!
//! Variables are resolved with direct-lookup semantics (literal key, then the
//! `namespace:key` alias). Anything that cannot be resolved stays in the text
//! verbatim; substitution never fails.

use serde_json::Value;

use super::EvaluationContext;

/// Substitute variables in an expected value, recursing through maps and arrays
///
/// A string consisting of exactly one variable takes the resolved value with its
/// JSON type (`"${user:level}"` → `3`); variables embedded in longer text splice
/// in the scalar's textual form. The input is never modified.
pub fn substitute_value(value: &Value, ctx: &EvaluationContext) -> Value {
    match value {
        Value::String(text) => substitute_typed(text, ctx),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_value(v, ctx)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, ctx)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Substitute variables in a pattern, accepting only string values
///
/// Used for resource patterns, where numbers or objects must not leak into a
/// resource identifier.
pub fn substitute_pattern(pattern: &str, ctx: &EvaluationContext) -> String {
    if !contains_variables(pattern) {
        return pattern.to_string();
    }
    replace_variables(pattern, |name| {
        lookup(ctx, name).and_then(Value::as_str).map(str::to_string)
    })
}

/// Whether the text contains a `${...}` token
pub fn contains_variables(text: &str) -> bool {
    text.find("${")
        .is_some_and(|start| text[start..].contains('}'))
}

fn substitute_typed(text: &str, ctx: &EvaluationContext) -> Value {
    if !contains_variables(text) {
        return Value::String(text.to_string());
    }

    if let Some(name) = whole_variable(text) {
        if let Some(value) = lookup(ctx, name) {
            return value.clone();
        }
        return Value::String(text.to_string());
    }

    Value::String(replace_variables(text, |name| lookup(ctx, name).and_then(scalar_text)))
}

fn lookup<'a>(ctx: &'a EvaluationContext, name: &str) -> Option<&'a Value> {
    ctx.flat(name.trim()).filter(|v| !v.is_null())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The variable name when `text` is exactly one `${...}` token
fn whole_variable(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("${")?.strip_suffix('}')?;
    (!inner.is_empty() && !inner.contains('}') && !inner.contains("${")).then_some(inner)
}

fn replace_variables(text: &str, mut resolve: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        out.push_str(&rest[..start]);

        let resolved = if name.is_empty() { None } else { resolve(name) };
        match resolved {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + end + 3]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
