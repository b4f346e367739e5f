//! Parsed condition trees
//!
//! A policy condition block is JSON:
//!
//! ```json
//! {
//!   "StringEquals": { "user.department": "engineering" },
//!   "Or": [
//!     { "Bool": { "user.is_admin": true } },
//!     { "IPInRange": { "environment.client_ip": "10.0.0.0/8" } }
//!   ]
//! }
//! ```
//!
//! It is parsed once into a [`ConditionNode`] tree. Parsing is total: malformed
//! pieces become [`ConditionNode::Unsatisfiable`] leaves that evaluate to `false`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::operator::Operator;
use crate::context::{contains_variables, substitute_value, EvaluationContext};

/// A node of a condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// Apply `operator` to the value at `path` and `expected`
    Leaf {
        operator: Operator,
        path: String,
        expected: Value,
    },
    /// All children must hold (empty is `true`)
    And(Vec<ConditionNode>),
    /// At least one child must hold (empty is `false`)
    Or(Vec<ConditionNode>),
    /// Negation
    Not(Box<ConditionNode>),
    /// Malformed input; always `false`
    Unsatisfiable(String),
}

impl ConditionNode {
    /// Parse a condition block
    ///
    /// `null` is an empty block (always `true`); any other non-object is unsatisfiable.
    pub fn parse(block: &Value) -> Self {
        match block {
            Value::Null => Self::And(Vec::new()),
            Value::Object(map) => Self::parse_block(map),
            other => Self::Unsatisfiable(format!("condition block must be an object, got {}", kind(other))),
        }
    }

    /// Maximum nesting depth (a lone leaf has depth 1)
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } | Self::Unsatisfiable(_) => 1,
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::Not(child) => 1 + child.depth(),
        }
    }

    /// Number of operator leaves (condition keys) in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf { .. } | Self::Unsatisfiable(_) => 1,
            Self::And(children) | Self::Or(children) => children.iter().map(Self::leaf_count).sum(),
            Self::Not(child) => child.leaf_count(),
        }
    }

    /// Copy of the tree with `${namespace:key}` variables substituted in expected values
    pub fn substitute(&self, ctx: &EvaluationContext) -> Self {
        match self {
            Self::Leaf { operator, path, expected } => Self::Leaf {
                operator: operator.clone(),
                path: path.clone(),
                expected: substitute_value(expected, ctx),
            },
            Self::And(children) => Self::And(children.iter().map(|c| c.substitute(ctx)).collect()),
            Self::Or(children) => Self::Or(children.iter().map(|c| c.substitute(ctx)).collect()),
            Self::Not(child) => Self::Not(Box::new(child.substitute(ctx))),
            Self::Unsatisfiable(reason) => Self::Unsatisfiable(reason.clone()),
        }
    }

    /// Whether any expected value contains a `${...}` variable
    pub fn has_variables(&self) -> bool {
        match self {
            Self::Leaf { expected, .. } => value_has_variables(expected),
            Self::And(children) | Self::Or(children) => children.iter().any(Self::has_variables),
            Self::Not(child) => child.has_variables(),
            Self::Unsatisfiable(_) => false,
        }
    }

    fn parse_block(map: &Map<String, Value>) -> Self {
        let mut entries: Vec<Self> = map.iter().map(|(key, value)| Self::parse_entry(key, value)).collect();
        if entries.len() == 1 {
            entries.remove(0)
        } else {
            Self::And(entries)
        }
    }

    fn parse_entry(key: &str, value: &Value) -> Self {
        if key.eq_ignore_ascii_case("and") {
            Self::And(Self::parse_children(value))
        } else if key.eq_ignore_ascii_case("or") {
            Self::parse_or(value)
        } else if key.eq_ignore_ascii_case("not") {
            let mut children = Self::parse_children(value);
            let inner = if children.len() == 1 {
                children.remove(0)
            } else {
                Self::And(children)
            };
            Self::Not(Box::new(inner))
        } else {
            Self::parse_operator(key, value)
        }
    }

    fn parse_children(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => Self::parse_block(map),
                    other => Self::Unsatisfiable(format!("logical entry must be an object, got {}", kind(other))),
                })
                .collect(),
            Value::Object(map) => vec![Self::parse_block(map)],
            other => vec![Self::Unsatisfiable(format!(
                "logical operand must be an array or object, got {}",
                kind(other)
            ))],
        }
    }

    fn parse_or(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::Or(map.iter().map(|(key, value)| Self::parse_entry(key, value)).collect()),
            other => Self::Or(Self::parse_children(other)),
        }
    }

    fn parse_operator(name: &str, value: &Value) -> Self {
        let operator = Operator::parse(name);
        let Value::Object(keys) = value else {
            return Self::Unsatisfiable(format!("operator {name} expects an object of path → value"));
        };

        let mut leaves: Vec<Self> = keys
            .iter()
            .map(|(path, expected)| Self::Leaf {
                operator: operator.clone(),
                path: path.clone(),
                expected: expected.clone(),
            })
            .collect();

        if leaves.len() == 1 {
            leaves.remove(0)
        } else {
            Self::And(leaves)
        }
    }
}

fn value_has_variables(value: &Value) -> bool {
    match value {
        Value::String(s) => contains_variables(s),
        Value::Array(items) => items.iter().any(value_has_variables),
        Value::Object(map) => map.values().any(value_has_variables),
        _ => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A statement condition: the raw document plus its parsed tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct Condition {
    raw: Value,
    root: ConditionNode,
    has_variables: bool,
}

impl Condition {
    /// Parse a condition block
    pub fn parse(raw: Value) -> Self {
        let root = ConditionNode::parse(&raw);
        let has_variables = root.has_variables();
        Self { raw, root, has_variables }
    }

    /// Parsed tree
    pub fn root(&self) -> &ConditionNode {
        &self.root
    }

    /// Original JSON block
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Whether the block imposes no restriction
    pub fn is_empty(&self) -> bool {
        matches!(&self.root, ConditionNode::And(children) if children.is_empty())
    }

    /// Whether substitution is needed before evaluation
    pub fn has_variables(&self) -> bool {
        self.has_variables
    }
}

impl From<Value> for Condition {
    fn from(raw: Value) -> Self {
        Self::parse(raw)
    }
}

impl From<Condition> for Value {
    fn from(condition: Condition) -> Self {
        condition.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(op: Operator, path: &str, expected: Value) -> ConditionNode {
        ConditionNode::Leaf {
            operator: op,
            path: path.to_string(),
            expected,
        }
    }

    #[test]
    fn test_single_operator_single_key() {
        let node = ConditionNode::parse(&json!({ "StringEquals": { "user.department": "engineering" } }));
        assert_eq!(node, leaf(Operator::StringEquals, "user.department", json!("engineering")));
    }

    #[test]
    fn test_operator_keys_are_anded() {
        let node = ConditionNode::parse(&json!({
            "StringEquals": { "a": "1", "b": "2" },
            "Bool": { "c": true }
        }));
        let ConditionNode::And(children) = node else {
            panic!("expected And");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[1], ConditionNode::And(keys) if keys.len() == 2));
    }

    #[test]
    fn test_logical_combinators() {
        let node = ConditionNode::parse(&json!({
            "Or": [
                { "Bool": { "x": true } },
                "not-an-object"
            ],
            "Not": { "StringEquals": { "y": "z" } },
            "and": []
        }));
        let ConditionNode::And(children) = node else {
            panic!("expected And");
        };
        assert!(children.contains(&ConditionNode::And(vec![])));
        assert!(children.iter().any(|c| matches!(c, ConditionNode::Not(_))));
        let or = children.iter().find(|c| matches!(c, ConditionNode::Or(_))).unwrap();
        let ConditionNode::Or(branches) = or else { unreachable!() };
        assert!(matches!(branches[1], ConditionNode::Unsatisfiable(_)));
    }

    #[test]
    fn test_or_map_entries() {
        let node = ConditionNode::parse(&json!({
            "Or": {
                "StringEquals": { "a": "1" },
                "Bool": { "b": true }
            }
        }));
        assert!(matches!(node, ConditionNode::Or(ref branches) if branches.len() == 2));
    }

    #[test]
    fn test_malformed_blocks() {
        assert!(matches!(ConditionNode::parse(&json!("x")), ConditionNode::Unsatisfiable(_)));
        assert!(matches!(
            ConditionNode::parse(&json!({ "StringEquals": "oops" })),
            ConditionNode::Unsatisfiable(_)
        ));
        assert_eq!(ConditionNode::parse(&Value::Null), ConditionNode::And(vec![]));
    }

    #[test]
    fn test_depth_and_leaf_count() {
        let node = ConditionNode::parse(&json!({
            "And": [
                { "Or": [ { "Bool": { "a": true } }, { "Bool": { "b": true } } ] },
                { "StringEquals": { "c": "1", "d": "2" } }
            ]
        }));
        assert_eq!(node.depth(), 3);
        assert_eq!(node.leaf_count(), 4);
    }

    #[test]
    fn test_condition_serde_keeps_raw() {
        let raw = json!({ "StringEquals": { "resource.owner": "${request:UserId}" } });
        let condition: Condition = serde_json::from_value(raw.clone()).unwrap();
        assert!(condition.has_variables());
        assert!(!condition.is_empty());
        assert_eq!(serde_json::to_value(&condition).unwrap(), raw);
    }

    #[test]
    fn test_empty_condition() {
        let condition = Condition::parse(json!({}));
        assert!(condition.is_empty());
        assert!(!condition.has_variables());
    }
}
