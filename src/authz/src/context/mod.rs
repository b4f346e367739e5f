//! Evaluation context and attribute path resolution
//!
//! The context is stored once, in canonical nested form:
//!
//! ```text
//! {
//!   "request":     { "subject_id", "resource_id", "action", "time", ...custom },
//!   "user":        { "id", "type", "attributes": { ... } },
//!   "resource":    { "id", "type", "attributes": { ... } },
//!   "environment": { "time", "time_of_day", "day_of_week", "client_ip", ... }
//! }
//! ```
//!
//! The legacy flat form (`user:department`, `request:UserId`) is a read-only alias
//! over the same data, so both views always agree.

pub mod path;
pub mod resolver;
pub mod variables;

pub use path::{normalize_path, NormalizedPath, PathError};
pub use resolver::PathResolver;
pub use variables::{contains_variables, substitute_pattern, substitute_value};

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use tracing::debug;

use crate::types::EvaluationRequest;

/// Namespace-level fields of `user` and `resource` that attributes never shadow
const IDENTITY_FIELDS: [&str; 2] = ["id", "type"];

/// Canonical context namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Request metadata and caller-supplied keys
    Request,
    /// Subject attributes
    User,
    /// Resource attributes
    Resource,
    /// Environment attributes (time, network, device)
    Environment,
}

impl Namespace {
    /// All namespaces in canonical order
    pub const ALL: [Namespace; 4] = [
        Namespace::Request,
        Namespace::User,
        Namespace::Resource,
        Namespace::Environment,
    ];

    /// Namespace key in the nested context
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::User => "user",
            Self::Resource => "resource",
            Self::Environment => "environment",
        }
    }

    /// Parse a namespace name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ns| ns.as_str().eq_ignore_ascii_case(name))
    }

    /// Whether plain keys live under a nested `attributes` map
    fn has_attribute_map(&self) -> bool {
        matches!(self, Self::User | Self::Resource)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute bag consulted during policy evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    root: Map<String, Value>,
}

impl EvaluationContext {
    /// Create an empty context with all canonical namespaces present
    pub fn new() -> Self {
        let mut root = Map::new();
        for ns in Namespace::ALL {
            let mut scope = Map::new();
            if ns.has_attribute_map() {
                scope.insert("attributes".to_string(), Value::Object(Map::new()));
            }
            root.insert(ns.as_str().to_string(), Value::Object(scope));
        }
        Self { root }
    }

    /// Wrap an arbitrary context map as-is
    pub fn from_map(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Build the request and environment namespaces for an evaluation request
    ///
    /// Subject and resource attributes are added afterwards by an attribute
    /// resolver. Caller context keys written as `namespace:key` land in that
    /// namespace; any other key lands in `request`. Caller-supplied values are
    /// written first, so request identity and derived environment values always
    /// win a collision. Caller keys naming a `user`/`resource` identity field
    /// (`user:id`, `resource:type`) are dropped.
    pub fn for_request(request: &EvaluationRequest) -> Self {
        let now = request.timestamp.unwrap_or_else(Utc::now);
        let mut ctx = Self::new();

        for (key, value) in &request.context {
            if shadows_identity(key) {
                debug!("Ignoring caller context key '{}' (identity field)", key);
                continue;
            }
            if !ctx.set_flat(key, value.clone()) {
                ctx.set(Namespace::Request, key.clone(), value.clone());
            }
        }

        if let Some(env) = &request.environment {
            for (key, value) in &env.custom_attributes {
                ctx.set(Namespace::Environment, key.clone(), value.clone());
            }
            if let Some(ip) = &env.client_ip {
                ctx.set(Namespace::Environment, "client_ip", ip.clone());
            }
            if let Some(agent) = &env.user_agent {
                ctx.set(Namespace::Environment, "user_agent", agent.clone());
            }
        }

        ctx.set_time_attributes(now);

        ctx.set(Namespace::Request, "subject_id", request.subject_id.clone());
        ctx.set(Namespace::Request, "UserId", request.subject_id.clone());
        ctx.set(Namespace::Request, "resource_id", request.resource_id.clone());
        ctx.set(Namespace::Request, "ResourceId", request.resource_id.clone());
        ctx.set(Namespace::Request, "action", request.action.clone());
        ctx.set(Namespace::Request, "time", now.to_rfc3339());

        ctx
    }

    /// Set an attribute in a namespace
    ///
    /// `user` and `resource` attributes go under their nested `attributes` map.
    pub fn set(&mut self, ns: Namespace, key: impl Into<String>, value: impl Into<Value>) {
        let scope = self.scope_mut(ns);
        let target = if ns.has_attribute_map() {
            object_entry(scope, "attributes")
        } else {
            scope
        };
        target.insert(key.into(), value.into());
    }

    /// Set a namespace-level identity field (`user.id`, `resource.type`, ...)
    pub fn set_identity(&mut self, ns: Namespace, key: impl Into<String>, value: impl Into<Value>) {
        self.scope_mut(ns).insert(key.into(), value.into());
    }

    /// Set an attribute addressed in flat `namespace:key` form
    ///
    /// Returns `false` when the key does not name a known namespace.
    pub fn set_flat(&mut self, key: &str, value: Value) -> bool {
        let Some((ns, name)) = key.split_once(':') else {
            return false;
        };
        match Namespace::parse(ns) {
            Some(ns) if !name.is_empty() => {
                self.set(ns, name, value);
                true
            }
            _ => false,
        }
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, ns: Namespace, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(ns, key, value);
        self
    }

    /// Attach subject identity and attributes
    pub fn with_subject(
        mut self,
        id: impl Into<String>,
        subject_type: impl Into<String>,
        attributes: &Map<String, Value>,
    ) -> Self {
        self.set_identity(Namespace::User, "id", id.into());
        self.set_identity(Namespace::User, "type", subject_type.into());
        for (key, value) in attributes {
            self.set(Namespace::User, key.clone(), value.clone());
        }
        self
    }

    /// Attach resource identity and attributes
    pub fn with_resource(
        mut self,
        id: impl Into<String>,
        resource_type: impl Into<String>,
        attributes: &Map<String, Value>,
    ) -> Self {
        self.set_identity(Namespace::Resource, "id", id.into());
        self.set_identity(Namespace::Resource, "type", resource_type.into());
        for (key, value) in attributes {
            self.set(Namespace::Resource, key.clone(), value.clone());
        }
        self
    }

    /// Attach request-scoped attributes
    pub fn with_request(mut self, attributes: &Map<String, Value>) -> Self {
        for (key, value) in attributes {
            self.set(Namespace::Request, key.clone(), value.clone());
        }
        self
    }

    /// Attach environment attributes
    pub fn with_environment(mut self, attributes: &Map<String, Value>) -> Self {
        for (key, value) in attributes {
            self.set(Namespace::Environment, key.clone(), value.clone());
        }
        self
    }

    /// Look up a flat `namespace:key` alias (or a literal root key)
    pub fn flat(&self, key: &str) -> Option<&Value> {
        lookup_flat(&self.root, key)
    }

    /// Nested map of one namespace
    pub fn namespace(&self, ns: Namespace) -> Option<&Map<String, Value>> {
        self.root.get(ns.as_str()).and_then(Value::as_object)
    }

    /// Requested action, if present
    pub fn action(&self) -> Option<&str> {
        self.namespace(Namespace::Request)?.get("action")?.as_str()
    }

    /// Requested resource identifier, if present
    pub fn resource_id(&self) -> Option<&str> {
        self.namespace(Namespace::Request)?.get("resource_id")?.as_str()
    }

    /// Canonical nested view
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    fn set_time_attributes(&mut self, now: DateTime<Utc>) {
        let weekend = matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
        self.set(Namespace::Environment, "time", now.to_rfc3339());
        self.set(Namespace::Environment, "time_of_day", now.format("%H:%M").to_string());
        self.set(Namespace::Environment, "day_of_week", now.format("%A").to_string());
        self.set(Namespace::Environment, "hour", now.hour());
        self.set(Namespace::Environment, "is_weekend", weekend);
    }

    fn scope_mut(&mut self, ns: Namespace) -> &mut Map<String, Value> {
        object_entry(&mut self.root, ns.as_str())
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for EvaluationContext {
    fn from(root: Map<String, Value>) -> Self {
        Self::from_map(root)
    }
}

/// Get (or create) the object stored under `key`, replacing any non-object value
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just replaced by an object"),
    }
}

/// Whether a flat `namespace:key` names a `user`/`resource` identity field
fn shadows_identity(key: &str) -> bool {
    key.split_once(':')
        .and_then(|(ns, name)| Namespace::parse(ns).map(|ns| (ns, name)))
        .is_some_and(|(ns, name)| ns.has_attribute_map() && IDENTITY_FIELDS.contains(&name))
}

/// Direct lookup: literal root key, then the `namespace:key` alias
///
/// `user:k` resolves to `user.attributes.k`, falling back to `user.k`; namespaces
/// without an `attributes` map resolve `ns:k` to `ns.k`. Identity fields
/// (`user:id`, `resource:type`) read the namespace-level value first.
pub(crate) fn lookup_flat<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = root.get(key) {
        return Some(value);
    }

    let (ns, name) = key.split_once(':')?;
    if name.is_empty() {
        return None;
    }
    let scope = root.get(ns)?.as_object()?;

    if IDENTITY_FIELDS.contains(&name) {
        if let Some(value) = scope.get(name) {
            return Some(value);
        }
    }

    scope
        .get("attributes")
        .and_then(Value::as_object)
        .and_then(|attributes| attributes.get(name))
        .or_else(|| scope.get(name))
}
