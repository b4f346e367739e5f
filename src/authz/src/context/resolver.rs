//! Attribute path resolution against a heterogeneous context
//!
//! Policy authors write paths in several styles (`user:department`,
//! `user.department`, `user.attributes.department`, `user.roles[0]`). The resolver
//! tries a fixed chain of strategies and returns the first value found:
//!
//! 1. Direct lookup of the whole path (including `namespace:key` flat aliases)
//! 2. Dot-notation traversal through nested maps
//! 3. Colon fallback (first `.` rewritten to `:`, then direct lookup)
//! 4. Shortcut expansion (`user.x` → `user.attributes.x`)
//! 5. Array-index access (`field[0]`, `field.0`)
//!
//! Resolution never fails loudly; anything ambiguous or malformed is "not found".

use serde_json::{Map, Value};

use super::path::{normalize_path, NormalizedPath};
use super::{lookup_flat, EvaluationContext};

/// Resolves dotted/indexed attribute paths
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Prefix → subpath rewrites, tried in order
    shortcuts: Vec<(String, String)>,
}

impl PathResolver {
    /// Create a resolver with the default `user` and `resource` shortcuts
    pub fn new() -> Self {
        Self::with_shortcuts(default_shortcuts())
    }

    /// Create a resolver with custom shortcut expansions
    ///
    /// Each entry maps a leading path segment to its replacement, e.g.
    /// `("user", "user.attributes")`.
    pub fn with_shortcuts<I, K, V>(shortcuts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            shortcuts: shortcuts
                .into_iter()
                .map(|(prefix, target)| (prefix.into(), target.into()))
                .collect(),
        }
    }

    /// Resolve a path against an evaluation context
    pub fn resolve<'a>(&self, path: &str, context: &'a EvaluationContext) -> Option<&'a Value> {
        self.resolve_in(path, context.as_map())
    }

    /// Resolve a path against a raw context map
    pub fn resolve_in<'a>(&self, path: &str, root: &'a Map<String, Value>) -> Option<&'a Value> {
        if path.is_empty() {
            return None;
        }

        lookup_flat(root, path)
            .or_else(|| traverse_dotted(path, root))
            .or_else(|| colon_fallback(path, root))
            .or_else(|| self.expand_shortcut(path).and_then(|p| traverse_dotted(&p, root)))
            .or_else(|| self.resolve_indexed(path, root))
    }

    fn expand_shortcut(&self, path: &str) -> Option<String> {
        self.shortcuts.iter().find_map(|(prefix, target)| {
            path.strip_prefix(prefix.as_str())
                .filter(|rest| rest.starts_with('.'))
                .map(|rest| format!("{target}{rest}"))
        })
    }

    fn resolve_indexed<'a>(&self, path: &str, root: &'a Map<String, Value>) -> Option<&'a Value> {
        let direct = normalize_path(path)
            .ok()
            .and_then(|normalized| traverse_normalized(&normalized, root));

        direct.or_else(|| {
            let expanded = self.expand_shortcut(path)?;
            let normalized = normalize_path(&expanded).ok()?;
            traverse_normalized(&normalized, root)
        })
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Default shortcut expansions
pub fn default_shortcuts() -> Vec<(String, String)> {
    vec![
        ("user".to_string(), "user.attributes".to_string()),
        ("resource".to_string(), "resource.attributes".to_string()),
    ]
}

fn traverse_dotted<'a>(path: &str, root: &'a Map<String, Value>) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn colon_fallback<'a>(path: &str, root: &'a Map<String, Value>) -> Option<&'a Value> {
    if !path.contains('.') {
        return None;
    }
    lookup_flat(root, &path.replacen('.', ":", 1))
}

fn traverse_normalized<'a>(path: &NormalizedPath, root: &'a Map<String, Value>) -> Option<&'a Value> {
    let mut current: Option<&'a Value> = None;

    for (position, part) in path.parts().iter().enumerate() {
        let map = match current {
            None => root,
            Some(value) => value.as_object()?,
        };
        let mut value = map.get(part)?;
        for &index in path.indices_for(position) {
            value = value.as_array()?.get(index)?;
        }
        current = Some(value);
    }

    current
}
