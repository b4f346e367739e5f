//! Attribute path syntax validation and normalization
//!
//! Turns `items[0].name`, `matrix[1][2]` or `tags.0` into a list of plain field
//! names plus the array indices that follow each of them.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while normalizing an attribute path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("attribute path cannot be empty")]
    Empty,

    #[error("unmatched bracket in path '{0}'")]
    UnmatchedBracket(String),

    #[error("invalid array index '{index}' in path '{path}'")]
    InvalidIndex { path: String, index: String },

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

/// A validated attribute path
///
/// `parts` holds the field names in order; `indices` maps a part position to the
/// array indices applied (in order) to the value found at that part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPath {
    parts: Vec<String>,
    indices: BTreeMap<usize, Vec<usize>>,
}

impl NormalizedPath {
    /// Field names without any array notation
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Array indices applied after the given part
    pub fn indices_for(&self, part: usize) -> &[usize] {
        self.indices.get(&part).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the path indexes into any sequence
    pub fn has_indices(&self) -> bool {
        !self.indices.is_empty()
    }
}

/// Validate and normalize an attribute path
///
/// Repeated dots collapse (`a..b` is `a.b`). Numeric dot segments (`tags.0`) index
/// into the preceding part, as does bracket notation (`tags[0]`).
pub fn normalize_path(path: &str) -> Result<NormalizedPath, PathError> {
    if path.trim().is_empty() {
        return Err(PathError::Empty);
    }

    let mut normalized = NormalizedPath::default();

    for segment in path.split('.').filter(|s| !s.is_empty()) {
        if is_numeric_like(segment) {
            let index = parse_index(segment, path)?;
            let Some(last) = normalized.parts.len().checked_sub(1) else {
                return Err(PathError::InvalidIdentifier(segment.to_string()));
            };
            normalized.indices.entry(last).or_default().push(index);
            continue;
        }

        let (name, indices) = split_brackets(segment, path)?;
        validate_identifier(name)?;

        normalized.parts.push(name.to_string());
        if !indices.is_empty() {
            normalized.indices.insert(normalized.parts.len() - 1, indices);
        }
    }

    if normalized.parts.is_empty() {
        return Err(PathError::Empty);
    }

    Ok(normalized)
}

fn is_numeric_like(segment: &str) -> bool {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn split_brackets<'a>(segment: &'a str, path: &str) -> Result<(&'a str, Vec<usize>), PathError> {
    let Some(open) = segment.find('[') else {
        if segment.contains(']') {
            return Err(PathError::UnmatchedBracket(path.to_string()));
        }
        return Ok((segment, Vec::new()));
    };

    let name = &segment[..open];
    let mut rest = &segment[open..];
    let mut indices = Vec::new();

    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return Err(PathError::InvalidIdentifier(segment.to_string()));
        }
        let Some(close) = rest.find(']') else {
            return Err(PathError::UnmatchedBracket(path.to_string()));
        };
        let inner = &rest[1..close];
        if inner.contains('[') {
            return Err(PathError::UnmatchedBracket(path.to_string()));
        }
        indices.push(parse_index(inner, path)?);
        rest = &rest[close + 1..];
    }

    Ok((name, indices))
}

fn parse_index(raw: &str, path: &str) -> Result<usize, PathError> {
    let invalid = || PathError::InvalidIndex {
        path: path.to_string(),
        index: raw.to_string(),
    };

    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse::<usize>().map_err(|_| invalid())
}

fn validate_identifier(name: &str) -> Result<(), PathError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(PathError::InvalidIdentifier(name.to_string()))
    }
}
