//! Segment-by-segment traversal of a JSON tree.

use std::fmt;

use serde_json::Value;

use crate::path::{QueryPath, Segment};

/// Outcome of resolving a path: the located value, or why it was not found.
pub type Resolution<'a> = Result<&'a Value, LookupFailure>;

/// Why a lookup stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing mapping key or out-of-range index.
    NotFound,
    /// Segment kind did not fit the value it was applied to.
    TypeMismatch {
        /// Kind of value the segment was applied to.
        found: &'static str,
    },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::TypeMismatch { found } => write!(f, "type mismatch (found {found})"),
        }
    }
}

/// A failed lookup. Callers treat every failure as "no value"; the detail is
/// for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at segment {position} (`{segment}`) of `{path}`")]
pub struct LookupFailure {
    pub kind: FailureKind,
    /// Canonical form of the whole path.
    pub path: String,
    /// The segment that could not be applied.
    pub segment: String,
    /// Zero-based position of that segment.
    pub position: usize,
}

impl LookupFailure {
    pub fn is_not_found(&self) -> bool {
        self.kind == FailureKind::NotFound
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, FailureKind::TypeMismatch { .. })
    }
}

/// Walk `path` from `root`. All-or-nothing: the first segment that cannot be
/// applied ends the walk.
pub fn resolve_path<'a>(root: &'a Value, path: &QueryPath) -> Resolution<'a> {
    let mut current = root;

    for (position, segment) in path.segments().iter().enumerate() {
        let fail = |kind| LookupFailure {
            kind,
            path: path.to_string(),
            segment: segment.to_string(),
            position,
        };

        current = match (current, segment) {
            (Value::Array(items), Segment::Index(i)) => {
                items.get(*i).ok_or_else(|| fail(FailureKind::NotFound))?
            }
            (Value::Object(map), Segment::Key(key)) => {
                map.get(key).ok_or_else(|| fail(FailureKind::NotFound))?
            }
            (other, _) => {
                return Err(fail(FailureKind::TypeMismatch {
                    found: value_kind(other),
                }));
            }
        };
    }

    Ok(current)
}

/// Short name of a JSON value's kind, for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
