//! Path expressions over the knowledge base tree.
//!
//! Grammar is deliberately small: segments separated by `.`, with `[n]`
//! accepted as an alternative spelling of an index segment, so
//! `work_experience[0].job_title` and `work_experience.0.job_title` parse to
//! the same three segments.
//!
//! A segment made only of ASCII digits is always an index. A mapping key that
//! is itself all digits (e.g. `"2024"`) therefore cannot be addressed; the
//! mapping generator is expected to follow the same convention.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One step in a [`QueryPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping entry lookup.
    Key(String),
    /// Sequence position lookup.
    Index(usize),
}

impl Segment {
    /// Classify raw segment text.
    pub fn classify(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            // Saturates on overflow; no sequence is that long, so it reads as out of range.
            Self::Index(raw.parse().unwrap_or(usize::MAX))
        } else {
            Self::Key(raw.to_string())
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A parsed path expression. Zero segments denote the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryPath {
    segments: Vec<Segment>,
}

impl QueryPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse path text. Never fails: malformed text yields segments that
    /// simply do not resolve.
    ///
    /// Blank text is a single empty key, not the root. Use [`QueryPath::root`]
    /// to address the whole document.
    pub fn parse(text: &str) -> Self {
        let normalized = normalize_query(text);
        let flattened = normalized.replace('[', ".").replace(']', "");
        Self {
            segments: flattened.split('.').map(Segment::classify).collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for QueryPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for QueryPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Canonical form: keys joined by `.`, indices in brackets (`a.b[2].c`).
impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Index(n) => write!(f, "[{n}]")?,
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}

/// Strip surrounding whitespace and one layer of quotes from generated path text.
///
/// Each side is stripped independently, so `'a.b"` also normalizes to `a.b`.
pub fn normalize_query(text: &str) -> &str {
    let is_quote = |c: char| c == '\'' || c == '"';
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix(is_quote).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(is_quote).unwrap_or(trimmed);
    trimmed.trim()
}
