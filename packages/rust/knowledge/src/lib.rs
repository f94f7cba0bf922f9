//! Knowledge base loading and path-query resolution.
//!
//! The knowledge base is one JSON document describing the applicant
//! (`personal_info`, `work_experience`, `education`, ...). It is loaded once
//! and then queried with short path expressions such as
//! `work_experience[0].job_title`. The whole document doubles as the schema
//! shown to the mapping model.
//!
//! Loading and lookups are fail-soft: an unreadable source becomes an empty
//! document, and a path that does not resolve is a [`LookupFailure`] value
//! rather than an error that aborts the caller.

pub mod document;
pub mod path;
pub mod render;
pub mod resolve;
pub mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use formfill_shared::Result;

pub use document::Document;
pub use path::{QueryPath, Segment, normalize_query};
pub use render::{NOT_FOUND, RenderStyle, is_answer, render, render_value};
pub use resolve::{FailureKind, LookupFailure, Resolution};
pub use validate::ValidationIssue;

/// A loaded knowledge base. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    source: Option<PathBuf>,
    document: Document,
}

impl KnowledgeBase {
    pub fn new(document: Document) -> Self {
        Self {
            source: None,
            document,
        }
    }

    /// Load from a JSON file. Any failure yields an empty knowledge base.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let document = recover(Document::from_path(path));
        Self {
            source: Some(path.to_path_buf()),
            document,
        }
    }

    /// Load from any reader. Any failure yields an empty knowledge base.
    pub fn from_reader<R: Read>(reader: R) -> Self {
        Self::new(recover(Document::from_reader(reader)))
    }

    /// Load from JSON text. Any failure yields an empty knowledge base.
    pub fn from_json_str(text: &str) -> Self {
        Self::new(recover(Document::from_json_str(text)))
    }

    /// File the document was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The full document, exposed verbatim as the schema.
    pub fn schema(&self) -> &Value {
        self.document.as_value()
    }

    /// Resolve path text against the document.
    pub fn resolve(&self, query: &str) -> Resolution<'_> {
        let path = QueryPath::parse(query);
        debug!(query, %path, "resolving query");
        self.document.resolve(&path)
    }

    /// Resolve and render for a text consumer.
    pub fn answer(&self, query: &str) -> String {
        self.answer_with(query, RenderStyle::Compact)
    }

    pub fn answer_with(&self, query: &str, style: RenderStyle) -> String {
        let resolution = self.resolve(query);
        match &resolution {
            Ok(value) => debug!(query, kind = resolve::value_kind(value), "query resolved"),
            Err(failure) => debug!(query, %failure, "query did not resolve"),
        }
        render(&resolution, style)
    }

    /// Advisory structural checks; each issue is also logged.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let issues = validate::validate_document(&self.document);
        for issue in &issues {
            warn!(section = %issue.section, message = %issue.message, "knowledge base validation issue");
        }
        issues
    }
}

/// Substitute an empty document for a failed load.
fn recover(loaded: Result<Document>) -> Document {
    match loaded {
        Ok(document) => {
            info!(entries = document.len(), "knowledge base loaded");
            document
        }
        Err(e) => {
            warn!(error = %e, "knowledge base unavailable, continuing with an empty document");
            Document::empty()
        }
    }
}
