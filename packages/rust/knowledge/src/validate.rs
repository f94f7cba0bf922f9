//! Structural checks on well-known knowledge base sections.
//!
//! Validation is advisory: issues are reported, never fatal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::Document;

/// A problem found in one section of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Top-level section name.
    pub section: String,
    pub message: String,
}

/// Minimum shape of `personal_info`.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct PersonalInfo {
    full_name: String,
    email: String,
}

/// Check the document's well-known sections.
pub fn validate_document(document: &Document) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let empty = Value::Object(Map::new());
    let personal_info = document.get("personal_info").unwrap_or(&empty);
    if let Err(e) = PersonalInfo::deserialize(personal_info) {
        issues.push(ValidationIssue {
            section: "personal_info".into(),
            message: e.to_string(),
        });
    }

    issues
}
