//! Core domain types shared across FormFill crates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for fill-run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Form fields
// ---------------------------------------------------------------------------

/// Kind of a scraped form field.
///
/// `Text`, `Email`, `Tel` and `Url` are all single-line text inputs; the
/// distinction is kept because it is useful context for the mapping model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Url,
    Select,
    Radio,
}

impl FieldKind {
    /// Parse an `<input type=...>` attribute. Unknown or missing types map to `Text`.
    pub fn from_input_type(ty: Option<&str>) -> Option<Self> {
        match ty.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("text") => Some(Self::Text),
            Some("email") => Some(Self::Email),
            Some("tel") => Some(Self::Tel),
            Some("url") => Some(Self::Url),
            _ => None,
        }
    }

    /// Whether the field takes one of a fixed list of options.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Select => "select",
            Self::Radio => "radio",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fillable field as scraped from a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Visible label text.
    pub label: String,
    /// Field kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Underlying `name` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// DOM id the label points at (`<label for=...>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Option labels for select/radio fields, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

// ---------------------------------------------------------------------------
// Query map and answers
// ---------------------------------------------------------------------------

/// A single field label → knowledge base path pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMapping {
    pub label: String,
    pub path: String,
}

/// Ordered label → path mapping produced by a mapping generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryMap(pub Vec<QueryMapping>);

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapping. A repeated label replaces the earlier path in place.
    pub fn insert(&mut self, label: impl Into<String>, path: impl Into<String>) {
        let label = label.into();
        let path = path.into();
        match self.0.iter_mut().find(|m| m.label == label) {
            Some(existing) => existing.path = path,
            None => self.0.push(QueryMapping { label, path }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|m| m.label == label)
            .map(|m| m.path.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryMapping> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<L: Into<String>, P: Into<String>> FromIterator<(L, P)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (L, P)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, path) in iter {
            map.insert(label, path);
        }
        map
    }
}

/// The rendered answer for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnswer {
    /// Field label the answer belongs to.
    pub label: String,
    /// Path text as generated (before normalization).
    pub path: String,
    /// Rendered answer text (the not-found sentinel when `found` is false).
    pub answer: String,
    /// Whether the path resolved to a non-null value.
    pub found: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn field_descriptor_uses_type_tag() {
        let field = FieldDescriptor {
            label: "Full Name".into(),
            kind: FieldKind::Text,
            name: Some("full_name".into()),
            id: None,
            options: vec![],
        };
        let json = serde_json::to_string(&field).expect("serialize");
        assert_eq!(json, r#"{"label":"Full Name","type":"text","name":"full_name"}"#);
    }

    #[test]
    fn radio_descriptor_deserializes() {
        let json = r#"{"label":"Sponsorship?","type":"radio","name":"sponsor","options":["Yes","No"]}"#;
        let field: FieldDescriptor = serde_json::from_str(json).expect("deserialize");
        assert_eq!(field.kind, FieldKind::Radio);
        assert!(field.kind.is_choice());
        assert_eq!(field.options, vec!["Yes", "No"]);
        assert!(field.id.is_none());
    }

    #[test]
    fn input_type_parsing() {
        assert_eq!(FieldKind::from_input_type(None), Some(FieldKind::Text));
        assert_eq!(FieldKind::from_input_type(Some("EMAIL")), Some(FieldKind::Email));
        assert_eq!(FieldKind::from_input_type(Some("tel")), Some(FieldKind::Tel));
        assert_eq!(FieldKind::from_input_type(Some("checkbox")), None);
        assert!(FieldKind::Radio.is_choice());
        assert!(!FieldKind::Url.is_choice());
    }

    #[test]
    fn query_map_keeps_order_and_replaces_duplicates() {
        let mut map = QueryMap::new();
        map.insert("Full Name", "personal_info.full_name");
        map.insert("Email", "personal_info.email");
        map.insert("Full Name", "personal_info.name");

        let labels: Vec<_> = map.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Full Name", "Email"]);
        assert_eq!(map.get("Full Name"), Some("personal_info.name"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn query_map_serializes_as_list() {
        let map: QueryMap = [("Email", "personal_info.email")].into_iter().collect();
        let json = serde_json::to_string(&map).expect("serialize");
        assert_eq!(json, r#"[{"label":"Email","path":"personal_info.email"}]"#);
    }
}
