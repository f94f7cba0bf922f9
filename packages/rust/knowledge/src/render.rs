//! Text rendering of resolved values for consumers that want a plain answer.

use serde_json::Value;

use crate::resolve::Resolution;

/// Answer given when a path does not resolve or resolves to `null`.
pub const NOT_FOUND: &str = "No information found for that query.";

/// Layout for rendered mappings and sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderStyle {
    /// Single-line JSON.
    #[default]
    Compact,
    /// Indented JSON.
    Pretty,
}

/// Whether a resolution counts as an answer (found and not `null`).
pub fn is_answer(resolution: &Resolution<'_>) -> bool {
    matches!(resolution, Ok(value) if !value.is_null())
}

/// Render a resolution; every failure becomes [`NOT_FOUND`].
pub fn render(resolution: &Resolution<'_>, style: RenderStyle) -> String {
    match resolution {
        Ok(value) => render_value(value, style),
        Err(_) => NOT_FOUND.to_string(),
    }
}

/// Render a value: strings verbatim, other scalars as JSON text, containers as JSON.
pub fn render_value(value: &Value, style: RenderStyle) -> String {
    match value {
        Value::Null => NOT_FOUND.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => match style {
            RenderStyle::Compact => value.to_string(),
            RenderStyle::Pretty => format!("{value:#}"),
        },
    }
}
