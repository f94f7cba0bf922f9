//! Turning answers into concrete per-field fill actions.
//!
//! The plan is what a browser driver executes: which element to target and
//! what to type or pick. Building it here keeps option matching testable
//! without a browser.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use formfill_shared::{FieldAnswer, FieldDescriptor, FieldKind};

/// Outcome of planning one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    /// Ready to fill with `value`.
    Ready,
    /// The knowledge base had nothing for this field.
    NoData,
    /// A select/radio answer matched none of the options.
    OptionNotFound,
    /// The answer's label matches no scraped field.
    UnknownField,
}

/// One planned fill step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillAction {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    /// CSS selector for the element to act on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Text to type, or the option label to pick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub status: FillStatus,
}

/// Ordered fill actions, one per answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FillPlan {
    pub actions: Vec<FillAction>,
}

impl FillPlan {
    pub fn ready(&self) -> impl Iterator<Item = &FillAction> {
        self.actions.iter().filter(|a| a.status == FillStatus::Ready)
    }

    pub fn count(&self, status: FillStatus) -> usize {
        self.actions.iter().filter(|a| a.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Plan how to fill `fields` with `answers`.
pub fn plan_fill(fields: &[FieldDescriptor], answers: &[FieldAnswer]) -> FillPlan {
    let by_label: HashMap<&str, &FieldDescriptor> =
        fields.iter().map(|f| (f.label.as_str(), f)).collect();

    let actions = answers
        .iter()
        .map(|answer| match by_label.get(answer.label.as_str()) {
            Some(field) => plan_field(field, answer),
            None => {
                warn!(label = %answer.label, "no scraped field for answer, skipping");
                FillAction {
                    label: answer.label.clone(),
                    kind: None,
                    target: None,
                    value: None,
                    status: FillStatus::UnknownField,
                }
            }
        })
        .collect();

    FillPlan { actions }
}

fn plan_field(field: &FieldDescriptor, answer: &FieldAnswer) -> FillAction {
    let mut action = FillAction {
        label: field.label.clone(),
        kind: Some(field.kind),
        target: target_selector(field),
        value: None,
        status: FillStatus::NoData,
    };

    if !answer.found {
        debug!(label = %field.label, "no data for field");
        return action;
    }

    if field.kind.is_choice() {
        match match_option(&field.options, &answer.answer) {
            Some(option) => {
                action.value = Some(option.to_string());
                action.status = FillStatus::Ready;
            }
            None => {
                warn!(label = %field.label, answer = %answer.answer, "answer matches no option");
                action.value = Some(answer.answer.clone());
                action.status = FillStatus::OptionNotFound;
            }
        }
    } else {
        action.value = Some(answer.answer.clone());
        action.status = FillStatus::Ready;
    }

    action
}

/// CSS selector for a field: its id, else its name.
fn target_selector(field: &FieldDescriptor) -> Option<String> {
    match (field.kind, &field.id, &field.name) {
        (FieldKind::Radio, _, Some(name)) => Some(format!(r#"input[name="{name}"]"#)),
        (_, Some(id), _) => Some(format!("#{id}")),
        (_, None, Some(name)) => Some(format!(r#"[name="{name}"]"#)),
        _ => None,
    }
}

/// Pick the option an answer refers to: exact, then case-insensitive, then
/// case-insensitive containment.
pub fn match_option<'a>(options: &'a [String], answer: &str) -> Option<&'a str> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    let lowered = answer.to_lowercase();

    options
        .iter()
        .find(|o| o.as_str() == answer)
        .or_else(|| options.iter().find(|o| o.to_lowercase() == lowered))
        .or_else(|| options.iter().find(|o| o.to_lowercase().contains(&lowered)))
        .map(String::as_str)
}
