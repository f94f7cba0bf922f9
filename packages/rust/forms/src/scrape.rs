//! Field extraction from static form HTML.
//!
//! Forms are expected to group each question in a `.form-group` element with
//! a main `<label>` followed by a text input, a `<select>`, or a set of radio
//! buttons with their own `<label for=...>` elements.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

use formfill_shared::{FieldDescriptor, FieldKind};

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Extract every fillable field from the document, in document order.
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn scrape_form_fields(html: &str) -> Vec<FieldDescriptor> {
    let doc = Html::parse_document(html);
    let group_sel = selector(".form-group");

    let fields: Vec<FieldDescriptor> = doc
        .select(&group_sel)
        .filter(|group| !is_hidden(group))
        .filter_map(|group| scrape_group(&group))
        .collect();

    info!(count = fields.len(), "scraped form fields");
    fields
}

/// Build a descriptor for one `.form-group`, or `None` if it holds nothing fillable.
fn scrape_group(group: &ElementRef) -> Option<FieldDescriptor> {
    let label_sel = selector("label");
    let input_sel = selector("input");
    let select_sel = selector("select");
    let option_sel = selector("option");

    let main_label = group
        .select(&label_sel)
        .find(|label| label.select(&input_sel).next().is_none())?;
    if is_hidden(&main_label) {
        return None;
    }
    let label = element_text(&main_label);
    if label.is_empty() {
        return None;
    }
    let label_for = main_label.value().attr("for").map(String::from);

    let inputs: Vec<ElementRef> = group
        .select(&input_sel)
        .filter(|input| !is_hidden(input))
        .collect();

    // Text-like input.
    if let Some((input, kind)) = inputs
        .iter()
        .find_map(|input| FieldKind::from_input_type(input.value().attr("type")).map(|k| (input, k)))
    {
        let field = FieldDescriptor {
            label,
            kind,
            name: input.value().attr("name").map(String::from),
            id: input.value().attr("id").map(String::from).or(label_for),
            options: Vec::new(),
        };
        debug!(label = %field.label, kind = %field.kind, "text field");
        return Some(field);
    }

    // Select.
    if let Some(select) = group.select(&select_sel).find(|s| !is_hidden(s)) {
        let options = select
            .select(&option_sel)
            .map(|opt| element_text(&opt))
            .filter(|text| !text.is_empty())
            .collect();
        let field = FieldDescriptor {
            label,
            kind: FieldKind::Select,
            name: select.value().attr("name").map(String::from),
            id: select.value().attr("id").map(String::from).or(label_for),
            options,
        };
        debug!(label = %field.label, options = field.options.len(), "select field");
        return Some(field);
    }

    // Radio group.
    let radios: Vec<&ElementRef> = inputs
        .iter()
        .filter(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("radio"))
        })
        .collect();
    if radios.is_empty() {
        return None;
    }

    let option_labels: Vec<ElementRef> = group.select(&label_sel).collect();
    let options = radios
        .iter()
        .filter_map(|radio| {
            let by_label = radio.value().attr("id").and_then(|id| {
                option_labels
                    .iter()
                    .find(|l| l.value().attr("for") == Some(id) && !is_hidden(l))
                    .map(element_text)
            });
            by_label.or_else(|| radio.value().attr("value").map(|v| v.trim().to_string()))
        })
        .filter(|text| !text.is_empty())
        .collect();

    let field = FieldDescriptor {
        label,
        kind: FieldKind::Radio,
        name: radios[0].value().attr("name").map(String::from),
        id: None,
        options,
    };
    debug!(label = %field.label, options = field.options.len(), "radio field");
    Some(field)
}

/// Collected text with whitespace runs collapsed.
fn element_text(el: &ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Static visibility check: `hidden` attribute, `type="hidden"`, or inline `display: none`.
fn is_hidden(el: &ElementRef) -> bool {
    let value = el.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    if value
        .attr("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
    {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}
