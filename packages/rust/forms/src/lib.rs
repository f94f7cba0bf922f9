//! Form loading, field scraping, and fill planning.
//!
//! This crate provides:
//! - [`FormSource`] / [`load_form_html`]: read a form from disk or over HTTP
//! - [`scrape_form_fields`]: extract [`FieldDescriptor`]s from static HTML
//! - [`plan_fill`]: map resolved answers onto concrete fill actions
//!
//! [`FieldDescriptor`]: formfill_shared::FieldDescriptor

pub mod plan;
pub mod scrape;
pub mod source;

pub use plan::{FillAction, FillPlan, FillStatus, match_option, plan_fill};
pub use scrape::scrape_form_fields;
pub use source::{FormSource, load_form_html};
