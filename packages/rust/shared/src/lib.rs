//! Shared types, error model, and configuration for FormFill.
//!
//! This crate is the foundation depended on by all other FormFill crates.
//! It provides:
//! - [`FormFillError`]: the unified error type
//! - Domain types ([`FieldDescriptor`], [`QueryMap`], [`FieldAnswer`], [`RunId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, OpenRouterConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key,
};
pub use error::{FormFillError, Result};
pub use types::{FieldAnswer, FieldDescriptor, FieldKind, QueryMap, QueryMapping, RunId};
