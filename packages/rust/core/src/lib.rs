//! Mapping and pipeline orchestration for FormFill.
//!
//! This crate ties together form scraping, knowledge base resolution, and the
//! field-mapping model into the end-to-end `run_fill` workflow.

pub mod mapping;
pub mod pipeline;

pub use mapping::{MappingGenerator, OpenRouterMapper, StaticMapper, build_prompt, parse_query_map};
pub use pipeline::{
    FillConfig, FillReport, ProgressReporter, SilentProgress, execute_queries, run_fill,
    write_report,
};
