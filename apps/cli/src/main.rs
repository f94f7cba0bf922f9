//! FormFill CLI: answer job application forms from a personal knowledge base.
//!
//! Scrapes a form's fields, maps them onto knowledge base paths with a
//! language model, resolves the paths, and plans the fill.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
