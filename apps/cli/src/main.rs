//! ArticleLift CLI — blog article enhancement tool.
//!
//! Rewrites backlog articles with an LLM, using the text of
//! better-ranking pages on the same topic as grounding context.

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
