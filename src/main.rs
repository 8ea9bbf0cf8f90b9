//! brief - annotate rendered markdown and export the marks as a change request
//!
//! brief provides:
//! - Markdown rendering into a document tree with strike and comment markers
//! - Re-anchoring of saved annotations when a document is opened again
//! - Single-file and folder modes persisted under .brief/
//! - An export format meant to be pasted into an AI agent

use anyhow::Result;
use clap::Parser;

mod anchors;
mod backends;
mod cache;
mod cli;
mod core;
mod dom;
mod error;
mod flows;
mod logging;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
