//! repobundle - Package a codebase into token-bounded text reports
//!
//! repobundle provides:
//! - A filtered directory walk with fixed and .gitignore-derived exclusions
//! - A directory-structure report with per-directory aggregates
//! - A multi-part content export bounded by a configurable token budget
//! - Pattern-based infrastructure and integration reports

use anyhow::Result;
use clap::Parser;

mod cli;
mod core;
mod flows;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
