//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::flows::{run_bundle, BundleOptions};

/// repobundle - package a codebase into token-bounded text reports.
#[derive(Parser, Debug)]
#[command(name = "repobundle")]
#[command(
    author,
    version,
    about,
    long_about = r#"repobundle walks a project directory and writes four plain-text reports
suitable for pasting into a language-model context window:

- a directory-structure tree with per-directory aggregates
- a multi-part dump of file contents, each part bounded by a token budget
- a pattern-based cloud infrastructure audit
- a pattern-based integration inventory

Artifacts are timestamp-named and written to codebase-snapshot/ under the
root. Binary, empty, and unreadable files appear as in-band markers in the
content export; a detailed error log is written only when errors occurred.

Examples:
    repobundle
    repobundle --limit 100000
    repobundle --root ../service --no-ignore
"#
)]
pub struct Cli {
    /// Root directory to export.
    #[arg(
        long,
        default_value = ".",
        value_name = "ROOT",
        long_help = "Root directory to export (defaults to the current directory).\n\n\
All report paths are relative to this root, and artifacts are written to\n\
its codebase-snapshot/ subdirectory."
    )]
    pub root: PathBuf,

    /// Token limit per content-export part.
    #[arg(
        long,
        default_value_t = 200_000,
        value_name = "N",
        value_parser = parse_token_limit,
        long_help = "Token limit per content-export part (positive integer).\n\n\
Tokens are estimated at 4 characters per token plus a 10% safety margin, and\n\
each part targets 90% of this limit, so parts land safely under a model's\n\
real context window. A single file larger than the whole budget is never\n\
split; its part is allowed to overflow."
    )]
    pub limit: usize,

    /// Skip the .gitignore rule file for the content-export pass.
    #[arg(
        long,
        long_help = "Skip the .gitignore rule file for the content-export pass only.\n\n\
The structure, audit, and integration passes still honor it, and the fixed\n\
universal exclusions (VCS metadata, dependency trees, build output, the\n\
snapshot directory itself) always apply."
    )]
    pub no_ignore: bool,

    /// Disable colored output.
    #[arg(
        long,
        long_help = "Disable colored dashboard output. Useful when piping stderr to a file\n\
or when the terminal does not support ANSI colors."
    )]
    pub no_color: bool,
}

fn parse_token_limit(raw: &str) -> Result<usize, String> {
    let value: usize = raw
        .parse()
        .map_err(|_| format!("'{}' is not a valid token limit", raw))?;
    if value == 0 {
        return Err("token limit must be positive".to_string());
    }
    Ok(value)
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    // Get absolute root path
    let root = cli.root.canonicalize().unwrap_or(cli.root);

    run_bundle(&BundleOptions {
        root,
        token_limit: cli.limit,
        skip_ignore_file: cli.no_ignore,
        no_color: cli.no_color,
    })
}
