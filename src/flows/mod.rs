//! Flows module - The four reporting passes and the run orchestrator
//!
//! Provides:
//! - structure: directory tree report
//! - export: token-bounded multi-part content dump
//! - audit / integrations: pattern-table scanners
//! - scan: shared scanner plumbing
//! - `run_bundle`: sequences the passes, isolates their failures, writes the
//!   error log, and prints the dashboard

pub mod audit;
pub mod export;
pub mod integrations;
pub mod scan;
pub mod structure;

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::filter::{RuleSet, UNIVERSAL_RULES};
use crate::core::model::{Pass, PassStatus, RunSummary};
use crate::core::paths::normalize_path;
use crate::core::walk::walk_project;
use crate::flows::scan::ScanLimits;

/// Conventional output directory under the project root
pub const OUTPUT_DIR_NAME: &str = "codebase-snapshot";

/// Conventional caller rule file at the project root
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// One full run's configuration
#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub root: PathBuf,
    pub token_limit: usize,
    /// Bypass the rule file for the content-export pass only
    pub skip_ignore_file: bool,
    pub no_color: bool,
}

/// Shared banner block at the top of every report artifact
pub fn report_banner(title: &str, generated_at: &str, root_display: &str) -> String {
    let rule = "=".repeat(80);
    format!(
        "{rule}\n{title}\nGenerated: {generated}\nRoot: {root}\n{rule}\n\n",
        rule = rule,
        title = title,
        generated = generated_at,
        root = root_display,
    )
}

/// Run all four reporting passes.
///
/// Only output-directory creation is fatal. Each pass failure is caught,
/// recorded, and the run continues; the process still exits 0.
pub fn run_bundle(opts: &BundleOptions) -> Result<()> {
    if opts.no_color {
        colored::control::set_override(false);
    }

    let root = &opts.root;
    let out_dir = root.join(OUTPUT_DIR_NAME);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let now = Local::now();
    let timestamp = now.format("%Y%m%d_%H%M%S").to_string();
    let generated_at = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let root_display = normalize_path(root);
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    let caller_rules = RuleSet::load(&root.join(IGNORE_FILE_NAME));
    let listing = walk_project(root, &UNIVERSAL_RULES, &caller_rules);

    let mut summary = RunSummary::new();

    match structure::run_structure(
        &root_name,
        &listing,
        &out_dir,
        &timestamp,
        &generated_at,
        &root_display,
    ) {
        Ok((path, stats)) => {
            summary.pass_succeeded(
                Pass::Structure,
                format!("{} files, {} dirs", stats.files, stats.directories),
            );
            summary.record_artifact(path);
        }
        Err(e) => summary.pass_failed(Pass::Structure, e.to_string()),
    }

    // The content pass may bypass the rule file; universal rules still apply.
    let content_listing = if opts.skip_ignore_file {
        walk_project(root, &UNIVERSAL_RULES, &RuleSet::empty())
    } else {
        listing.clone()
    };

    match export::run_export(
        &content_listing.files,
        opts.token_limit,
        &out_dir,
        &timestamp,
        &generated_at,
        &root_display,
    ) {
        Ok(outcome) => {
            summary.pass_succeeded(
                Pass::Content,
                format!(
                    "{} parts, ~{} tokens",
                    outcome.stats.parts_written, outcome.stats.total_tokens
                ),
            );
            summary.record_errors(outcome.errors);
            for artifact in outcome.artifacts {
                summary.record_artifact(artifact);
            }
        }
        Err(e) => summary.pass_failed(Pass::Content, e.to_string()),
    }

    let limits = ScanLimits::default();

    match audit::run_audit(
        &listing.files,
        &limits,
        &out_dir,
        &timestamp,
        &generated_at,
        &root_display,
    ) {
        Ok((path, count)) => {
            summary.pass_succeeded(Pass::Audit, format!("{} findings", count));
            summary.record_artifact(path);
        }
        Err(e) => summary.pass_failed(Pass::Audit, e.to_string()),
    }

    match integrations::run_integrations(
        &listing.files,
        &limits,
        &out_dir,
        &timestamp,
        &generated_at,
        &root_display,
    ) {
        Ok((path, count)) => {
            summary.pass_succeeded(Pass::Integrations, format!("{} findings", count));
            summary.record_artifact(path);
        }
        Err(e) => summary.pass_failed(Pass::Integrations, e.to_string()),
    }

    if summary.has_errors() {
        match write_error_log(&summary, &out_dir, &timestamp, &generated_at, &root_display) {
            Ok(path) => summary.record_artifact(path),
            Err(e) => eprintln!("warning: could not write error log: {}", e),
        }
    }

    print_dashboard(&summary, &out_dir);
    Ok(())
}

fn write_error_log(
    summary: &RunSummary,
    out_dir: &Path,
    timestamp: &str,
    generated_at: &str,
    root_display: &str,
) -> Result<PathBuf> {
    let mut text = report_banner("ERROR LOG", generated_at, root_display);
    for (index, error) in summary.errors.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", index + 1, error));
    }

    let path = out_dir.join(format!("errors_{}.txt", timestamp));
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn print_dashboard(summary: &RunSummary, out_dir: &Path) {
    eprintln!();
    eprintln!("{}", "Export dashboard".bold());
    for (pass, status) in &summary.outcomes {
        match status {
            PassStatus::Succeeded { detail } => {
                eprintln!("  {} {:<22} {}", "✓".green(), pass.label(), detail);
            }
            PassStatus::Failed { message } => {
                eprintln!("  {} {:<22} {}", "✗".red(), pass.label(), message);
            }
        }
    }
    eprintln!(
        "  Output: {} ({} artifacts)",
        out_dir.display(),
        summary.artifacts.len()
    );
    if summary.has_errors() {
        eprintln!(
            "  {} {} error(s) recorded",
            "!".yellow(),
            summary.errors.len()
        );
    }
}
