//! Core data model
//!
//! Per-run value types shared by the reporting passes. Records and pass
//! outcomes are plain values produced once and merged by the orchestrator;
//! nothing in here touches global state.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::paths::{extension_of, modified_time};

/// Identity and metadata for one enumerated file
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path on disk
    pub path: PathBuf,

    /// Path relative to the project root, '/' separated
    pub relative: String,

    /// Size in bytes at enumeration time
    pub size: u64,

    /// Last modification time, if the filesystem reports one
    pub modified: Option<DateTime<Local>>,

    /// Lowercased extension, empty when absent
    pub extension: String,
}

impl FileRecord {
    pub fn new(path: &Path, relative: impl Into<String>, size: u64) -> Self {
        Self {
            extension: extension_of(path),
            modified: modified_time(path),
            path: path.to_path_buf(),
            relative: relative.into(),
            size,
        }
    }

    /// Modification time rendered for report preambles
    pub fn modified_label(&self) -> String {
        self.modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// The four reporting passes, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Structure,
    Content,
    Audit,
    Integrations,
}

impl Pass {
    pub fn label(&self) -> &'static str {
        match self {
            Pass::Structure => "Directory structure",
            Pass::Content => "Content export",
            Pass::Audit => "Infrastructure audit",
            Pass::Integrations => "Integration inventory",
        }
    }
}

/// Outcome of one reporting pass
#[derive(Debug, Clone)]
pub enum PassStatus {
    /// The pass completed; `detail` is a short dashboard note (artifact name,
    /// part count, finding count)
    Succeeded { detail: String },
    /// The whole pass failed; its artifact was not produced
    Failed { message: String },
}

/// Accumulated results of a run, merged pass by pass
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(Pass, PassStatus)>,
    pub errors: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass_succeeded(&mut self, pass: Pass, detail: impl Into<String>) {
        self.outcomes.push((
            pass,
            PassStatus::Succeeded {
                detail: detail.into(),
            },
        ));
    }

    pub fn pass_failed(&mut self, pass: Pass, message: impl Into<String>) {
        let message = message.into();
        self.errors.push(format!("{}: {}", pass.label(), message));
        self.outcomes.push((pass, PassStatus::Failed { message }));
    }

    pub fn record_artifact(&mut self, path: PathBuf) {
        self.artifacts.push(path);
    }

    pub fn record_errors(&mut self, errors: impl IntoIterator<Item = String>) {
        self.errors.extend(errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
