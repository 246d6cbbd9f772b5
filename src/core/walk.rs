//! Filtered project enumeration
//!
//! Walks the project tree depth-first with per-directory name ordering, so
//! two runs over the same tree enumerate files identically. Part membership
//! downstream depends on this order. Ignored directories are pruned before
//! descent; walker errors are skipped, and files that vanish before reading
//! are surfaced later by the classifier.

use std::path::Path;
use walkdir::WalkDir;

use crate::core::filter::{should_ignore, RuleSet};
use crate::core::model::FileRecord;
use crate::core::paths::make_relative;

/// Everything one filtered walk discovered
#[derive(Debug, Clone, Default)]
pub struct ProjectListing {
    /// Files in enumeration order
    pub files: Vec<FileRecord>,
    /// Directories (relative, '/' separated) in enumeration order
    pub directories: Vec<String>,
}

impl ProjectListing {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Enumerate the project under `root`, pruning paths the filter excludes.
pub fn walk_project(root: &Path, universal: &RuleSet, caller: &RuleSet) -> ProjectListing {
    let mut listing = ProjectListing::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = match make_relative(entry.path(), root) {
                Some(r) => r,
                None => return false,
            };
            !should_ignore(&relative, universal, caller)
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        // The root itself is not a listing entry.
        if entry.depth() == 0 {
            continue;
        }

        let relative = match make_relative(entry.path(), root) {
            Some(r) => r,
            None => continue,
        };

        if entry.file_type().is_dir() {
            listing.directories.push(relative);
        } else if entry.file_type().is_file() {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            listing
                .files
                .push(FileRecord::new(entry.path(), relative, size));
        }
    }

    listing
}
