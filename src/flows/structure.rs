//! Directory structure report
//!
//! Builds nested per-directory aggregates from the filtered listing and
//! renders them as a connector-drawn tree, followed by an extension-frequency
//! table and the busiest directories. Files sort before subdirectories, each
//! group alphabetical.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::paths::format_size;
use crate::core::walk::ProjectListing;
use crate::flows::report_banner;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const SPACE: &str = "    ";

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StructureStats {
    pub files: usize,
    pub directories: usize,
    pub total_bytes: u64,
}

#[derive(Debug, Clone)]
struct FileLeaf {
    name: String,
    size: u64,
}

/// One directory with its direct files and subdirectories
#[derive(Debug, Clone)]
struct DirNode {
    name: String,
    files: Vec<FileLeaf>,
    children: Vec<DirNode>,
}

impl DirNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            children: Vec::new(),
        }
    }

    fn ensure_dir<'a>(&mut self, mut segments: impl Iterator<Item = &'a str>) -> &mut DirNode {
        match segments.next() {
            None => self,
            Some(segment) => {
                let idx = match self.children.iter().position(|c| c.name == segment) {
                    Some(i) => i,
                    None => {
                        self.children.push(DirNode::new(segment));
                        self.children.len() - 1
                    }
                };
                self.children[idx].ensure_dir(segments)
            }
        }
    }

    fn insert_dir(&mut self, relative: &str) {
        self.ensure_dir(relative.split('/'));
    }

    fn insert_file(&mut self, relative: &str, size: u64) {
        match relative.rsplit_once('/') {
            None => self.files.push(FileLeaf {
                name: relative.to_string(),
                size,
            }),
            Some((parent, name)) => self.ensure_dir(parent.split('/')).files.push(FileLeaf {
                name: name.to_string(),
                size,
            }),
        }
    }

    /// Cumulative file count, this directory and below
    fn file_count(&self) -> usize {
        self.files.len() + self.children.iter().map(|c| c.file_count()).sum::<usize>()
    }

    /// Cumulative subdirectory count
    fn dir_count(&self) -> usize {
        self.children.len() + self.children.iter().map(|c| c.dir_count()).sum::<usize>()
    }

    /// Cumulative byte size
    fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum::<u64>()
            + self.children.iter().map(|c| c.total_size()).sum::<u64>()
    }

    fn sort(&mut self) {
        self.files
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        self.children
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        for child in &mut self.children {
            child.sort();
        }
    }
}

fn build_tree(root_name: &str, listing: &ProjectListing) -> DirNode {
    let mut root = DirNode::new(root_name);
    // Directories first so empty ones still appear in the tree.
    for dir in &listing.directories {
        root.insert_dir(dir);
    }
    for file in &listing.files {
        root.insert_file(&file.relative, file.size);
    }
    root.sort();
    root
}

fn render_tree(root: &DirNode) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(&format!(
        "{}/ ({} files, {} dirs, {})\n",
        root.name,
        root.file_count(),
        root.dir_count(),
        format_size(root.total_size())
    ));
    render_children(&mut out, root, "");
    out
}

fn render_children(out: &mut String, node: &DirNode, prefix: &str) {
    let total = node.files.len() + node.children.len();
    let mut index = 0;

    for file in &node.files {
        index += 1;
        let connector = if index == total { LAST_BRANCH } else { BRANCH };
        out.push_str(&format!(
            "{}{}{} ({})\n",
            prefix,
            connector,
            file.name,
            format_size(file.size)
        ));
    }

    for child in &node.children {
        index += 1;
        let last = index == total;
        let connector = if last { LAST_BRANCH } else { BRANCH };
        out.push_str(&format!(
            "{}{}{}/ ({} files, {})\n",
            prefix,
            connector,
            child.name,
            child.file_count(),
            format_size(child.total_size())
        ));
        let child_prefix = format!("{}{}", prefix, if last { SPACE } else { VERTICAL });
        render_children(out, child, &child_prefix);
    }
}

fn render_extension_table(listing: &ProjectListing) -> String {
    let mut by_extension: HashMap<&str, (usize, u64)> = HashMap::new();
    for file in &listing.files {
        let entry = by_extension.entry(file.extension.as_str()).or_default();
        entry.0 += 1;
        entry.1 += file.size;
    }

    let mut rows: Vec<(&str, usize, u64)> = by_extension
        .into_iter()
        .map(|(ext, (count, bytes))| (ext, count, bytes))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    for (ext, count, bytes) in rows {
        let label = if ext.is_empty() {
            "(none)".to_string()
        } else {
            format!(".{}", ext)
        };
        out.push_str(&format!(
            "{:<16} {:>6} files {:>12}\n",
            label,
            count,
            format_size(bytes)
        ));
    }
    out
}

fn render_top_directories(listing: &ProjectListing) -> String {
    let mut rows: Vec<(&str, usize)> = listing
        .directories
        .iter()
        .map(|dir| {
            let prefix = format!("{}/", dir);
            let count = listing
                .files
                .iter()
                .filter(|f| f.relative.starts_with(&prefix))
                .count();
            (dir.as_str(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    for (dir, count) in rows.into_iter().take(10) {
        out.push_str(&format!("{:<40} {:>6} files\n", dir, count));
    }
    out
}

/// Build the full structure report text.
pub fn build_report(
    root_name: &str,
    listing: &ProjectListing,
    generated_at: &str,
    root_display: &str,
) -> (String, StructureStats) {
    let tree = build_tree(root_name, listing);
    let stats = StructureStats {
        files: listing.files.len(),
        directories: listing.directories.len(),
        total_bytes: listing.total_bytes(),
    };

    let divider = "-".repeat(80);
    let mut text = report_banner("DIRECTORY STRUCTURE REPORT", generated_at, root_display);
    text.push_str(&render_tree(&tree));
    text.push('\n');
    text.push_str(&format!("EXTENSION SUMMARY\n{}\n", divider));
    text.push_str(&render_extension_table(listing));
    text.push('\n');
    text.push_str(&format!("TOP DIRECTORIES BY FILE COUNT\n{}\n", divider));
    let top = render_top_directories(listing);
    if top.is_empty() {
        text.push_str("(no subdirectories with files)\n");
    } else {
        text.push_str(&top);
    }

    (text, stats)
}

/// Run the structure pass: build the report and write its artifact.
pub fn run_structure(
    root_name: &str,
    listing: &ProjectListing,
    out_dir: &Path,
    timestamp: &str,
    generated_at: &str,
    root_display: &str,
) -> Result<(PathBuf, StructureStats)> {
    let (text, stats) = build_report(root_name, listing, generated_at, root_display);

    let path = out_dir.join(format!("structure_{}.txt", timestamp));
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;

    Ok((path, stats))
}
