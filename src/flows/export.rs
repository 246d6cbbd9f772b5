//! Content export pass
//!
//! Classifies each enumerated file, renders it into a preamble-plus-content
//! block (failures become in-band markers), and packs the blocks into
//! token-bounded part files. Per-file failures never abort the pass; only
//! not-found and read errors reach the run's error list.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::classify::{classify, ClassifiedContent};
use crate::core::model::FileRecord;
use crate::core::packer::{finalize_parts, pack, FileEntry, HeaderContext};

/// Per-pass counters, reported on the dashboard
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExportStats {
    pub files_processed: usize,
    pub text_files: usize,
    pub binary_files: usize,
    pub empty_files: usize,
    pub error_files: usize,
    pub parts_written: usize,
    pub total_tokens: usize,
}

/// Everything the content pass produced
#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    pub stats: ExportStats,
    pub errors: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

/// Render one file's block exactly as it will be written.
pub fn render_entry_block(record: &FileRecord, content: ClassifiedContent) -> String {
    let body = match content {
        ClassifiedContent::Text(text) => text,
        ClassifiedContent::Binary => "[BINARY FILE - CONTENT NOT INCLUDED]".to_string(),
        ClassifiedContent::Empty => "[EMPTY FILE]".to_string(),
        ClassifiedContent::NotFound => "[ERROR: FILE NOT FOUND]".to_string(),
        ClassifiedContent::ReadError(failure) => format!("[ERROR READING FILE: {}]", failure),
    };

    let divider = "-".repeat(80);
    format!(
        "{divider}\nFILE: {relative}\nSIZE: {size} bytes | MODIFIED: {modified}\n{divider}\n{body}\n\n",
        divider = divider,
        relative = record.relative,
        size = record.size,
        modified = record.modified_label(),
        body = body,
    )
}

/// Run the content pass over `files` in enumeration order.
pub fn run_export(
    files: &[FileRecord],
    token_limit: usize,
    out_dir: &Path,
    timestamp: &str,
    generated_at: &str,
    root_display: &str,
) -> Result<ExportOutcome> {
    let ctx = HeaderContext {
        generated_at: generated_at.to_string(),
        root: root_display.to_string(),
        token_limit,
    };

    let mut stats = ExportStats::default();
    let mut errors = Vec::new();
    let mut entries = Vec::with_capacity(files.len());

    for record in files {
        let content = classify(&record.path);
        stats.files_processed += 1;
        match &content {
            ClassifiedContent::Text(_) => stats.text_files += 1,
            ClassifiedContent::Binary => stats.binary_files += 1,
            ClassifiedContent::Empty => stats.empty_files += 1,
            ClassifiedContent::NotFound => {
                stats.error_files += 1;
                errors.push(format!("{}: file not found", record.relative));
            }
            ClassifiedContent::ReadError(failure) => {
                stats.error_files += 1;
                errors.push(format!("{}: {}", record.relative, failure));
            }
        }

        let block = render_entry_block(record, content);
        entries.push(FileEntry::new(record.clone(), block));
    }

    let parts = finalize_parts(pack(entries, token_limit, &ctx), &ctx);
    stats.parts_written = parts.len();
    stats.total_tokens = parts.iter().map(|p| p.token_estimate()).sum();

    let mut artifacts = Vec::with_capacity(parts.len());
    for part in &parts {
        let path = out_dir.join(format!("content_{}_part{}.txt", timestamp, part.number));
        fs::write(&path, part.render())
            .with_context(|| format!("failed to write {}", path.display()))?;
        artifacts.push(path);
    }

    Ok(ExportOutcome {
        stats,
        errors,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::ReadFailure;
    use std::io::Write;
    use tempfile::tempdir;

    fn record(dir: &Path, name: &str, content: &[u8]) -> FileRecord {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        FileRecord::new(&path, name, content.len() as u64)
    }

    #[test]
    fn test_render_block_contains_preamble_and_content() {
        let temp = tempdir().unwrap();
        let rec = record(temp.path(), "hello.txt", b"hello world");

        let block = render_entry_block(&rec, ClassifiedContent::Text("hello world".to_string()));
        assert!(block.contains("FILE: hello.txt"));
        assert!(block.contains("SIZE: 11 bytes"));
        assert!(block.contains("MODIFIED: "));
        assert!(block.ends_with("hello world\n\n"));
    }

    #[test]
    fn test_render_block_markers() {
        let temp = tempdir().unwrap();
        let rec = record(temp.path(), "x.bin", &[0u8]);

        let binary = render_entry_block(&rec, ClassifiedContent::Binary);
        assert!(binary.contains("[BINARY FILE - CONTENT NOT INCLUDED]"));

        let empty = render_entry_block(&rec, ClassifiedContent::Empty);
        assert!(empty.contains("[EMPTY FILE]"));

        let missing = render_entry_block(&rec, ClassifiedContent::NotFound);
        assert!(missing.contains("[ERROR: FILE NOT FOUND]"));

        let denied =
            render_entry_block(&rec, ClassifiedContent::ReadError(ReadFailure::AccessDenied));
        assert!(denied.contains("[ERROR READING FILE: access denied]"));
    }

    #[test]
    fn test_export_writes_single_part() {
        let temp = tempdir().unwrap();
        let out = tempdir().unwrap();
        let files = vec![
            record(temp.path(), "a.txt", b"alpha"),
            record(temp.path(), "b.txt", b"beta"),
        ];

        let outcome =
            run_export(&files, 200_000, out.path(), "20240101_000000", "now", "/p").unwrap();

        assert_eq!(outcome.stats.files_processed, 2);
        assert_eq!(outcome.stats.text_files, 2);
        assert_eq!(outcome.stats.parts_written, 1);
        assert_eq!(outcome.artifacts.len(), 1);

        let written = fs::read_to_string(&outcome.artifacts[0]).unwrap();
        assert!(written.contains("Part 1 of 1"));
        assert!(written.contains("FILE: a.txt"));
        assert!(written.contains("FILE: b.txt"));
    }

    #[test]
    fn test_export_splits_and_counts_binary_and_missing() {
        let temp = tempdir().unwrap();
        let out = tempdir().unwrap();

        let mut files = vec![
            record(temp.path(), "a.txt", b"hello"),
            record(temp.path(), "b.bin", &[1, 0, 2]),
        ];
        // A huge file forces a second part at this limit.
        files.push(record(
            temp.path(),
            "c.txt",
            "x".repeat(100_000).as_bytes(),
        ));
        // Enumerated but deleted before the read.
        let ghost = record(temp.path(), "ghost.txt", b"gone");
        fs::remove_file(&ghost.path).unwrap();
        files.push(ghost);

        let outcome =
            run_export(&files, 1000, out.path(), "20240101_000000", "now", "/p").unwrap();

        assert_eq!(outcome.stats.binary_files, 1);
        assert_eq!(outcome.stats.error_files, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("ghost.txt"));
        assert!(outcome.stats.parts_written >= 2);

        // Headers agree on the final total.
        let total = outcome.stats.parts_written;
        for artifact in &outcome.artifacts {
            let text = fs::read_to_string(artifact).unwrap();
            assert!(text.contains(&format!("of {}", total)));
        }
    }

    #[test]
    fn test_export_zero_files_zero_parts() {
        let out = tempdir().unwrap();
        let outcome =
            run_export(&[], 1000, out.path(), "20240101_000000", "now", "/p").unwrap();

        assert_eq!(outcome.stats.parts_written, 0);
        assert!(outcome.artifacts.is_empty());
    }
}
