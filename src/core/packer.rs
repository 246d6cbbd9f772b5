//! Token-bounded content packing
//!
//! Packs pre-rendered file entry blocks into a sequence of output parts.
//! Invariants:
//! - entries keep their input order and are never split across parts
//! - a part's running estimate (header + entries) stays within
//!   `floor(token_limit * 0.9)`, except when a single entry alone exceeds
//!   that budget, in which case the part carries it whole and overflows
//! - headers carry a placeholder total until `finalize_parts` rewrites every
//!   header with the true part count
//!
//! The 0.9 buffer compounds with the estimator's own 10% inflation; both
//! margins push toward more, smaller parts instead of overflowing a real
//! tokenizer's limit.

use crate::core::model::FileRecord;
use crate::core::tokens::estimate;

/// Packer input: one file rendered down to the exact bytes to be written
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub record: FileRecord,
    pub block: String,
    pub tokens: usize,
}

impl FileEntry {
    /// The estimate covers the whole rendered block, preamble included.
    pub fn new(record: FileRecord, block: String) -> Self {
        let tokens = estimate(&block);
        Self {
            record,
            block,
            tokens,
        }
    }
}

/// Run-constant fields every part header states
#[derive(Debug, Clone)]
pub struct HeaderContext {
    pub generated_at: String,
    pub root: String,
    pub token_limit: usize,
}

impl HeaderContext {
    /// Render a part header. `total` is `None` while packing (placeholder)
    /// and `Some` once the final part count is known.
    pub fn render_header(&self, number: usize, total: Option<usize>) -> String {
        let total = total.map_or_else(|| "?".to_string(), |t| t.to_string());
        format!(
            "{rule}\nCODEBASE CONTENT EXPORT - Part {number} of {total}\n\
             Generated: {generated}\nRoot: {root}\nToken limit: {limit}\n{rule}\n\n",
            rule = "=".repeat(80),
            number = number,
            total = total,
            generated = self.generated_at,
            root = self.root,
            limit = self.token_limit,
        )
    }
}

/// One output part: a header plus an ordered run of entries
#[derive(Debug, Clone)]
pub struct Part {
    pub number: usize,
    pub header: String,
    pub entries: Vec<FileEntry>,
}

impl Part {
    fn open(number: usize, ctx: &HeaderContext) -> Self {
        Self {
            number,
            header: ctx.render_header(number, None),
            entries: Vec::new(),
        }
    }

    /// Header plus all entry blocks, in order
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.header.len() + self.entries.iter().map(|e| e.block.len()).sum::<usize>(),
        );
        out.push_str(&self.header);
        for entry in &self.entries {
            out.push_str(&entry.block);
        }
        out
    }

    /// Header estimate plus the entries' precomputed estimates
    pub fn token_estimate(&self) -> usize {
        estimate(&self.header) + self.entries.iter().map(|e| e.tokens).sum::<usize>()
    }
}

/// Pack entries, in order, into parts that respect the buffered token budget.
///
/// A single entry larger than the whole budget still lands in exactly one
/// part: never splitting a file is the harder constraint. Zero entries pack
/// to zero parts.
pub fn pack(entries: Vec<FileEntry>, token_limit: usize, ctx: &HeaderContext) -> Vec<Part> {
    let buffer_limit = token_limit * 9 / 10;

    let mut parts: Vec<Part> = Vec::new();
    let mut current = Part::open(1, ctx);
    let mut running = estimate(&current.header);

    for entry in entries {
        if running + entry.tokens > buffer_limit && !current.entries.is_empty() {
            parts.push(current);
            current = Part::open(parts.len() + 1, ctx);
            running = estimate(&current.header);
        }
        running += entry.tokens;
        current.entries.push(entry);
    }

    // A trailing header-only part is noise, not output.
    if !current.entries.is_empty() {
        parts.push(current);
    }

    parts
}

/// Rewrite every header with the true part total.
pub fn finalize_parts(mut parts: Vec<Part>, ctx: &HeaderContext) -> Vec<Part> {
    let total = parts.len();
    for part in &mut parts {
        part.header = ctx.render_header(part.number, Some(total));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx(token_limit: usize) -> HeaderContext {
        HeaderContext {
            generated_at: "2024-01-01 00:00:00".to_string(),
            root: "/project".to_string(),
            token_limit,
        }
    }

    fn entry(name: &str, block_len: usize) -> FileEntry {
        let record = FileRecord::new(Path::new(name), name, block_len as u64);
        FileEntry::new(record, "x".repeat(block_len))
    }

    #[test]
    fn test_pack_zero_entries_zero_parts() {
        let parts = pack(Vec::new(), 1000, &ctx(1000));
        assert!(parts.is_empty());
    }

    #[test]
    fn test_pack_single_part_under_budget() {
        let parts = pack(vec![entry("a.txt", 40), entry("b.txt", 40)], 1000, &ctx(1000));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].entries.len(), 2);
    }

    #[test]
    fn test_pack_splits_at_budget() {
        // buffer_limit = 180; header ~60 tokens, each entry 110 tokens, so
        // the second entry forces a new part.
        let parts = pack(
            vec![entry("a.txt", 400), entry("b.txt", 400)],
            200,
            &ctx(200),
        );
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].entries.len(), 1);
        assert_eq!(parts[1].entries.len(), 1);
    }

    #[test]
    fn test_pack_preserves_order_and_membership() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let entries: Vec<FileEntry> = names.iter().map(|n| entry(n, 300)).collect();
        let parts = pack(entries, 500, &ctx(500));

        let repacked: Vec<String> = parts
            .iter()
            .flat_map(|p| p.entries.iter().map(|e| e.record.relative.clone()))
            .collect();
        assert_eq!(repacked, names);

        // Every entry belongs to exactly one part.
        let total: usize = parts.iter().map(|p| p.entries.len()).sum();
        assert_eq!(total, names.len());
    }

    #[test]
    fn test_pack_oversized_entry_gets_own_overflowing_part() {
        let parts = pack(vec![entry("huge.txt", 100_000)], 1000, &ctx(1000));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].entries.len(), 1);
        assert!(parts[0].token_estimate() > 900);
    }

    #[test]
    fn test_pack_respects_buffer_limit_except_oversized() {
        let token_limit = 400;
        let buffer_limit = token_limit * 9 / 10;
        let mut entries = vec![entry("a", 200), entry("b", 200), entry("big", 5000)];
        entries.push(entry("c", 200));
        let parts = pack(entries, token_limit, &ctx(token_limit));

        for part in &parts {
            if part.entries.len() == 1 && part.entries[0].tokens > buffer_limit {
                continue; // the forced oversized part
            }
            assert!(
                part.token_estimate() <= buffer_limit,
                "part {} exceeds budget: {}",
                part.number,
                part.token_estimate()
            );
        }
    }

    #[test]
    fn test_placeholder_then_finalize() {
        let entries = vec![entry("a", 400), entry("b", 400), entry("c", 400)];
        let context = ctx(200);
        let parts = pack(entries, 200, &context);
        assert!(parts.iter().all(|p| p.header.contains("of ?")));

        let total = parts.len();
        let finalized = finalize_parts(parts, &context);
        for (i, part) in finalized.iter().enumerate() {
            assert_eq!(part.number, i + 1);
            assert!(part
                .header
                .contains(&format!("Part {} of {}", i + 1, total)));
        }
    }

    #[test]
    fn test_finalize_empty() {
        let finalized = finalize_parts(Vec::new(), &ctx(1000));
        assert!(finalized.is_empty());
    }

    #[test]
    fn test_render_concatenates_header_and_blocks() {
        let context = ctx(1000);
        let parts = finalize_parts(
            pack(vec![entry("a.txt", 10), entry("b.txt", 10)], 1000, &context),
            &context,
        );
        let rendered = parts[0].render();
        assert!(rendered.starts_with(&parts[0].header));
        assert!(rendered.ends_with(&"x".repeat(10)));
    }

    #[test]
    fn test_end_to_end_scenario_small_small_huge() {
        // a small text entry and a binary marker pack together; a ~275k token
        // entry overflows into its own part; finalize stamps "of 2" on both.
        let context = ctx(1000);
        let entries = vec![
            entry("a.txt", 5),
            entry("b.bin", 40),
            entry("c.txt", 1_000_000),
        ];
        let parts = finalize_parts(pack(entries, 1000, &context), &context);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].entries.len(), 2);
        assert_eq!(parts[1].entries.len(), 1);
        assert_eq!(parts[1].entries[0].record.relative, "c.txt");
        assert!(parts[1].token_estimate() > 1000);
        assert!(parts.iter().all(|p| p.header.contains("of 2")));
    }
}
