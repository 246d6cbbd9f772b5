//! Pattern scanning plumbing shared by the audit and integration passes
//!
//! Both passes are the same loop over a size-and-extension-capped candidate
//! set: match filenames against glob tables, then file contents against
//! case-insensitive regex tables, recording at most one finding per file per
//! category. The tables themselves are static configuration owned by the
//! respective pass modules.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::classify::{classify, ClassifiedContent};
use crate::core::model::FileRecord;

/// Default cap on scanned file size (1 MB)
pub const DEFAULT_MAX_SCAN_SIZE: u64 = 1024 * 1024;

/// Extensions admitted to content scanning
const SCAN_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "kt", "rb", "php", "cs", "c", "cc",
    "cpp", "h", "hpp", "sh", "bash", "ps1", "yml", "yaml", "json", "toml", "ini", "cfg",
    "conf", "env", "properties", "tf", "tfvars", "hcl", "sql", "xml", "gradle", "md", "txt",
];

/// Extensionless filenames admitted to content scanning
const SCAN_BARE_NAMES: &[&str] = &[
    "dockerfile",
    "makefile",
    "jenkinsfile",
    "vagrantfile",
    "procfile",
    "rakefile",
    "gemfile",
];

/// Candidate caps for one scanner run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanLimits {
    pub max_file_size: u64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_SCAN_SIZE,
        }
    }
}

impl ScanLimits {
    /// Whether a file is worth scanning at all
    pub fn admits(&self, record: &FileRecord) -> bool {
        if record.size > self.max_file_size {
            return false;
        }
        if SCAN_EXTENSIONS.contains(&record.extension.as_str()) {
            return true;
        }
        let name = record
            .relative
            .rsplit('/')
            .next()
            .unwrap_or(&record.relative)
            .to_lowercase();
        SCAN_BARE_NAMES.contains(&name.as_str())
    }
}

/// How a finding was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Filename,
    Content,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Filename => "filename",
            MatchKind::Content => "content",
        }
    }
}

/// One category hit on one file
#[derive(Debug, Clone, Serialize)]
pub struct ScanFinding {
    pub category: &'static str,
    pub path: String,
    pub pattern: String,
    pub kind: MatchKind,
}

/// A compiled filename table: category name to glob patterns
pub type FilenameTable = Vec<(&'static str, Vec<Pattern>)>;

/// A compiled content table: category name to (source, regex) pairs
pub type ContentTable = Vec<(&'static str, Vec<(String, Regex)>)>;

/// Compile a raw filename table, dropping malformed globs.
pub fn compile_filename_table(raw: &[(&'static str, &[&str])]) -> FilenameTable {
    raw.iter()
        .map(|(category, globs)| {
            let patterns = globs.iter().filter_map(|g| Pattern::new(g).ok()).collect();
            (*category, patterns)
        })
        .collect()
}

/// Compile a raw content table into case-insensitive, multi-line regexes.
pub fn compile_content_table(raw: &[(&'static str, &[&str])]) -> ContentTable {
    raw.iter()
        .map(|(category, sources)| {
            let regexes = sources
                .iter()
                .filter_map(|source| {
                    regex::RegexBuilder::new(source)
                        .case_insensitive(true)
                        .multi_line(true)
                        .build()
                        .ok()
                        .map(|regex| (source.to_string(), regex))
                })
                .collect();
            (*category, regexes)
        })
        .collect()
}

/// Scan the candidate files against both tables.
///
/// Per file per category the first matching pattern wins: a filename hit
/// short-circuits the category, otherwise the first content regex to match is
/// recorded. Files that fail to read are skipped silently here; the content
/// pass owns error reporting for unreadable files.
pub fn scan_files(
    files: &[FileRecord],
    limits: &ScanLimits,
    filename_table: &FilenameTable,
    content_table: &ContentTable,
) -> Vec<ScanFinding> {
    let mut findings = Vec::new();

    for record in files.iter().filter(|r| limits.admits(r)) {
        let name = record
            .relative
            .rsplit('/')
            .next()
            .unwrap_or(&record.relative);

        let mut matched: Vec<&'static str> = Vec::new();
        for (category, patterns) in filename_table {
            if let Some(pattern) = patterns
                .iter()
                .find(|p| p.matches(name) || p.matches(&record.relative))
            {
                findings.push(ScanFinding {
                    category: *category,
                    path: record.relative.clone(),
                    pattern: pattern.as_str().to_string(),
                    kind: MatchKind::Filename,
                });
                matched.push(*category);
            }
        }

        if content_table.is_empty() {
            continue;
        }

        let text = match classify(&record.path) {
            ClassifiedContent::Text(text) => text,
            _ => continue,
        };

        for (category, regexes) in content_table {
            if matched.contains(category) {
                continue;
            }
            if let Some((source, _)) = regexes.iter().find(|(_, regex)| regex.is_match(&text)) {
                findings.push(ScanFinding {
                    category: *category,
                    path: record.relative.clone(),
                    pattern: source.clone(),
                    kind: MatchKind::Content,
                });
            }
        }
    }

    findings
}

/// Render the shared findings report body: per-category counts, then the
/// flat listing.
pub fn render_findings(categories: &[&'static str], findings: &[ScanFinding]) -> String {
    let divider = "-".repeat(80);
    let mut out = String::new();

    out.push_str(&format!("SUMMARY\n{}\n", divider));
    for category in categories {
        let count = findings.iter().filter(|f| f.category == *category).count();
        out.push_str(&format!("{:<20} {:>5} findings\n", category, count));
    }

    out.push_str(&format!("\nFINDINGS\n{}\n", divider));
    if findings.is_empty() {
        out.push_str("No findings.\n");
    } else {
        for finding in findings {
            out.push_str(&format!(
                "[{}] {} ({}: {})\n",
                finding.category,
                finding.path,
                finding.kind.as_str(),
                finding.pattern
            ));
        }
    }

    out
}
