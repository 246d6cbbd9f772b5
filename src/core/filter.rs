//! Path filtering
//!
//! Two rule sets decide whether a path is excluded from a run: a fixed
//! universal set that is always active, and a caller set derived from the
//! project's `.gitignore`. Universal rules are evaluated first and can never
//! be overridden; caller rules only run when no universal rule matched.
//!
//! Rule shapes, decided once at parse time:
//! - directory: trailing `/`, matches the name anywhere in the path
//! - wildcard: contains a glob metacharacter, matched against the whole
//!   normalized relative path
//! - literal: exact relative path, a path segment equal to the literal, or a
//!   path starting with `literal/` / ending with `/literal`

use glob::Pattern;
use once_cell::sync::Lazy;
use std::path::Path;

/// Always-excluded patterns. Purely name-based; the entry for the snapshot
/// directory keeps a run from exporting a previous run's artifacts.
const UNIVERSAL_PATTERNS: &[&str] = &[
    ".git/",
    "node_modules/",
    "target/",
    "dist/",
    "build/",
    "out/",
    "vendor/",
    "__pycache__/",
    ".venv/",
    "venv/",
    ".idea/",
    ".vscode/",
    ".pytest_cache/",
    ".mypy_cache/",
    "coverage/",
    ".next/",
    ".terraform/",
    "codebase-snapshot/",
    "*.pyc",
    "*.pyo",
    "*.class",
    "*.o",
    "*.so",
    "*.dylib",
    "*.dll",
    "*.exe",
    "*.log",
    "*.lock",
    "*.min.js",
    "*.min.css",
    "*.map",
    ".DS_Store",
    "Thumbs.db",
    "package-lock.json",
    "yarn.lock",
    "Cargo.lock",
    "bin",
    "obj",
];

/// The always-active rule set
pub static UNIVERSAL_RULES: Lazy<RuleSet> =
    Lazy::new(|| RuleSet::from_lines(UNIVERSAL_PATTERNS.iter().copied()));

/// One parsed ignore rule
#[derive(Debug, Clone)]
pub enum IgnoreRule {
    Directory(String),
    Wildcard(Pattern),
    Literal(String),
}

impl IgnoreRule {
    /// Parse one rule line. Blank lines, comments, and (unsupported)
    /// `!` negations yield `None`.
    pub fn parse(raw: &str) -> Option<IgnoreRule> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            return None;
        }

        if let Some(name) = trimmed.strip_suffix('/') {
            let name = name.trim_matches('/');
            if name.is_empty() {
                return None;
            }
            return Some(IgnoreRule::Directory(name.to_string()));
        }

        if trimmed.contains(['*', '?', '[']) {
            // A malformed glob degrades to a literal rather than erroring the
            // whole rule file.
            return match Pattern::new(trimmed) {
                Ok(pattern) => Some(IgnoreRule::Wildcard(pattern)),
                Err(_) => Some(IgnoreRule::Literal(trimmed.to_string())),
            };
        }

        Some(IgnoreRule::Literal(trimmed.to_string()))
    }

    fn matches(&self, relative: &str) -> bool {
        match self {
            IgnoreRule::Directory(name) => {
                relative.split('/').any(|segment| segment == name)
                    || relative.starts_with(&format!("{}/", name))
                    || relative.contains(&format!("/{}/", name))
            }
            IgnoreRule::Wildcard(pattern) => pattern.matches(relative),
            IgnoreRule::Literal(literal) => {
                relative == literal
                    || relative.split('/').any(|segment| segment == literal)
                    || relative.starts_with(&format!("{}/", literal))
                    || relative.ends_with(&format!("/{}", literal))
            }
        }
    }
}

/// An immutable, ordered collection of ignore rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<IgnoreRule>,
}

impl RuleSet {
    /// A set that matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse rules from raw lines, dropping everything unparseable
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            rules: lines.into_iter().filter_map(IgnoreRule::parse).collect(),
        }
    }

    /// Load a rule file. A missing or unreadable file yields an empty set.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_lines(content.lines()),
            Err(_) => Self::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn matches(&self, relative: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(relative))
    }
}

/// Decide whether a root-relative, '/'-separated path is excluded.
///
/// The project root itself (empty relative path) is never excluded, and an
/// empty caller set never bypasses the universal set.
pub fn should_ignore(relative: &str, universal: &RuleSet, caller: &RuleSet) -> bool {
    if relative.is_empty() {
        return false;
    }
    if universal.matches(relative) {
        return true;
    }
    caller.matches(relative)
}
