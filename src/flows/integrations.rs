//! Integration inventory pass
//!
//! Static pattern tables mapping third-party integration categories to
//! filename globs and content regexes, scanned the same way as the
//! infrastructure audit.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::model::FileRecord;
use crate::flows::report_banner;
use crate::flows::scan::{
    compile_content_table, compile_filename_table, render_findings, scan_files, ContentTable,
    FilenameTable, ScanLimits,
};

/// Category display order for the report
pub const CATEGORIES: &[&str] = &[
    "payments",
    "email",
    "auth",
    "database",
    "cache",
    "messaging",
    "http-api",
    "monitoring",
    "storage",
];

const FILENAME_PATTERNS: &[(&str, &[&str])] = &[
    (
        "http-api",
        &[
            "openapi*.yml",
            "openapi*.yaml",
            "openapi*.json",
            "swagger*.yml",
            "swagger*.json",
            "*.graphql",
            "*.gql",
        ],
    ),
    ("database", &["*.sql", "schema.prisma", "migrations/*"]),
];

const CONTENT_PATTERNS: &[(&str, &[&str])] = &[
    (
        "payments",
        &[r"stripe", r"paypal", r"braintree", r"pk_(test|live)_"],
    ),
    (
        "email",
        &[r"sendgrid", r"mailgun", r"postmark", r"smtp://", r"smtplib"],
    ),
    (
        "auth",
        &[r"oauth2?", r"openid", r"\bjwt\b", r"auth0", r"\bokta\b", r"passport"],
    ),
    (
        "database",
        &[
            r"postgres(ql)?://",
            r"mysql://",
            r"mongodb(\+srv)?://",
            r"sqlite",
            r"jdbc:",
        ],
    ),
    ("cache", &[r"redis://", r"memcached?", r"elasticache"]),
    (
        "messaging",
        &[r"amqp://", r"\bkafka\b", r"rabbitmq", r"\bsqs\b", r"pubsub", r"nats://"],
    ),
    (
        "http-api",
        &[r"api\.[a-z0-9-]+\.(com|io|net)", r"x-api-key", r"graphql"],
    ),
    (
        "monitoring",
        &[r"datadog", r"\bsentry\b", r"new\s?relic", r"prometheus", r"grafana"],
    ),
    (
        "storage",
        &[r"s3://", r"gs://", r"\.blob\.core\.windows", r"\bminio\b"],
    ),
];

static FILENAME_TABLE: Lazy<FilenameTable> =
    Lazy::new(|| compile_filename_table(FILENAME_PATTERNS));

static CONTENT_TABLE: Lazy<ContentTable> = Lazy::new(|| compile_content_table(CONTENT_PATTERNS));

/// Run the integration inventory and write its artifact. Returns the artifact
/// path and the finding count.
pub fn run_integrations(
    files: &[FileRecord],
    limits: &ScanLimits,
    out_dir: &Path,
    timestamp: &str,
    generated_at: &str,
    root_display: &str,
) -> Result<(PathBuf, usize)> {
    let findings = scan_files(files, limits, &FILENAME_TABLE, &CONTENT_TABLE);

    let mut text = report_banner("INTEGRATION INVENTORY", generated_at, root_display);
    text.push_str(&render_findings(CATEGORIES, &findings));

    let path = out_dir.join(format!("integrations_{}.txt", timestamp));
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;

    Ok((path, findings.len()))
}
