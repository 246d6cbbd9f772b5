//! Cloud infrastructure audit pass
//!
//! Static pattern tables mapping infrastructure categories to filename globs
//! and content regexes. The tables are configuration, not logic: the actual
//! loop lives in `flows::scan`.

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
    "containers",
    "orchestration",
    "iac",
    "ci-cd",
    "serverless",
    "aws",
    "gcp",
    "azure",
];

const FILENAME_PATTERNS: &[(&str, &[&str])] = &[
    (
        "containers",
        &[
            "Dockerfile*",
            "docker-compose*.yml",
            "docker-compose*.yaml",
            ".dockerignore",
        ],
    ),
    (
        "orchestration",
        &[
            "kustomization*.yml",
            "kustomization*.yaml",
            "helmfile*.yml",
            "skaffold*.yml",
            "Chart.yaml",
        ],
    ),
    (
        "iac",
        &[
            "*.tf",
            "*.tfvars",
            "cloudformation*.yml",
            "cloudformation*.yaml",
            "Pulumi.yaml",
        ],
    ),
    (
        "ci-cd",
        &[
            ".github/workflows/*",
            ".gitlab-ci.yml",
            "Jenkinsfile*",
            ".circleci/*",
            "azure-pipelines.yml",
            ".travis.yml",
            "bitbucket-pipelines.yml",
        ],
    ),
    (
        "serverless",
        &["serverless.yml", "serverless.yaml", "netlify.toml", "vercel.json"],
    ),
];

const CONTENT_PATTERNS: &[(&str, &[&str])] = &[
    (
        "containers",
        &[r"^FROM\s+\S+", r"docker\s+(build|run|push)"],
    ),
    (
        "orchestration",
        &[
            r"kind:\s*(Deployment|Service|Ingress|StatefulSet|DaemonSet|ConfigMap)",
            r"kubectl\s+(apply|create|rollout)",
            r"helm\s+(install|upgrade)",
        ],
    ),
    (
        "iac",
        &[
            r#"resource\s+"(aws|google|azurerm)_"#,
            r"terraform\s*\{",
            r"AWSTemplateFormatVersion",
        ],
    ),
    (
        "ci-cd",
        &[r"runs-on:\s*\S+", r"pipeline\s*\{", r"image:\s*\S+:\S+"],
    ),
    (
        "serverless",
        &[r"lambda_handler", r"functions\.https", r"serverless\s+deploy"],
    ),
    (
        "aws",
        &[
            r"boto3",
            r"aws-sdk",
            r"arn:aws:",
            r"s3\.amazonaws\.com",
            r"dynamodb",
            r"AWS_ACCESS_KEY",
        ],
    ),
    (
        "gcp",
        &[r"google-cloud-", r"googleapis\.com", r"gcloud\s+\S+", r"gs://"],
    ),
    (
        "azure",
        &[
            r"azure-(storage|identity|mgmt|functions)",
            r"\.blob\.core\.windows\.net",
            r"DefaultAzureCredential",
        ],
    ),
];

static FILENAME_TABLE: Lazy<FilenameTable> =
    Lazy::new(|| compile_filename_table(FILENAME_PATTERNS));

static CONTENT_TABLE: Lazy<ContentTable> = Lazy::new(|| compile_content_table(CONTENT_PATTERNS));

/// Run the infrastructure audit and write its artifact. Returns the artifact
/// path and the finding count.
pub fn run_audit(
    files: &[FileRecord],
    limits: &ScanLimits,
    out_dir: &Path,
    timestamp: &str,
    generated_at: &str,
    root_display: &str,
) -> Result<(PathBuf, usize)> {
    let findings = scan_files(files, limits, &FILENAME_TABLE, &CONTENT_TABLE);

    let mut text = report_banner("CLOUD INFRASTRUCTURE AUDIT", generated_at, root_display);
    text.push_str(&render_findings(CATEGORIES, &findings));

    let path = out_dir.join(format!("infra_audit_{}.txt", timestamp));
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;

    Ok((path, findings.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::scan::MatchKind;
    use tempfile::tempdir;

    fn record_on_disk(dir: &Path, relative: &str, content: &str) -> FileRecord {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        FileRecord::new(&path, relative, content.len() as u64)
    }

    #[test]
    fn test_tables_compile() {
        assert_eq!(FILENAME_TABLE.len(), FILENAME_PATTERNS.len());
        assert_eq!(CONTENT_TABLE.len(), CONTENT_PATTERNS.len());
        // Every raw pattern survived compilation.
        for ((_, raw), (_, compiled)) in FILENAME_PATTERNS.iter().zip(FILENAME_TABLE.iter()) {
            assert_eq!(raw.len(), compiled.len());
        }
        for ((_, raw), (_, compiled)) in CONTENT_PATTERNS.iter().zip(CONTENT_TABLE.iter()) {
            assert_eq!(raw.len(), compiled.len());
        }
    }

    #[test]
    fn test_dockerfile_matches_by_filename() {
        let temp = tempdir().unwrap();
        let files = vec![record_on_disk(temp.path(), "Dockerfile", "FROM rust:1.80")];

        let findings = scan_files(&files, &ScanLimits::default(), &FILENAME_TABLE, &CONTENT_TABLE);
        let containers: Vec<_> = findings
            .iter()
            .filter(|f| f.category == "containers")
            .collect();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].kind, MatchKind::Filename);
    }

    #[test]
    fn test_workflow_file_matches_ci_cd_by_path() {
        let temp = tempdir().unwrap();
        let files = vec![record_on_disk(
            temp.path(),
            ".github/workflows/ci.yml",
            "jobs:\n  build:\n    runs-on: ubuntu-latest\n",
        )];

        let findings = scan_files(&files, &ScanLimits::default(), &FILENAME_TABLE, &CONTENT_TABLE);
        assert!(findings.iter().any(|f| f.category == "ci-cd"));
    }

    #[test]
    fn test_boto3_matches_aws_by_content() {
        let temp = tempdir().unwrap();
        let files = vec![record_on_disk(
            temp.path(),
            "deploy.py",
            "import boto3\nclient = boto3.client('s3')\n",
        )];

        let findings = scan_files(&files, &ScanLimits::default(), &FILENAME_TABLE, &CONTENT_TABLE);
        let aws: Vec<_> = findings.iter().filter(|f| f.category == "aws").collect();
        assert_eq!(aws.len(), 1);
        assert_eq!(aws[0].kind, MatchKind::Content);
    }

    #[test]
    fn test_run_audit_writes_report() {
        let temp = tempdir().unwrap();
        let out = tempdir().unwrap();
        let files = vec![record_on_disk(temp.path(), "main.tf", "resource \"aws_s3_bucket\" \"b\" {}\n")];

        let (path, count) = run_audit(
            &files,
            &ScanLimits::default(),
            out.path(),
            "20240101_000000",
            "now",
            "/p",
        )
        .unwrap();

        assert!(count >= 1);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("CLOUD INFRASTRUCTURE AUDIT"));
        assert!(text.contains("[iac] main.tf"));
    }
}
