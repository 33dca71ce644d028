//! Textual scan for common link defects.
//!
//! These checks run on raw file text and never parse HTML. The unclosed-href
//! check is a line heuristic: it flags attributes that legitimately span
//! lines and misses other malformed markup.

use crate::error::Result;
use crate::targets::TargetFile;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{error, info};

/// Kind of textual defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// `hhttps` / `hhttp`, a protocol prefixed twice.
    DoubledProtocol,

    /// `localhost` or `127.0.0.1` anywhere in the markup.
    LocalhostLink,

    /// `href="` with no closing quote before end of line.
    UnclosedHref,
}

impl IssueKind {
    pub fn description(&self) -> &'static str {
        match self {
            IssueKind::DoubledProtocol => "doubled protocol (hhttps/hhttp)",
            IssueKind::LocalhostLink => "localhost link",
            IssueKind::UnclosedHref => "unclosed href attribute",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A defect found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonIssue {
    pub file: String,
    pub kind: IssueKind,
}

/// All defects found across the scanned files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub files_scanned: usize,
    pub issues: Vec<CommonIssue>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

fn unclosed_href() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?m)href="[^"]*$"#).expect("static pattern compiles"))
}

/// Issue kinds present in `content`, in declaration order.
pub fn scan_content(content: &str) -> Vec<IssueKind> {
    let mut kinds = Vec::new();

    if content.contains("hhttps") || content.contains("hhttp") {
        kinds.push(IssueKind::DoubledProtocol);
    }
    if content.contains("localhost") || content.contains("127.0.0.1") {
        kinds.push(IssueKind::LocalhostLink);
    }
    if unclosed_href().is_match(content) {
        kinds.push(IssueKind::UnclosedHref);
    }

    kinds
}

/// Scan every target that still exists on disk.
pub fn scan_files(targets: &[TargetFile]) -> Result<ScanReport> {
    let mut report = ScanReport::default();

    for target in targets {
        if !target.path.is_file() {
            continue;
        }
        let bytes = std::fs::read(&target.path)?;
        let content = String::from_utf8_lossy(&bytes);
        report.files_scanned += 1;

        for kind in scan_content(&content) {
            report.issues.push(CommonIssue {
                file: target.relative.clone(),
                kind,
            });
        }
    }

    Ok(report)
}

/// Scan `targets` and log each defect. Returns the report; callers treat a
/// non-clean report as a blocking failure.
pub fn check_common_issues(targets: &[TargetFile]) -> Result<ScanReport> {
    info!("Checking for common link issues");

    let report = scan_files(targets)?;
    for issue in &report.issues {
        error!(file = %issue.file, issue = %issue.kind, "Found {}", issue.kind);
    }
    if report.is_clean() {
        info!(files = report.files_scanned, "No common link issues found");
    }

    Ok(report)
}
