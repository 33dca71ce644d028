//! Internal and external link checks delegated to the link-checker tool.

use crate::config::SiteCheckConfig;
use crate::error::{Result, SiteCheckError};
use crate::runner::{ToolInvocation, ToolRunner};
use crate::targets::TargetFile;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Outcome of checking one entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCheckResult {
    pub file: String,

    pub passed: bool,

    /// Exit code, or `None` if the tool never produced one.
    pub exit_code: Option<i32>,

    /// Combined tool output, or the launch error.
    pub output: String,
}

/// Per-file results of the internal phase, in target order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InternalLinkReport {
    pub results: Vec<FileCheckResult>,
}

impl InternalLinkReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failed_files(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.file.clone())
            .collect()
    }

    /// `Ok` only when every file passed.
    pub fn into_result(self) -> Result<Self> {
        if self.all_passed() {
            Ok(self)
        } else {
            Err(SiteCheckError::InternalLinksFailed {
                files: self.failed_files(),
            })
        }
    }
}

/// Outcome of the external phase. Never blocks the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ExternalLinkOutcome {
    Passed,
    Warned { detail: String },
    Skipped,
}

/// Same-site recursive crawl of `target`.
pub fn internal_invocation(config: &SiteCheckConfig, target: &TargetFile) -> ToolInvocation {
    let internal = &config.link_checker.internal;
    ToolInvocation::new(
        format!("internal links: {}", target.relative),
        &config.link_checker.program,
    )
    .arg(target.url(&config.base_url()))
    .args([
        "--recursive".to_string(),
        "--exclude-external".to_string(),
        "--filter-level".to_string(),
        internal.filter_level.to_string(),
        "--requests".to_string(),
        internal.requests.to_string(),
    ])
    .timeout(config.tool_timeout())
}

/// Off-site check of the entry point.
pub fn external_invocation(config: &SiteCheckConfig) -> ToolInvocation {
    let external = &config.link_checker.external;
    let url = format!(
        "{}/{}",
        config.base_url(),
        config.entry_point.trim_start_matches('/')
    );

    let mut invocation = ToolInvocation::new("external links", &config.link_checker.program)
        .arg(url)
        .args([
            "--external-only".to_string(),
            "--filter-level".to_string(),
            external.filter_level.to_string(),
            "--requests".to_string(),
            external.requests.to_string(),
        ])
        .timeout(config.tool_timeout());
    for domain in &external.exclude {
        invocation = invocation.args(["--exclude", domain.as_str()]);
    }
    invocation
}

/// Crawl every target concurrently and fail if any target has broken links.
///
/// The decision is made only once every invocation has finished.
pub async fn check_internal_links(
    runner: Arc<dyn ToolRunner>,
    config: &SiteCheckConfig,
    targets: &[TargetFile],
) -> Result<InternalLinkReport> {
    run_internal_checks(runner, config, targets)
        .await
        .into_result()
}

/// Crawl every target concurrently and collect per-file results.
///
/// All invocations are launched before any result is awaited. Launch errors
/// and timeouts count as failures for that file.
pub async fn run_internal_checks(
    runner: Arc<dyn ToolRunner>,
    config: &SiteCheckConfig,
    targets: &[TargetFile],
) -> InternalLinkReport {
    info!(files = targets.len(), "Checking internal links");

    let mut join_set = JoinSet::new();
    for (idx, target) in targets.iter().enumerate() {
        info!(file = %target.relative, "Checking file");
        let runner = Arc::clone(&runner);
        let invocation = internal_invocation(config, target);
        join_set.spawn(async move { (idx, runner.run(&invocation).await) });
    }

    let mut slots: Vec<Option<FileCheckResult>> = vec![None; targets.len()];
    while let Some(joined) = join_set.join_next().await {
        let (idx, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                // A panicked task leaves its slot empty; it is reported below.
                error!(error = %e, "Link check task failed");
                continue;
            }
        };
        let file = targets[idx].relative.clone();
        let result = match outcome {
            Ok(out) => FileCheckResult {
                file,
                passed: out.passed(),
                exit_code: Some(out.exit_code),
                output: out.output,
            },
            Err(e) => FileCheckResult {
                file,
                passed: false,
                exit_code: None,
                output: e.to_string(),
            },
        };
        slots[idx] = Some(result);
    }

    let mut report = InternalLinkReport::default();
    for (target, slot) in targets.iter().zip(slots) {
        let result = slot.unwrap_or_else(|| FileCheckResult {
            file: target.relative.clone(),
            passed: false,
            exit_code: None,
            output: "link check task did not complete".to_string(),
        });

        if result.passed {
            info!(file = %result.file, "All internal links OK");
        } else {
            error!(file = %result.file, exit_code = ?result.exit_code, "Found broken internal links");
            if config.verbose {
                info!(file = %result.file, "Link checker output:\n{}", result.output);
            }
        }
        report.results.push(result);
    }

    report
}

/// Check off-site links from the entry point. Failures only warn.
pub async fn check_external_links(
    runner: &dyn ToolRunner,
    config: &SiteCheckConfig,
) -> ExternalLinkOutcome {
    info!("Checking external links (this may take a while)");

    let detail = match runner.run(&external_invocation(config)).await {
        Ok(out) if out.passed() => {
            info!("All external links OK");
            return ExternalLinkOutcome::Passed;
        }
        Ok(out) => {
            if config.verbose {
                info!("Link checker output:\n{}", out.output);
            }
            format!("link checker exited with code {}", out.exit_code)
        }
        Err(e) => e.to_string(),
    };

    warn!(detail = %detail, "Some external links may be broken (non-critical)");
    ExternalLinkOutcome::Warned { detail }
}
