//! Run summary and final reporting.

use crate::config::SiteCheckConfig;
use crate::error::SiteCheckError;
use crate::links::{ExternalLinkOutcome, FileCheckResult};
use crate::scan::CommonIssue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Passed,
    Failed(SiteCheckError),
    /// The user interrupted the run; the server was still cleaned up.
    Interrupted,
}

impl RunOutcome {
    /// Process exit status: 0 for success or interruption, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Passed | RunOutcome::Interrupted => 0,
            RunOutcome::Failed(_) => 1,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            RunOutcome::Passed => "passed",
            RunOutcome::Failed(_) => "failed",
            RunOutcome::Interrupted => "interrupted",
        }
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub port: u16,
    pub internal_only: bool,

    /// `Some(true)` when an already-running server was used.
    pub server_reused: Option<bool>,

    /// Pid of the server this run spawned, if any.
    pub server_pid: Option<u32>,

    pub targets: Vec<String>,
    pub common_issues: Vec<CommonIssue>,
    pub internal: Vec<FileCheckResult>,

    /// `None` when the run ended before the external phase.
    pub external: Option<ExternalLinkOutcome>,

    pub status: String,
    pub error: Option<String>,
}

impl CheckSummary {
    pub fn new(config: &SiteCheckConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            port: config.port,
            internal_only: config.internal_only,
            server_reused: None,
            server_pid: None,
            targets: Vec::new(),
            common_issues: Vec::new(),
            internal: Vec::new(),
            external: None,
            status: "running".to_string(),
            error: None,
        }
    }
}

/// Final summary paired with the outcome that decides the exit code.
#[derive(Debug)]
pub struct RunReport {
    pub summary: CheckSummary,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn finish(mut summary: CheckSummary, outcome: RunOutcome) -> Self {
        summary.finished_at = Some(Utc::now());
        summary.status = outcome.status().to_string();
        if let RunOutcome::Failed(e) = &outcome {
            summary.error = Some(e.to_string());
        }
        Self { summary, outcome }
    }

    pub fn exit_code(&self) -> u8 {
        self.outcome.exit_code()
    }
}

/// Follow-up line for a failed run. Check failures point at the findings
/// already logged; anything else means the checks never completed.
pub fn failure_advice(err: &SiteCheckError) -> &'static str {
    if err.is_fatal() {
        "Link checks could not complete; resolve the error above and retry."
    } else {
        "Please fix the issues above before deploying."
    }
}

/// Log the closing banner for a finished run.
pub fn log_outcome(report: &RunReport) {
    match &report.outcome {
        RunOutcome::Passed => {
            info!(run_id = %report.summary.run_id, "All link checks passed!");
            info!("Your website is ready for deployment.");
        }
        RunOutcome::Failed(e) => {
            error!(run_id = %report.summary.run_id, "Link check failed: {}", e);
            error!("{}", failure_advice(e));
        }
        RunOutcome::Interrupted => {
            warn!(run_id = %report.summary.run_id, "Link check interrupted by user");
        }
    }
}
