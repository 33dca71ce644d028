//! sitecheck - pre-deployment link validation for static documentation sites
//!
//! Serves the site locally and validates it:
//! - Scans entry point HTML for common textual link defects
//! - Crawls internal links with an external link checker, one file at a time in parallel
//! - Checks external links as an advisory, non-blocking phase
//! - Always stops the server it started

pub mod config;
pub mod error;
pub mod fakes;
pub mod links;
pub mod pipeline;
pub mod prereq;
pub mod report;
pub mod runner;
pub mod scan;
pub mod server;
pub mod targets;
pub mod telemetry;

// Re-export key types
pub use config::{
    ExternalCheckConfig, InternalCheckConfig, LinkCheckerConfig, ServerConfig, SiteCheckConfig,
};
pub use error::{Result, SiteCheckError};
pub use links::{
    check_external_links, check_internal_links, ExternalLinkOutcome, FileCheckResult,
    InternalLinkReport,
};
pub use pipeline::SiteCheck;
pub use prereq::check_prerequisites;
pub use report::{failure_advice, log_outcome, CheckSummary, RunOutcome, RunReport};
pub use runner::{OutputMode, ProcessRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use scan::{check_common_issues, CommonIssue, IssueKind, ScanReport};
pub use server::{acquire_server, start_server, ServerHandle};
pub use targets::{discover_targets, TargetFile};
pub use telemetry::init_tracing;
