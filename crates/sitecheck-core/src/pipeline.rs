//! Validation pipeline orchestration.

use crate::config::SiteCheckConfig;
use crate::error::{Result, SiteCheckError};
use crate::links::{check_external_links, run_internal_checks, ExternalLinkOutcome};
use crate::prereq::check_prerequisites;
use crate::report::{CheckSummary, RunOutcome, RunReport};
use crate::runner::ToolRunner;
use crate::scan::check_common_issues;
use crate::server::start_server;
use crate::targets::{discover_targets, TargetFile};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Site validation orchestrator.
pub struct SiteCheck;

impl SiteCheck {
    /// Run the whole validation against the configured site.
    ///
    /// Sequence: prerequisites, server acquisition, common-issue scan,
    /// internal links, external links (unless `internal_only`). Every step
    /// races against `interrupt`. Once a server handle exists it is
    /// terminated before returning, whatever the outcome.
    pub async fn run<I>(
        runner: Arc<dyn ToolRunner>,
        config: &SiteCheckConfig,
        interrupt: I,
    ) -> RunReport
    where
        I: Future<Output = ()>,
    {
        let mut summary = CheckSummary::new(config);
        tokio::pin!(interrupt);

        info!(run_id = %summary.run_id, root = %config.root.display(), "sitecheck link checker");
        if config.internal_only {
            info!("Running in internal-only mode");
        }

        let setup = async {
            check_prerequisites(runner.as_ref(), config).await?;
            start_server(config).await
        };
        let mut server = tokio::select! {
            started = setup => match started {
                Ok(server) => server,
                Err(e) => return RunReport::finish(summary, RunOutcome::Failed(e)),
            },
            _ = &mut interrupt => return RunReport::finish(summary, RunOutcome::Interrupted),
        };
        summary.server_reused = Some(!server.is_owned());
        summary.server_pid = server.pid();

        let warmup = tokio::select! {
            ready = server.wait_ready(config.server.warmup()) => ready.err().map(RunOutcome::Failed),
            _ = &mut interrupt => Some(RunOutcome::Interrupted),
        };
        if let Some(outcome) = warmup {
            server.terminate().await;
            return RunReport::finish(summary, outcome);
        }
        info!(port = server.port(), reused = !server.is_owned(), "Server ready");

        let targets = discover_targets(config);
        summary.targets = targets.iter().map(|t| t.relative.clone()).collect();

        let outcome = tokio::select! {
            checked = Self::run_checks(runner.clone(), config, &targets, &mut summary) => match checked {
                Ok(()) => RunOutcome::Passed,
                Err(e) => RunOutcome::Failed(e),
            },
            _ = &mut interrupt => RunOutcome::Interrupted,
        };

        server.terminate().await;
        RunReport::finish(summary, outcome)
    }

    /// Scan, then crawl internal links, then external links.
    ///
    /// Internal failures stop the pipeline before the external phase. Common
    /// issues are reported as failure only after the link phases have run.
    pub async fn run_checks(
        runner: Arc<dyn ToolRunner>,
        config: &SiteCheckConfig,
        targets: &[TargetFile],
        summary: &mut CheckSummary,
    ) -> Result<()> {
        let scan = check_common_issues(targets)?;
        summary.common_issues = scan.issues.clone();

        let internal = run_internal_checks(runner.clone(), config, targets).await;
        summary.internal = internal.results.clone();
        internal.into_result()?;

        if config.internal_only {
            summary.external = Some(ExternalLinkOutcome::Skipped);
        } else {
            summary.external = Some(check_external_links(runner.as_ref(), config).await);
        }

        if !scan.is_clean() {
            return Err(SiteCheckError::CommonIssuesFound {
                count: scan.issues.len(),
            });
        }
        Ok(())
    }
}
