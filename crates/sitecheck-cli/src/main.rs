//! sitecheck - pre-deployment link validation for static documentation sites
//!
//! Serves the site on a local port, scans the entry point HTML files for
//! common link defects, then crawls internal and external links with
//! `broken-link-checker`.
//!
//! Exit status is 0 when every blocking check passes (or the run is
//! interrupted) and 1 otherwise.

use anyhow::{Context, Result};
use clap::Parser;
use sitecheck_core::{log_outcome, ProcessRunner, RunReport, SiteCheck, SiteCheckConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "sitecheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate links of a static site before deploying it", long_about = None)]
struct Cli {
    /// Check only internal links (faster)
    #[arg(long)]
    internal_only: bool,

    /// Show link checker and server output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines and a JSON summary on stdout
    #[arg(long)]
    json: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the local server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Site root to serve and scan (overrides config)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Per-tool timeout in seconds, 0 to disable (overrides config)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> Result<SiteCheckConfig> {
        let mut config = match &self.config {
            Some(path) => SiteCheckConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SiteCheckConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.tool_timeout_secs = secs;
        }
        config.internal_only |= self.internal_only;
        config.verbose |= self.verbose;

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler the run can only end on its own.
        warn!(error = %e, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

fn print_summary(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.summary).context("Failed to encode summary")?;
    println!("{json}");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    sitecheck_core::init_tracing(cli.json, level);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(1);
        }
    };

    let report = SiteCheck::run(Arc::new(ProcessRunner::new()), &config, wait_for_interrupt()).await;
    log_outcome(&report);

    if cli.json {
        if let Err(e) = print_summary(&report) {
            error!("{:#}", e);
        }
    }

    ExitCode::from(report.exit_code())
}
