//! End-to-end runs of the validation pipeline with a scripted link checker
//! and a real (stand-in) server process.

use sitecheck_core::fakes::ScriptedRunner;
use sitecheck_core::{
    ExternalLinkOutcome, IssueKind, RunOutcome, SiteCheck, SiteCheckConfig, SiteCheckError,
};
use std::future::pending;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Config whose "server" is a long sleep, so spawning and killing it is
/// observable without python.
fn config_for(root: &Path) -> SiteCheckConfig {
    let mut config = SiteCheckConfig {
        port: free_port(),
        root: root.to_path_buf(),
        ..Default::default()
    };
    config.server.program = "sleep".to_string();
    config.server.args = vec!["30".to_string()];
    config.server.warmup_ms = 50;
    config.server.probe_timeout_ms = 500;
    config
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn process_alive(pid: u32) -> bool {
    std::process::Command::new("sh")
        .args(["-c", &format!("kill -0 {pid} 2>/dev/null")])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Test: entry file with a localhost link fails the run with exit code 1
#[tokio::test]
async fn test_localhost_link_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", r#"<a href="http://localhost:8080/x">x</a>"#);
    let runner = Arc::new(ScriptedRunner::new());

    let report = SiteCheck::run(runner, &config_for(dir.path()), pending()).await;

    assert_eq!(report.exit_code(), 1);
    assert!(matches!(
        report.outcome,
        RunOutcome::Failed(SiteCheckError::CommonIssuesFound { count: 1 })
    ));
    assert_eq!(report.summary.common_issues.len(), 1);
    assert_eq!(report.summary.common_issues[0].file, "index.html");
    assert_eq!(report.summary.common_issues[0].kind, IssueKind::LocalhostLink);
}

/// Test: empty site passes vacuously and the spawned server is stopped
#[tokio::test]
async fn test_empty_site_passes_and_stops_server() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new());

    let report = SiteCheck::run(runner.clone(), &config_for(dir.path()), pending()).await;

    assert_eq!(report.exit_code(), 0, "run failed: {:?}", report.outcome);
    assert!(report.summary.targets.is_empty());
    assert!(report.summary.internal.is_empty());
    assert_eq!(report.summary.server_reused, Some(false));

    let pid = report.summary.server_pid.expect("server was spawned");
    assert!(!process_alive(pid), "server {pid} still running after cleanup");
    assert!(runner.invocations_matching("--recursive").is_empty());
}

/// Test: --internal-only never invokes the external phase
#[tokio::test]
async fn test_internal_only_skips_external() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "<a href=\"/book/index.html\">Book</a>");
    write(dir.path(), "book/index.html", "<p>book</p>");
    let runner = Arc::new(ScriptedRunner::new());

    let mut config = config_for(dir.path());
    config.internal_only = true;
    let report = SiteCheck::run(runner.clone(), &config, pending()).await;

    assert_eq!(report.exit_code(), 0, "run failed: {:?}", report.outcome);
    assert_eq!(report.summary.external, Some(ExternalLinkOutcome::Skipped));
    assert!(runner.invocations_matching("--external-only").is_empty());
    assert_eq!(runner.invocations_matching("--recursive").len(), 2);
}

/// Test: a broken internal link in one subdirectory fails the run
#[tokio::test]
async fn test_internal_failure_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "<p>home</p>");
    write(dir.path(), "labs/index.html", "<p>labs</p>");
    let runner = Arc::new(ScriptedRunner::new().exit_with("/labs/index.html", 1, "BROKEN"));

    let report = SiteCheck::run(runner, &config_for(dir.path()), pending()).await;

    assert_eq!(report.exit_code(), 1);
    match &report.outcome {
        RunOutcome::Failed(SiteCheckError::InternalLinksFailed { files }) => {
            assert_eq!(files, &vec!["labs/index.html".to_string()]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    let pid = report.summary.server_pid.expect("server was spawned");
    assert!(!process_alive(pid));
}

/// Test: broken external links only warn
#[tokio::test]
async fn test_external_failure_is_advisory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "<a href=\"https://example.com\">x</a>");
    let runner = Arc::new(ScriptedRunner::new().exit_with("--external-only", 1, "BROKEN"));

    let report = SiteCheck::run(runner, &config_for(dir.path()), pending()).await;

    assert_eq!(report.exit_code(), 0, "run failed: {:?}", report.outcome);
    assert!(matches!(
        report.summary.external,
        Some(ExternalLinkOutcome::Warned { .. })
    ));
}

/// Test: missing interpreter aborts before any server is started
#[tokio::test]
async fn test_missing_interpreter_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new().missing("sleep --version"));

    let report = SiteCheck::run(runner, &config_for(dir.path()), pending()).await;

    assert_eq!(report.exit_code(), 1);
    assert!(matches!(
        report.outcome,
        RunOutcome::Failed(SiteCheckError::InterpreterMissing { .. })
    ));
    assert_eq!(report.summary.server_pid, None);
}

/// Test: interruption still stops the spawned server and exits 0
#[tokio::test]
async fn test_interrupt_cleans_up_server() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "<p>home</p>");

    // Link checks that never finish on their own.
    let runner = Arc::new(ScriptedRunner::new().hang("--recursive"));
    let config = config_for(dir.path());

    let report = SiteCheck::run(
        runner,
        &config,
        tokio::time::sleep(Duration::from_millis(500)),
    )
    .await;

    assert!(matches!(report.outcome, RunOutcome::Interrupted));
    assert_eq!(report.exit_code(), 0);
    let pid = report.summary.server_pid.expect("server was spawned");
    assert!(!process_alive(pid));
}

/// Test: interruption during server warm-up stops the server and exits 0
#[tokio::test]
async fn test_interrupt_during_warmup_cleans_up_server() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "<p>home</p>");
    let runner = Arc::new(ScriptedRunner::new());
    let mut config = config_for(dir.path());
    config.server.warmup_ms = 30_000;

    let report = SiteCheck::run(
        runner.clone(),
        &config,
        tokio::time::sleep(Duration::from_millis(300)),
    )
    .await;

    assert!(matches!(report.outcome, RunOutcome::Interrupted));
    assert_eq!(report.exit_code(), 0);
    assert!(report.summary.targets.is_empty());
    assert!(runner.invocations_matching("--recursive").is_empty());
    let pid = report.summary.server_pid.expect("server was spawned");
    assert!(!process_alive(pid));
}

/// Test: a server that dies during warm-up is a setup failure
#[tokio::test]
async fn test_server_exit_during_warmup_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let mut config = config_for(dir.path());
    config.server.program = "false".to_string();
    config.server.args.clear();
    config.server.warmup_ms = 200;

    let report = SiteCheck::run(runner, &config, pending()).await;

    assert_eq!(report.exit_code(), 1);
    match &report.outcome {
        RunOutcome::Failed(e) => {
            assert!(matches!(e, SiteCheckError::ServerExited { .. }));
            assert!(e.is_fatal());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(report.summary.internal.is_empty());
}
