//! Prerequisite checks for the server interpreter and the link checker.

use crate::config::SiteCheckConfig;
use crate::error::{Result, SiteCheckError};
use crate::runner::{OutputMode, ToolInvocation, ToolRunner};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Whether `program --version` runs and exits 0.
///
/// Spawn failures of any kind count as "not available".
pub async fn is_available(
    runner: &dyn ToolRunner,
    program: &str,
    timeout: Option<Duration>,
) -> bool {
    let invocation = ToolInvocation::new(format!("{program} --version"), program)
        .arg("--version")
        .output_mode(OutputMode::Discard)
        .timeout(timeout);

    match runner.run(&invocation).await {
        Ok(out) => out.passed(),
        Err(e) if e.not_found() => {
            debug!(program, "Not found on PATH");
            false
        }
        Err(e) => {
            debug!(program, error = %e, "Availability probe failed");
            false
        }
    }
}

/// Verify the server interpreter exists and the link checker is usable,
/// installing the link checker through the package manager if needed.
pub async fn check_prerequisites(runner: &dyn ToolRunner, config: &SiteCheckConfig) -> Result<()> {
    let timeout = config.tool_timeout();
    let interpreter = &config.server.program;
    if !is_available(runner, interpreter, timeout).await {
        return Err(SiteCheckError::InterpreterMissing {
            program: interpreter.clone(),
        });
    }

    let checker = &config.link_checker;
    if is_available(runner, &checker.program, timeout).await {
        debug!(program = %checker.program, "Link checker available");
        return Ok(());
    }

    // Installed globally but not on PATH still counts.
    let listed = ToolInvocation::new("package listing", &checker.package_manager)
        .args(["list", "-g", checker.package.as_str()])
        .output_mode(OutputMode::Discard)
        .timeout(timeout);
    if matches!(runner.run(&listed).await, Ok(ref out) if out.passed()) {
        warn!(
            package = %checker.package,
            "Link checker is installed globally but `{}` is not on PATH",
            checker.program
        );
        return Ok(());
    }

    let hint = format!("{} install -g {}", checker.package_manager, checker.package);
    info!(package = %checker.package, "Installing link checker globally");

    let install = ToolInvocation::new("package install", &checker.package_manager)
        .args(["install", "-g", checker.package.as_str()])
        .output_mode(OutputMode::Inherit)
        .timeout(timeout);

    match runner.run(&install).await {
        Ok(out) if out.passed() => {
            info!(package = %checker.package, "Link checker installed");
            Ok(())
        }
        Ok(out) => {
            debug!(exit_code = out.exit_code, "Install exited non-zero");
            Err(SiteCheckError::InstallFailed {
                package: checker.package.clone(),
                hint,
            })
        }
        Err(e) => {
            if e.not_found() {
                warn!(program = %checker.package_manager, "Package manager is not on PATH");
            }
            debug!(error = %e, "Install could not run");
            Err(SiteCheckError::InstallFailed {
                package: checker.package.clone(),
                hint,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;

    #[tokio::test]
    async fn all_tools_present_installs_nothing() {
        let runner = ScriptedRunner::new();
        check_prerequisites(&runner, &SiteCheckConfig::default())
            .await
            .expect("prerequisites");

        assert!(runner.invocations_matching("npm").is_empty());
        assert_eq!(runner.invocations().len(), 2);
    }

    #[tokio::test]
    async fn missing_interpreter_is_fatal() {
        let runner = ScriptedRunner::new().missing("python3");
        let err = check_prerequisites(&runner, &SiteCheckConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SiteCheckError::InterpreterMissing { ref program } if program == "python3"));
        assert!(runner.invocations_matching("blc").is_empty());
    }

    #[tokio::test]
    async fn globally_listed_package_skips_install() {
        let runner = ScriptedRunner::new().missing("blc --version");
        check_prerequisites(&runner, &SiteCheckConfig::default())
            .await
            .expect("prerequisites");

        assert_eq!(runner.invocations_matching("npm list -g").len(), 1);
        assert!(runner.invocations_matching("npm install").is_empty());
    }

    #[tokio::test]
    async fn missing_checker_is_installed_with_native_output() {
        let runner = ScriptedRunner::new()
            .missing("blc --version")
            .exit_with("npm list", 1, "");
        check_prerequisites(&runner, &SiteCheckConfig::default())
            .await
            .expect("prerequisites");

        let installs = runner.invocations_matching("npm install -g broken-link-checker");
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].output_mode, OutputMode::Inherit);
        assert_eq!(installs[0].timeout, Some(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn failed_install_is_fatal() {
        let runner = ScriptedRunner::new()
            .missing("blc --version")
            .exit_with("npm list", 1, "")
            .exit_with("npm install", 243, "EACCES");
        let err = check_prerequisites(&runner, &SiteCheckConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SiteCheckError::InstallFailed { .. }));
        assert!(err.to_string().contains("npm install -g broken-link-checker"));
    }

    #[tokio::test]
    async fn missing_package_manager_is_install_failure() {
        let runner = ScriptedRunner::new().missing("blc").missing("npm");
        let err = check_prerequisites(&runner, &SiteCheckConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SiteCheckError::InstallFailed { .. }));
    }
}
