//! External tool execution.
//!
//! Every subprocess that runs to completion (version probes, installs, link
//! checks) goes through [`ToolRunner`], so the orchestration code can be
//! exercised against [`crate::fakes::ScriptedRunner`] in tests.

use crate::error::{Result, SiteCheckError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Where a tool's stdout/stderr goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Pipe both streams and return them as combined output.
    Capture,

    /// Show the tool's native output on the terminal.
    Inherit,

    /// Drop all output.
    Discard,
}

/// A single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Label used in logs and errors.
    pub name: String,

    pub program: String,

    pub args: Vec<String>,

    pub output_mode: OutputMode,

    /// Kill the tool if it has not exited after this long.
    pub timeout: Option<Duration>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            output_mode: OutputMode::Capture,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments joined with spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub name: String,

    /// Exit code (0 = success, -1 when terminated by a signal).
    pub exit_code: i32,

    /// stdout followed by stderr; empty unless captured.
    pub output: String,

    pub duration_ms: u64,

    pub success: bool,
}

impl ToolOutput {
    /// Whether this tool passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

/// Runs external tools to completion.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// [`ToolRunner`] backed by real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let start = Instant::now();

        if invocation.program.trim().is_empty() {
            return Err(SiteCheckError::Config(format!(
                "tool {} has an empty program",
                invocation.name
            )));
        }

        debug!(tool = %invocation.name, command = %invocation.command_line(), "Launching tool");

        let (stdout, stderr) = match invocation.output_mode {
            OutputMode::Capture => (Stdio::piped(), Stdio::piped()),
            OutputMode::Inherit => (Stdio::inherit(), Stdio::inherit()),
            OutputMode::Discard => (Stdio::null(), Stdio::null()),
        };

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SiteCheckError::ToolSpawn {
                program: invocation.program.clone(),
                source,
            })?;

        // Dropping the timed-out future drops the child, which kills it.
        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| SiteCheckError::ToolTimeout {
                    name: invocation.name.clone(),
                    limit,
                })??,
            None => child.wait_with_output().await?,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(tool = %invocation.name, exit_code, duration_ms, "Tool finished");

        Ok(ToolOutput {
            name: invocation.name.clone(),
            exit_code,
            output: combined,
            duration_ms,
            success: output.status.success(),
        })
    }
}
