//! Local static file server lifecycle.

use crate::config::SiteCheckConfig;
use crate::error::{Result, SiteCheckError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Ownership token for the server used during a run.
///
/// A handle either owns a process this run spawned, or stands in for a
/// server that was already listening. Only owned processes are ever killed.
/// The owned child is also killed on drop, so an early return cannot leak it.
#[derive(Debug)]
pub struct ServerHandle {
    port: u16,
    program: String,
    child: Option<Child>,
}

impl ServerHandle {
    /// Handle for a server someone else started.
    pub fn external(port: u16) -> Self {
        Self {
            port,
            program: String::new(),
            child: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether this run started the server.
    pub fn is_owned(&self) -> bool {
        self.child.is_some()
    }

    /// OS pid of the owned server, if still held.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Give an owned server `warmup` to come up, then fail if it already
    /// exited. Returns immediately for a reused server.
    pub async fn wait_ready(&mut self, warmup: Duration) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        debug!(
            port = self.port,
            pid = ?child.id(),
            warmup_ms = warmup.as_millis() as u64,
            "Waiting for server warm-up"
        );
        tokio::time::sleep(warmup).await;

        if let Some(status) = child.try_wait()? {
            return Err(SiteCheckError::ServerExited {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    /// Stop the owned server and reap it. Safe to call any number of times.
    pub async fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        info!(port = self.port, program = %self.program, "Cleaning up server");
        if let Err(e) = child.kill().await {
            warn!(port = self.port, error = %e, "Failed to stop server");
        }
    }
}

/// Whether anything answers HTTP on `localhost:<port>`. Any status counts.
pub async fn probe_server(port: u16, timeout: Duration) -> bool {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "Could not build probe client");
            return false;
        }
    };

    match client.get(format!("http://localhost:{port}")).send().await {
        Ok(response) => {
            debug!(port, status = %response.status(), "Port answered probe");
            true
        }
        Err(e) => {
            debug!(port, error = %e, "Nothing answered probe");
            false
        }
    }
}

/// Reuse a server already listening on the configured port, or spawn one
/// rooted at the site root. The spawned process is returned before warm-up;
/// see [`ServerHandle::wait_ready`].
pub async fn start_server(config: &SiteCheckConfig) -> Result<ServerHandle> {
    let port = config.port;
    let server = &config.server;
    info!(port, "Starting local server");

    if probe_server(port, server.probe_timeout()).await {
        info!(port, "Server already running");
        return Ok(ServerHandle::external(port));
    }

    let (stdout, stderr) = if config.verbose {
        (Stdio::inherit(), Stdio::inherit())
    } else {
        (Stdio::null(), Stdio::null())
    };

    let child = Command::new(&server.program)
        .args(server.args_for_port(port))
        .current_dir(&config.root)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| SiteCheckError::ServerSpawn {
            program: server.program.clone(),
            source,
        })?;

    Ok(ServerHandle {
        port,
        program: server.program.clone(),
        child: Some(child),
    })
}

/// [`start_server`] followed by the fixed warm-up delay.
pub async fn acquire_server(config: &SiteCheckConfig) -> Result<ServerHandle> {
    let mut handle = start_server(config).await?;
    handle.wait_ready(config.server.warmup()).await?;
    Ok(handle)
}
