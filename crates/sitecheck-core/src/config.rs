//! Run configuration.
//!
//! Every component receives its settings from [`SiteCheckConfig`] rather than
//! reading process-wide constants. Values can be loaded from a TOML file; any
//! key that is omitted keeps its default.

use crate::error::{Result, SiteCheckError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteCheckConfig {
    /// Port the local static server listens on.
    pub port: u16,

    /// Site root served by the local server and scanned for HTML files.
    pub root: PathBuf,

    /// Entry point HTML file, relative to `root`.
    pub entry_point: String,

    /// Subdirectories whose `index.html` is checked when present.
    pub subdirs: Vec<String>,

    /// Per-invocation limit for external tools, in seconds (0 disables).
    pub tool_timeout_secs: u64,

    /// Skip the external-link phase.
    pub internal_only: bool,

    /// Show subprocess output and the server's log stream.
    pub verbose: bool,

    pub server: ServerConfig,

    pub link_checker: LinkCheckerConfig,
}

impl Default for SiteCheckConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            root: PathBuf::from("."),
            entry_point: "index.html".to_string(),
            subdirs: ["book", "tinytorch", "labs", "kits"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tool_timeout_secs: 300,
            internal_only: false,
            verbose: false,
            server: ServerConfig::default(),
            link_checker: LinkCheckerConfig::default(),
        }
    }
}

impl SiteCheckConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(SiteCheckError::Config("port must be non-zero".to_string()));
        }
        if self.entry_point.trim().is_empty() {
            return Err(SiteCheckError::Config(
                "entry_point must not be empty".to_string(),
            ));
        }
        for (key, program) in [
            ("server.program", &self.server.program),
            ("link_checker.program", &self.link_checker.program),
            ("link_checker.package_manager", &self.link_checker.package_manager),
        ] {
            if program.trim().is_empty() {
                return Err(SiteCheckError::Config(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// Base URL of the local server.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Timeout applied to each tool invocation, if any.
    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.tool_timeout_secs > 0).then(|| Duration::from_secs(self.tool_timeout_secs))
    }
}

/// Static file server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interpreter that provides the static file server.
    pub program: String,

    /// Server arguments; `{port}` is replaced with the configured port.
    pub args: Vec<String>,

    /// Fixed delay before the spawned server is treated as ready.
    pub warmup_ms: u64,

    /// Limit for the "is something already listening" probe.
    pub probe_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec![
                "-m".to_string(),
                "http.server".to_string(),
                "{port}".to_string(),
            ],
            warmup_ms: 2000,
            probe_timeout_ms: 2000,
        }
    }
}

impl ServerConfig {
    /// Server arguments with the port substituted.
    pub fn args_for_port(&self, port: u16) -> Vec<String> {
        let port = port.to_string();
        self.args.iter().map(|a| a.replace("{port}", &port)).collect()
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Broken-link-checker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkCheckerConfig {
    /// Link checker executable.
    pub program: String,

    /// Package that provides `program`.
    pub package: String,

    /// Package manager used to find or install `package` globally.
    pub package_manager: String,

    pub internal: InternalCheckConfig,

    pub external: ExternalCheckConfig,
}

impl Default for LinkCheckerConfig {
    fn default() -> Self {
        Self {
            program: "blc".to_string(),
            package: "broken-link-checker".to_string(),
            package_manager: "npm".to_string(),
            internal: InternalCheckConfig::default(),
            external: ExternalCheckConfig::default(),
        }
    }
}

/// Same-site crawl settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InternalCheckConfig {
    /// Only genuinely broken references count as failures at level 3.
    pub filter_level: u8,

    /// Concurrent request cap per link.
    pub requests: u32,
}

impl Default for InternalCheckConfig {
    fn default() -> Self {
        Self {
            filter_level: 3,
            requests: 2,
        }
    }
}

/// Off-site check settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExternalCheckConfig {
    pub filter_level: u8,

    pub requests: u32,

    /// Domains known to reject automated requests.
    pub exclude: Vec<String>,
}

impl Default for ExternalCheckConfig {
    fn default() -> Self {
        Self {
            filter_level: 2,
            requests: 1,
            exclude: ["linkedin.com", "twitter.com", "facebook.com"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
