//! Error taxonomy for sitecheck.

use std::time::Duration;

/// Errors produced while validating a site.
#[derive(Debug, thiserror::Error)]
pub enum SiteCheckError {
    #[error("{program} is required but was not found; install it and retry")]
    InterpreterMissing { program: String },

    #[error("failed to install {package}; run `{hint}` manually and make sure its bin directory is on PATH")]
    InstallFailed { package: String, hint: String },

    #[error("failed to start server `{program}`: {source}")]
    ServerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server `{program}` exited during warm-up ({status})")]
    ServerExited { program: String, status: String },

    #[error("failed to launch `{program}`: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{name}` timed out after {}s", .limit.as_secs())]
    ToolTimeout { name: String, limit: Duration },

    #[error("common link issues found ({count})")]
    CommonIssuesFound { count: usize },

    #[error("internal link check failed for: {}", .files.join(", "))]
    InternalLinksFailed { files: Vec<String> },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SiteCheckError {
    /// Whether this error happened before any check could run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::CommonIssuesFound { .. } | Self::InternalLinksFailed { .. }
        )
    }

    /// Whether a spawn failed because the executable does not exist.
    pub fn not_found(&self) -> bool {
        match self {
            Self::ToolSpawn { source, .. } | Self::ServerSpawn { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

/// Result type for sitecheck operations.
pub type Result<T> = std::result::Result<T, SiteCheckError>;
