//! Target file discovery.

use crate::config::SiteCheckConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// An HTML entry point that exists under the site root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFile {
    /// Path relative to the site root, `/`-separated so it doubles as a URL path.
    pub relative: String,

    /// Path on disk.
    pub path: PathBuf,
}

impl TargetFile {
    fn new(root: &Path, relative: String) -> Self {
        let path = relative
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(root.to_path_buf(), |acc, part| acc.join(part));
        Self { relative, path }
    }

    /// URL of this file on the local server.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.relative)
    }
}

/// Collapse `/`-separated segments, dropping empty and `.` segments, so
/// `./book/`, `book` and `book//` all name the same file.
fn normalize_relative(relative: &str) -> String {
    relative
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Entry point first, then each subdirectory's `index.html`, keeping only
/// files that exist and never listing the same path twice.
pub fn discover_targets(config: &SiteCheckConfig) -> Vec<TargetFile> {
    let candidates = std::iter::once(normalize_relative(&config.entry_point)).chain(
        config
            .subdirs
            .iter()
            .map(|dir| normalize_relative(&format!("{dir}/index.html"))),
    );

    let mut targets: Vec<TargetFile> = Vec::new();
    for relative in candidates {
        if targets.iter().any(|t| t.relative == relative) {
            continue;
        }
        let target = TargetFile::new(&config.root, relative);
        if target.path.is_file() {
            targets.push(target);
        }
    }
    targets
}
