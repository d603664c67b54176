//! Xcode installation discovery.
//!
//! Discovers installations from:
//! - `Xcode*.app` bundles in the applications directory
//! - the conventional `/Applications/Xcode.app` when nothing else is found

use super::command::quote;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use xcpilot_api::{CommandRequest, CommandRunner, Installation};

static XCODE_BUNDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Xcode.*\.app$").expect("static regex"));

/// Lists installations once and memoizes the result.
pub struct InstallationLocator {
    applications_dir: PathBuf,
    default_installation: PathBuf,
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    installations: OnceCell<Vec<Installation>>,
}

impl InstallationLocator {
    pub fn new(
        applications_dir: PathBuf,
        default_installation: PathBuf,
        runner: Arc<dyn CommandRunner>,
        timeout: Duration,
    ) -> Self {
        Self {
            applications_dir,
            default_installation,
            runner,
            timeout,
            installations: OnceCell::const_new(),
        }
    }

    pub fn default_installation(&self) -> &Path {
        &self.default_installation
    }

    /// All installations in file-name order. Never empty and never fails.
    pub async fn list(&self) -> &[Installation] {
        self.installations
            .get_or_init(|| self.discover())
            .await
            .as_slice()
    }

    /// The first discovered installation.
    pub async fn first(&self) -> Installation {
        self.list()
            .await
            .first()
            .cloned()
            .unwrap_or_else(|| Installation::unknown(&self.default_installation))
    }

    /// The installation at `path`, with metadata if it was discovered.
    pub async fn find(&self, path: &Path) -> Installation {
        match self.list().await.iter().find(|i| i.path == path) {
            Some(installation) => installation.clone(),
            None => self.describe(path.to_path_buf()).await,
        }
    }

    async fn discover(&self) -> Vec<Installation> {
        let candidates = match self.scan_bundles().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    "Failed to enumerate {}: {}",
                    self.applications_dir.display(),
                    e
                );
                Vec::new()
            }
        };

        if candidates.is_empty() {
            debug!(
                "No Xcode installations found, assuming {}",
                self.default_installation.display()
            );
            return vec![Installation::unknown(&self.default_installation)];
        }

        let mut installations = Vec::with_capacity(candidates.len());
        for path in candidates {
            installations.push(self.describe(path).await);
        }
        installations
    }

    async fn scan_bundles(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.applications_dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if XCODE_BUNDLE.is_match(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| self.applications_dir.join(name))
            .collect())
    }

    /// Read version metadata, falling back to "unknown" if either value is unreadable.
    async fn describe(&self, path: PathBuf) -> Installation {
        let version = self
            .read_default(&path.join("Contents/Info"), "CFBundleShortVersionString")
            .await;
        let build = self
            .read_default(&path.join("Contents/version"), "ProductBuildVersion")
            .await;

        match (version, build) {
            (Some(version), Some(build)) => Installation::new(path, version, Some(build)),
            _ => Installation::unknown(path),
        }
    }

    async fn read_default(&self, plist: &Path, key: &str) -> Option<String> {
        let command = format!(
            "defaults read {} {}",
            quote(&plist.to_string_lossy()),
            key
        );
        match self
            .runner
            .execute(CommandRequest::new(command).with_timeout(self.timeout))
            .await
        {
            Ok(out) => Some(out.stdout.trim().to_string()).filter(|v| !v.is_empty()),
            Err(e) => {
                debug!("Could not read {} from {}: {}", key, plist.display(), e);
                None
            }
        }
    }
}
