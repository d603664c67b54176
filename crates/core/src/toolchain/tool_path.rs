use super::installations::InstallationLocator;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use xcpilot_api::Installation;

/// Location of `devicectl` inside an Xcode bundle.
pub const DEVICECTL_SUBPATH: &str = "Contents/Developer/usr/bin/devicectl";

/// Resolves the `devicectl` executable, memoized per installation path.
///
/// A cached path is trusted without re-checking; if it disappears later the failure
/// shows up when the command runs.
pub struct ToolPathResolver {
    locator: Arc<InstallationLocator>,
    resolved: DashMap<PathBuf, PathBuf>,
}

impl ToolPathResolver {
    pub fn new(locator: Arc<InstallationLocator>) -> Self {
        Self {
            locator,
            resolved: DashMap::new(),
        }
    }

    pub async fn resolve(&self, installation: Option<&Installation>) -> PathBuf {
        if let Some(installation) = installation {
            if let Some(path) = self.resolved.get(&installation.path) {
                return path.clone();
            }
            if let Some(path) = self.verify(&installation.path) {
                return path;
            }
            debug!(
                "devicectl not executable in {}, searching other installations",
                installation.path.display()
            );
        }

        for candidate in self.locator.list().await {
            if let Some(path) = self.resolved.get(&candidate.path) {
                return path.clone();
            }
            if let Some(path) = self.verify(&candidate.path) {
                return path;
            }
        }

        let fallback = self.locator.default_installation().join(DEVICECTL_SUBPATH);
        warn!(
            "devicectl not found in any installation, falling back to {}",
            fallback.display()
        );
        fallback
    }

    fn verify(&self, installation: &Path) -> Option<PathBuf> {
        let path = installation.join(DEVICECTL_SUBPATH);
        if !is_executable(&path) {
            return None;
        }
        self.resolved
            .insert(installation.to_path_buf(), path.clone());
        Some(path)
    }
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}
