//! Bundle identifier lookup from build settings.

use crate::toolchain::XcodeBuild;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use xcpilot_api::{CommandRequest, CommandRunner, PilotError, Result};

const BUNDLE_ID_SETTING: &str = "PRODUCT_BUNDLE_IDENTIFIER";

/// Resolves `PRODUCT_BUNDLE_IDENTIFIER` per (project, scheme).
///
/// Entries never expire: edits to the project's bundle identifier made while the
/// server is running are not picked up.
pub struct BundleIdResolver {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    cache: DashMap<(PathBuf, String), String>,
}

impl BundleIdResolver {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self {
            runner,
            timeout,
            cache: DashMap::new(),
        }
    }

    pub async fn bundle_id(&self, project: &Path, scheme: &str) -> Result<String> {
        let key = (project.to_path_buf(), scheme.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let command = XcodeBuild::new(project, None).show_build_settings(scheme);
        let output = self
            .runner
            .execute(CommandRequest::new(command).with_timeout(self.timeout))
            .await?;

        let bundle_id = find_setting(&output.stdout, BUNDLE_ID_SETTING).ok_or_else(|| {
            PilotError::BundleIdentifierNotFound {
                project: project.to_path_buf(),
                scheme: scheme.to_string(),
            }
        })?;

        debug!("Bundle identifier for {} is {}", scheme, bundle_id);
        self.cache.insert(key, bundle_id.clone());
        Ok(bundle_id)
    }
}

/// Value of the first `    KEY = value` line in `-showBuildSettings` output.
pub fn find_setting(output: &str, key: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (name, value) = line.split_once('=')?;
        if name.trim() != key {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
