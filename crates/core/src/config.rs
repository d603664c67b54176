//! Service configuration.
//!
//! Loaded from `~/.xcpilot/config.json` when present. Every field has a default,
//! so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use xcpilot_api::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XcpilotConfig {
    /// Directory scanned for `Xcode*.app` bundles (default: /Applications)
    pub applications_dir: PathBuf,

    /// Installation assumed when none can be discovered (default: /Applications/Xcode.app)
    pub default_installation: PathBuf,

    /// Timeout for ordinary toolchain commands (default: 60000)
    pub command_timeout_ms: u64,

    /// Timeout for the blocking build+install step (default: 600000)
    pub build_timeout_ms: u64,

    /// How long a console stream stays attached (default: 300000)
    pub log_stream_timeout_ms: u64,

    /// Age after which the device list is rediscovered (default: 300)
    pub device_cache_ttl_secs: u64,
}

impl Default for XcpilotConfig {
    fn default() -> Self {
        Self {
            applications_dir: PathBuf::from("/Applications"),
            default_installation: PathBuf::from("/Applications/Xcode.app"),
            command_timeout_ms: 60_000,
            build_timeout_ms: 600_000,
            log_stream_timeout_ms: 300_000,
            device_cache_ttl_secs: 300,
        }
    }
}

impl XcpilotConfig {
    /// `~/.xcpilot`, the home for config and logs.
    pub fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".xcpilot")
    }

    pub fn default_path() -> PathBuf {
        Self::base_dir().join("config.json")
    }

    /// Load from `path`, or from the default location if `path` is None.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build_timeout_ms)
    }

    pub fn log_stream_timeout(&self) -> Duration {
        Duration::from_millis(self.log_stream_timeout_ms)
    }

    pub fn device_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.device_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = XcpilotConfig::default();
        assert_eq!(config.command_timeout(), Duration::from_secs(60));
        assert_eq!(config.log_stream_timeout(), Duration::from_secs(300));
        assert_eq!(config.device_cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"applications_dir": "/Volumes/Dev/Apps"}"#).unwrap();

        let config = XcpilotConfig::load(Some(&path)).unwrap();
        assert_eq!(config.applications_dir, PathBuf::from("/Volumes/Dev/Apps"));
        assert_eq!(config.command_timeout_ms, 60_000);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = XcpilotConfig::load(Some(&temp.path().join("absent.json"))).unwrap();
        assert_eq!(config, XcpilotConfig::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(XcpilotConfig::load(Some(&path)).is_err());
    }
}
