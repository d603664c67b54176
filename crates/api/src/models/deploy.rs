use crate::error::PilotError;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_CONFIGURATION: &str = "Debug";

/// Raw `run_on_device` input as received from a caller.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Path to the .xcodeproj or .xcworkspace
    pub project_path: Option<PathBuf>,
    /// Scheme to build and run
    pub scheme: Option<String>,
    /// Device name, UDID or CoreDevice identifier. Partial names are accepted.
    pub device: Option<String>,
    /// Build configuration (default: Debug)
    pub configuration: Option<String>,
    /// Stream the app's console output in the background after launch
    #[serde(default)]
    pub stream_logs: bool,
    /// Launch the process suspended so a debugger can attach
    #[serde(default)]
    pub start_stopped: bool,
    /// Environment variables for the launched process
    #[serde(default)]
    pub environment: IndexMap<String, String>,
    /// Path of the Xcode.app to use instead of the first discovered one
    pub xcode_path: Option<PathBuf>,
    /// Only list the known devices and return
    #[serde(default)]
    pub list_devices: bool,
    /// Skip build and install, launch what is already on the device
    #[serde(default)]
    pub skip_build: bool,
    /// Extra arguments passed to the launched app
    #[serde(default)]
    pub launch_args: Vec<String>,
    /// Bundle identifier to launch directly, skipping build settings lookup and build
    pub bundle_id: Option<String>,
}

/// Validated orchestrator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunConfig {
    ListDevices,
    Deploy(DeployConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub project_path: Option<PathBuf>,
    pub scheme: Option<String>,
    pub device: String,
    pub configuration: String,
    pub stream_logs: bool,
    pub start_stopped: bool,
    pub environment: IndexMap<String, String>,
    pub xcode_path: Option<PathBuf>,
    pub skip_build: bool,
    pub launch_args: Vec<String>,
    pub bundle_id: Option<String>,
}

impl DeployConfig {
    /// Build and install run unless skipped or a bundle id was given directly.
    pub fn builds(&self) -> bool {
        !self.skip_build && self.bundle_id.is_none()
    }
}

impl RunRequest {
    pub fn validate(self) -> Result<RunConfig, PilotError> {
        if self.list_devices {
            return Ok(RunConfig::ListDevices);
        }

        let device = non_empty(self.device)
            .ok_or_else(|| PilotError::InvalidConfig("`device` is required".into()))?;
        let bundle_id = non_empty(self.bundle_id);
        let scheme = non_empty(self.scheme);

        if bundle_id.is_none() {
            if self.project_path.is_none() {
                return Err(PilotError::InvalidConfig(
                    "`projectPath` is required unless `bundleId` is given".into(),
                ));
            }
            if scheme.is_none() {
                return Err(PilotError::InvalidConfig(
                    "`scheme` is required unless `bundleId` is given".into(),
                ));
            }
        }

        Ok(RunConfig::Deploy(DeployConfig {
            project_path: self.project_path,
            scheme,
            device,
            configuration: non_empty(self.configuration)
                .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string()),
            stream_logs: self.stream_logs,
            start_stopped: self.start_stopped,
            environment: self.environment,
            xcode_path: self.xcode_path,
            skip_build: self.skip_build,
            launch_args: self.launch_args,
            bundle_id,
        }))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `key1=value1,key2=value2`. Values are not escaped.
pub fn serialize_environment(env: &IndexMap<String, String>) -> String {
    env.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
