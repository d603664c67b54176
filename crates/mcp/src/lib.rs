use rmcp::{
    ErrorData as McpError,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, InitializeResult, ServerCapabilities},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use xcpilot_api::{IdentifierKind, PilotError, RunRequest, format_device_list};
use xcpilot_core::XcpilotEngine;

pub mod stdio;

#[derive(Clone)]
pub struct McpServer {
    pub(crate) tool_router: ToolRouter<Self>,
    pub(crate) engine: Arc<XcpilotEngine>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesArgs {
    /// Ignore the cached device list and rediscover now
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindDeviceArgs {
    /// Device name (full or partial), UDID or CoreDevice identifier
    pub name_or_id: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListInstallationsArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleIdentifierArgs {
    /// Path to the .xcodeproj or .xcworkspace
    pub project_path: PathBuf,
    /// Scheme whose build settings are read
    pub scheme: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamLogsArgs {
    /// Device name, UDID or CoreDevice identifier
    pub device: String,
    /// Bundle identifier of the app to attach to
    pub bundle_id: String,
    /// How long to stay attached, in seconds (default from config: 300)
    pub timeout_secs: Option<u64>,
}

fn tool_error(err: PilotError) -> CallToolResult {
    warn!("Tool call failed: {}", err);
    CallToolResult::error(vec![Content::text(err.to_string())])
}

fn text(body: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(body.into())])
}

#[tool_router]
impl McpServer {
    pub fn new(engine: Arc<XcpilotEngine>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    #[tool(
        description = "Build, install and launch an Xcode scheme on a physical iOS device. Resolves the device by name, UDID or CoreDevice identifier, builds with xcodebuild, launches with devicectl and reinstalls once if the app is missing. Set listDevices=true to only list devices."
    )]
    pub async fn run_on_device(
        &self,
        params: Parameters<RunRequest>,
    ) -> Result<CallToolResult, McpError> {
        let config = match params.0.validate() {
            Ok(config) => config,
            Err(e) => return Ok(tool_error(e)),
        };
        match self.engine.deployer().run(config).await {
            Ok(report) => Ok(text(report)),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(
        description = "List connected physical devices with both their UDID (xcodebuild) and CoreDevice identifier (devicectl). Results are cached for a few minutes unless forceRefresh is set."
    )]
    pub async fn list_devices(
        &self,
        params: Parameters<ListDevicesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let devices = self
            .engine
            .devices()
            .all_devices(params.0.force_refresh)
            .await;
        Ok(text(format_device_list(&devices)))
    }

    #[tool(
        description = "Resolve one device by UDID, CoreDevice identifier, exact name or partial name and return its full record as JSON."
    )]
    pub async fn find_device(
        &self,
        params: Parameters<FindDeviceArgs>,
    ) -> Result<CallToolResult, McpError> {
        let device = match self.engine.devices().find_device(&params.0.name_or_id).await {
            Ok(device) => device,
            Err(e) => return Ok(tool_error(e)),
        };
        match serde_json::to_string_pretty(&device) {
            Ok(json) => Ok(text(json)),
            Err(e) => Err(McpError::new(
                rmcp::model::ErrorCode(-32000),
                e.to_string(),
                None,
            )),
        }
    }

    #[tool(description = "List the Xcode installations found on this Mac, first one is the default.")]
    pub async fn list_installations(
        &self,
        _params: Parameters<ListInstallationsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let installations = self.engine.installations().list().await;
        let body = installations
            .iter()
            .map(|i| format!("- {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text(format!(
            "Found {} Xcode installation(s):\n{body}",
            installations.len()
        )))
    }

    #[tool(
        description = "Read PRODUCT_BUNDLE_IDENTIFIER from the build settings of a project or workspace scheme."
    )]
    pub async fn get_bundle_identifier(
        &self,
        params: Parameters<BundleIdentifierArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        match self
            .engine
            .bundles()
            .bundle_id(&args.project_path, &args.scheme)
            .await
        {
            Ok(id) => Ok(text(id)),
            Err(e) => Ok(tool_error(e)),
        }
    }

    #[tool(
        description = "Attach to a running app's console on a device in the background. Returns immediately; output goes to the server log."
    )]
    pub async fn stream_device_logs(
        &self,
        params: Parameters<StreamLogsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let device = match self.engine.devices().find_device(&args.device).await {
            Ok(device) => device,
            Err(e) => return Ok(tool_error(e)),
        };
        let coredevice_id = match device.require(IdentifierKind::Secondary) {
            Ok(id) => id.to_string(),
            Err(e) => return Ok(tool_error(e)),
        };

        let installation = self.engine.installations().first().await;
        let timeout = args.timeout_secs.map(Duration::from_secs);
        let limit = timeout.unwrap_or_else(|| self.engine.config().log_stream_timeout());
        info!("Streaming {} on {}", args.bundle_id, device.name);

        self.engine.logs().spawn(
            coredevice_id,
            args.bundle_id.clone(),
            Some(installation),
            timeout,
        );
        Ok(text(format!(
            "Streaming console output of {} on {} for up to {}s.",
            args.bundle_id,
            device.name,
            limit.as_secs()
        )))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for McpServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            server_info: Implementation {
                name: "xcpilot".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
