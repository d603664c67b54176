use async_trait::async_trait;
use rmcp::model::CallToolResult;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use xcpilot_api::{CommandOutput, CommandRequest, CommandRunner, PilotError, Result};
use xcpilot_core::{XcpilotConfig, XcpilotEngine};
use xcpilot_mcp::McpServer;

pub const XCTRACE: &str = "\
== Devices ==
Jane's iPhone (17.4) (AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE)
== Simulators ==
iPhone 15 Simulator (17.4) (99999999-2222-3333-4444-555555555555)
";

pub const DEVICECTL: &str = "\
Name            Hostname                        Identifier                  State                Model
-------------   -----------------------------   -------------------------   ------------------   -----
Jane's iPhone   Janes-iPhone.coredevice.local   00008110-001234567890ABCD   available (paired)   iPhone 15 Pro (iPhone16,1)
John's iPad     Johns-iPad.coredevice.local     00008103-000A1B2C3D4E5F60   available (paired)   iPad Pro (iPad13,4)
";

/// Canned replies keyed by command substring; records every command it sees.
pub struct FakeToolchain {
    replies: Vec<(&'static str, &'static str)>,
    pub seen: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self {
            replies: vec![
                ("CFBundleShortVersionString", "16.2"),
                ("ProductBuildVersion", "16C5032a"),
                ("xctrace list devices", XCTRACE),
                ("devicectl list devices", DEVICECTL),
                ("-showBuildSettings", "    PRODUCT_BUNDLE_IDENTIFIER = com.example.app\n"),
                ("--console", ""),
                ("device process launch", "Launched application."),
            ],
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(pattern))
            .count()
    }
}

#[async_trait]
impl CommandRunner for FakeToolchain {
    async fn execute(&self, request: CommandRequest) -> Result<CommandOutput> {
        self.seen.lock().unwrap().push(request.command.clone());
        match self
            .replies
            .iter()
            .find(|(pattern, _)| request.command.contains(pattern))
        {
            Some((_, stdout)) => Ok(CommandOutput::new(*stdout, "")),
            None => Err(PilotError::Process {
                command: request.command,
                code: Some(1),
                stdout: String::new(),
                stderr: "no canned reply".to_string(),
            }),
        }
    }
}

pub struct TestServer {
    pub server: McpServer,
    pub toolchain: Arc<FakeToolchain>,
    _apps: TempDir,
}

pub fn server() -> TestServer {
    let apps = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(apps.path().join("Xcode.app/Contents")).unwrap();
    let config = XcpilotConfig {
        applications_dir: apps.path().to_path_buf(),
        default_installation: apps.path().join("Xcode.app"),
        ..Default::default()
    };
    let toolchain = Arc::new(FakeToolchain::new());
    let engine = XcpilotEngine::with_runner(config, toolchain.clone());
    TestServer {
        server: McpServer::new(Arc::new(engine)),
        toolchain,
        _apps: apps,
    }
}

/// `(is_error, text of the first content block)`.
pub fn unpack(result: CallToolResult) -> (bool, String) {
    let json = serde_json::to_value(&result).unwrap();
    let is_error = json["isError"].as_bool().unwrap_or(false);
    let text = json["content"][0]["text"].as_str().unwrap_or_default().to_string();
    (is_error, text)
}
