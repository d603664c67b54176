use clap::Args;
use indexmap::IndexMap;
use std::path::PathBuf;
use tracing::info;
use xcpilot_api::RunRequest;
use xcpilot_core::XcpilotEngine;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the .xcodeproj or .xcworkspace
    #[arg(long, value_name = "PROJECT_PATH")]
    pub project: Option<PathBuf>,
    /// Scheme to build and run
    #[arg(long)]
    pub scheme: Option<String>,
    /// Device name, UDID or CoreDevice identifier
    #[arg(long)]
    pub device: String,
    /// Build configuration (default: Debug)
    #[arg(long)]
    pub configuration: Option<String>,
    /// Attach to the app's console after launch
    #[arg(long)]
    pub stream_logs: bool,
    /// Launch suspended so a debugger can attach
    #[arg(long)]
    pub start_stopped: bool,
    /// Environment variable for the app, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env)]
    pub env: Vec<(String, String)>,
    /// Xcode.app to use instead of the first one found
    #[arg(long, value_name = "PATH")]
    pub xcode: Option<PathBuf>,
    /// Launch what is already installed
    #[arg(long)]
    pub skip_build: bool,
    /// Launch this bundle identifier directly, without building
    #[arg(long)]
    pub bundle_id: Option<String>,
    /// Arguments passed to the app
    #[arg(last = true)]
    pub launch_args: Vec<String>,
}

impl From<RunArgs> for RunRequest {
    fn from(args: RunArgs) -> Self {
        RunRequest {
            project_path: args.project,
            scheme: args.scheme,
            device: Some(args.device),
            configuration: args.configuration,
            stream_logs: args.stream_logs,
            start_stopped: args.start_stopped,
            environment: args.env.into_iter().collect::<IndexMap<_, _>>(),
            xcode_path: args.xcode,
            list_devices: false,
            skip_build: args.skip_build,
            launch_args: args.launch_args,
            bundle_id: args.bundle_id,
        }
    }
}

fn parse_env(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.is_empty() => Ok((key.to_string(), val.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{value}'")),
    }
}

pub async fn run(engine: &XcpilotEngine, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let streaming = args.stream_logs;
    let config = RunRequest::from(args).validate()?;
    let report = engine.deployer().run(config).await?;
    println!("{report}");

    if streaming {
        // The stream task dies with the runtime, so keep the process alive for it
        let limit = engine.config().log_stream_timeout();
        info!("Waiting up to {}s for the console stream, Ctrl-C to stop", limit.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(limit) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }
    Ok(())
}
