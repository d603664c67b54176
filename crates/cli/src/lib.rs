mod bundle_id;
mod devices;
mod installations;
mod mcp;
mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use xcpilot_core::{XcpilotConfig, XcpilotEngine};

#[derive(Parser)]
#[command(
    name = "xcpilot",
    version,
    about = "Build, install and launch Xcode projects on physical iOS devices",
    long_about = "xcpilot drives xcodebuild, xctrace and devicectl on behalf of coding agents. \
                  It reconciles the two device identifier spaces Apple's tools use and exposes \
                  the deploy workflow as MCP tools or plain commands."
)]
pub struct Cli {
    /// Config file (default: ~/.xcpilot/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Model Context Protocol (MCP) server on stdio
    #[command(
        long_about = "Serves the xcpilot tools over stdin/stdout. Logs go to ~/.xcpilot/logs only, \
                      so the protocol stream stays clean."
    )]
    Mcp,
    /// List connected physical devices
    Devices {
        /// Rediscover instead of using the cached list
        #[arg(long)]
        refresh: bool,
    },
    /// List Xcode installations
    Installations,
    /// Print the bundle identifier of a scheme
    BundleId {
        /// Path to the .xcodeproj or .xcworkspace
        #[arg(long, value_name = "PROJECT_PATH")]
        project: PathBuf,
        /// Scheme name
        #[arg(long)]
        scheme: String,
    },
    /// Build, install and launch a scheme on a device
    Run(run::RunArgs),
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The MCP server owns stdout; everything else may log to stderr too
    let _guard = match &cli.command {
        Commands::Mcp => xcpilot_core::logging::init_logging("mcp", false),
        _ => xcpilot_core::logging::init_logging("cli", true),
    };

    let config = XcpilotConfig::load(cli.config.as_deref())?;
    let engine = XcpilotEngine::new(config);
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Mcp => rt.block_on(mcp::run(engine)),
        Commands::Devices { refresh } => rt.block_on(devices::run(&engine, refresh)),
        Commands::Installations => rt.block_on(installations::run(&engine)),
        Commands::BundleId { project, scheme } => {
            rt.block_on(bundle_id::run(&engine, &project, &scheme))
        }
        Commands::Run(args) => rt.block_on(run::run(&engine, args)),
    }
}
