use crate::bundle::BundleIdResolver;
use crate::config::XcpilotConfig;
use crate::deploy::{Deployer, LogStreamer};
use crate::device::{DeviceRegistry, NameContainment};
use crate::exec::ShellExecutor;
use crate::toolchain::{InstallationLocator, ToolPathResolver};
use std::sync::Arc;
use xcpilot_api::CommandRunner;

/// Owns every cache and wires the components together.
///
/// Each engine has independent state; the server builds one per process.
pub struct XcpilotEngine {
    config: XcpilotConfig,
    locator: Arc<InstallationLocator>,
    registry: Arc<DeviceRegistry>,
    bundles: Arc<BundleIdResolver>,
    logs: LogStreamer,
    deployer: Deployer,
}

impl XcpilotEngine {
    pub fn new(config: XcpilotConfig) -> Self {
        Self::with_runner(config, Arc::new(ShellExecutor::new()))
    }

    pub fn with_runner(config: XcpilotConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let timeout = config.command_timeout();
        let locator = Arc::new(InstallationLocator::new(
            config.applications_dir.clone(),
            config.default_installation.clone(),
            runner.clone(),
            timeout,
        ));
        let tools = Arc::new(ToolPathResolver::new(locator.clone()));
        let registry = Arc::new(DeviceRegistry::new(
            runner.clone(),
            tools.clone(),
            Box::new(NameContainment),
            config.device_cache_ttl(),
            timeout,
        ));
        let bundles = Arc::new(BundleIdResolver::new(runner.clone(), timeout));
        let logs = LogStreamer::new(runner.clone(), tools.clone(), config.log_stream_timeout());
        let deployer = Deployer::new(
            runner,
            locator.clone(),
            tools,
            registry.clone(),
            bundles.clone(),
            logs.clone(),
            timeout,
            config.build_timeout(),
        );

        Self {
            config,
            locator,
            registry,
            bundles,
            logs,
            deployer,
        }
    }

    pub fn config(&self) -> &XcpilotConfig {
        &self.config
    }

    pub fn installations(&self) -> &InstallationLocator {
        &self.locator
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn bundles(&self) -> &BundleIdResolver {
        &self.bundles
    }

    pub fn logs(&self) -> &LogStreamer {
        &self.logs
    }

    pub fn deployer(&self) -> &Deployer {
        &self.deployer
    }
}
