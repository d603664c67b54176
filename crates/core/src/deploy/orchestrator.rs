use super::log_stream::LogStreamer;
use crate::bundle::{BundleIdResolver, find_setting};
use crate::device::DeviceRegistry;
use crate::toolchain::{DeviceCtl, InstallationLocator, LaunchSpec, ToolPathResolver, XcodeBuild};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use xcpilot_api::{
    CommandOutput, CommandRequest, CommandRunner, DeployConfig, IdentifierKind, Installation,
    PilotError, Result, RunConfig, format_device_list,
};

/// Failure text `devicectl` uses when the bundle id isn't on the device.
const NOT_INSTALLED_MARKERS: &[&str] = &["is not installed", "isn't installed", "not installed on"];

/// What a successful deployment did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub device: String,
    pub bundle_id: String,
    pub installation: Installation,
    pub built: bool,
    /// Output of the on-demand install, when the first launch found no app.
    pub reinstall: Option<CommandOutput>,
    pub launch: CommandOutput,
    pub streaming_logs: bool,
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Launched {} on {}", self.bundle_id, self.device)?;
        writeln!(f, "Xcode: {}", self.installation)?;
        if self.built {
            writeln!(f, "Build and install: succeeded")?;
        }
        if let Some(install) = &self.reinstall {
            writeln!(f, "\nApp was not installed; installed it and relaunched.")?;
            writeln!(f, "Install output:\n{}", install.combined().trim())?;
        }
        writeln!(f, "\nLaunch output:\n{}", self.launch.combined().trim())?;
        if self.streaming_logs {
            write!(f, "\nStreaming console output in the background.")?;
        }
        Ok(())
    }
}

/// Runs the build → install → launch → stream workflow against one device.
pub struct Deployer {
    runner: Arc<dyn CommandRunner>,
    locator: Arc<InstallationLocator>,
    tools: Arc<ToolPathResolver>,
    registry: Arc<DeviceRegistry>,
    bundles: Arc<BundleIdResolver>,
    logs: LogStreamer,
    command_timeout: Duration,
    build_timeout: Duration,
}

impl Deployer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        locator: Arc<InstallationLocator>,
        tools: Arc<ToolPathResolver>,
        registry: Arc<DeviceRegistry>,
        bundles: Arc<BundleIdResolver>,
        logs: LogStreamer,
        command_timeout: Duration,
        build_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            locator,
            tools,
            registry,
            bundles,
            logs,
            command_timeout,
            build_timeout,
        }
    }

    /// Run a validated request and render the result for the caller.
    pub async fn run(&self, config: RunConfig) -> Result<String> {
        match config {
            RunConfig::ListDevices => {
                let devices = self.registry.all_devices(true).await;
                Ok(format_device_list(&devices))
            }
            RunConfig::Deploy(config) => Ok(self.deploy(&config).await?.to_string()),
        }
    }

    pub async fn deploy(&self, config: &DeployConfig) -> Result<DeployReport> {
        let installation = match &config.xcode_path {
            Some(path) => self.locator.find(path).await,
            None => self.locator.first().await,
        };
        info!("Deploying to '{}' with {}", config.device, installation);

        let device = self.registry.find_device(&config.device).await?;
        let udid = require_identity(&device.name, device.udid.as_deref(), IdentifierKind::Primary)?;
        let coredevice_id = require_identity(
            &device.name,
            device.coredevice_id.as_deref(),
            IdentifierKind::Secondary,
        )?;

        let bundle_id = match &config.bundle_id {
            Some(id) => id.clone(),
            None => {
                let (project, scheme) = project_and_scheme(config)?;
                self.bundles.bundle_id(project, scheme).await?
            }
        };

        let devicectl = self.tools.resolve(Some(&installation)).await;

        let mut app_path = None;
        if config.builds() {
            let (project, scheme) = project_and_scheme(config)?;
            app_path = self
                .estimate_app_path(project, scheme, &config.configuration, &installation)
                .await;
            self.build_and_install(project, scheme, &config.configuration, udid, &installation)
                .await?;
        }

        let (launch, reinstall) = self
            .launch_with_reinstall(&devicectl, coredevice_id, &bundle_id, config, app_path.as_deref())
            .await?;

        if config.stream_logs {
            self.logs.spawn(
                coredevice_id.to_string(),
                bundle_id.clone(),
                Some(installation.clone()),
                None,
            );
        }

        Ok(DeployReport {
            device: device.name.clone(),
            bundle_id,
            installation,
            built: config.builds(),
            reinstall,
            launch,
            streaming_logs: config.stream_logs,
        })
    }

    /// `CONFIGURATION_BUILD_DIR/<scheme>.app`, or None if the settings can't be read.
    async fn estimate_app_path(
        &self,
        project: &Path,
        scheme: &str,
        configuration: &str,
        installation: &Installation,
    ) -> Option<PathBuf> {
        let command = XcodeBuild::new(project, Some(installation))
            .show_device_build_settings(scheme, configuration);
        match self.execute(command, self.command_timeout).await {
            Ok(out) => {
                let path = find_setting(&out.stdout, "CONFIGURATION_BUILD_DIR")
                    .map(|dir| PathBuf::from(dir).join(format!("{scheme}.app")));
                if path.is_none() {
                    debug!("CONFIGURATION_BUILD_DIR missing, reinstall fallback disabled");
                }
                path
            }
            Err(e) => {
                debug!("Could not estimate build product path: {}", e);
                None
            }
        }
    }

    async fn build_and_install(
        &self,
        project: &Path,
        scheme: &str,
        configuration: &str,
        udid: &str,
        installation: &Installation,
    ) -> Result<CommandOutput> {
        let command = XcodeBuild::new(project, Some(installation))
            .build_and_install(scheme, configuration, udid);
        info!("Building {} ({}) for {}", scheme, configuration, udid);
        self.execute(command, self.build_timeout).await
    }

    async fn launch_with_reinstall(
        &self,
        devicectl: &Path,
        coredevice_id: &str,
        bundle_id: &str,
        config: &DeployConfig,
        app_path: Option<&Path>,
    ) -> Result<(CommandOutput, Option<CommandOutput>)> {
        let ctl = DeviceCtl::new(devicectl);
        let launch = ctl.launch(&LaunchSpec {
            device: coredevice_id,
            bundle_id,
            environment: Some(&config.environment),
            start_stopped: config.start_stopped,
            args: &config.launch_args,
        });

        let err = match self.execute(launch.clone(), self.command_timeout).await {
            Ok(out) => return Ok((out, None)),
            Err(e) => e,
        };

        let Some(app_path) = app_path.filter(|_| is_not_installed(&err)) else {
            return Err(err);
        };

        warn!(
            "{} is not installed, installing {} and retrying",
            bundle_id,
            app_path.display()
        );
        let install = self
            .execute(ctl.install_app(coredevice_id, app_path), self.command_timeout)
            .await?;
        let out = self.execute(launch, self.command_timeout).await?;
        Ok((out, Some(install)))
    }

    async fn execute(&self, command: String, timeout: Duration) -> Result<CommandOutput> {
        self.runner
            .execute(CommandRequest::new(command).with_timeout(timeout))
            .await
    }
}

fn require_identity<'a>(
    device: &str,
    id: Option<&'a str>,
    missing: IdentifierKind,
) -> Result<&'a str> {
    id.ok_or_else(|| PilotError::IncompleteDeviceIdentity {
        device: device.to_string(),
        missing,
    })
}

fn project_and_scheme(config: &DeployConfig) -> Result<(&Path, &str)> {
    match (&config.project_path, &config.scheme) {
        (Some(project), Some(scheme)) => Ok((project.as_path(), scheme.as_str())),
        _ => Err(PilotError::InvalidConfig(
            "`projectPath` and `scheme` are required to build or look up the bundle identifier"
                .into(),
        )),
    }
}

/// Launch failed because the app isn't on the device.
pub fn is_not_installed(err: &PilotError) -> bool {
    if !matches!(err, PilotError::Process { .. }) {
        return false;
    }
    let text = format!("{}\n{}", err, err.process_output()).to_lowercase();
    NOT_INSTALLED_MARKERS.iter().any(|m| text.contains(m))
}
