//! Command lines for `xcodebuild`, `xctrace` and `devicectl`.
//!
//! Every caller-supplied value is shell-quoted. Extra launch arguments are the one
//! exception: they are appended verbatim so callers can pass flags through.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use xcpilot_api::{Installation, serialize_environment};

/// POSIX-quote a value for `/bin/sh`.
pub fn quote(value: &str) -> String {
    shlex::try_quote(value)
        .map(|q| q.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

pub fn is_workspace(project: &Path) -> bool {
    project.extension().and_then(|e| e.to_str()) == Some("xcworkspace")
}

/// `xcodebuild` invocations scoped to one project or workspace.
pub struct XcodeBuild {
    project: PathBuf,
    developer_dir: Option<PathBuf>,
}

impl XcodeBuild {
    pub fn new(project: &Path, installation: Option<&Installation>) -> Self {
        Self {
            project: project.to_path_buf(),
            developer_dir: installation.map(Installation::developer_dir),
        }
    }

    fn base(&self, scheme: &str) -> String {
        let flag = if is_workspace(&self.project) {
            "-workspace"
        } else {
            "-project"
        };
        let prefix = self
            .developer_dir
            .as_ref()
            .map(|dir| format!("DEVELOPER_DIR={} ", quote(&dir.to_string_lossy())))
            .unwrap_or_default();
        format!(
            "{prefix}xcodebuild {flag} {} -scheme {}",
            quote(&self.project.to_string_lossy()),
            quote(scheme)
        )
    }

    pub fn show_build_settings(&self, scheme: &str) -> String {
        format!("{} -showBuildSettings", self.base(scheme))
    }

    /// Settings for a device build of `configuration`.
    pub fn show_device_build_settings(&self, scheme: &str, configuration: &str) -> String {
        format!(
            "{} -configuration {} -sdk iphoneos -showBuildSettings",
            self.base(scheme),
            quote(configuration)
        )
    }

    pub fn build_and_install(&self, scheme: &str, configuration: &str, udid: &str) -> String {
        format!(
            "{} -configuration {} -destination {} build install",
            self.base(scheme),
            quote(configuration),
            quote(&format!("id={udid}"))
        )
    }
}

pub fn xctrace_list_devices() -> String {
    "xcrun xctrace list devices".to_string()
}

/// Arguments for `devicectl device process launch`.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec<'a> {
    pub device: &'a str,
    pub bundle_id: &'a str,
    pub environment: Option<&'a IndexMap<String, String>>,
    pub start_stopped: bool,
    pub args: &'a [String],
}

/// `devicectl` invocations through a resolved executable path.
pub struct DeviceCtl<'a> {
    path: &'a Path,
}

impl<'a> DeviceCtl<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    fn exe(&self) -> String {
        quote(&self.path.to_string_lossy())
    }

    pub fn list_devices(&self) -> String {
        format!("{} list devices", self.exe())
    }

    pub fn install_app(&self, device: &str, app: &Path) -> String {
        format!(
            "{} device install app --device {} {}",
            self.exe(),
            quote(device),
            quote(&app.to_string_lossy())
        )
    }

    pub fn launch(&self, spec: &LaunchSpec<'_>) -> String {
        let mut cmd = format!(
            "{} device process launch --device {}",
            self.exe(),
            quote(spec.device)
        );
        if let Some(env) = spec.environment.filter(|env| !env.is_empty()) {
            cmd.push_str(" --environment-variables ");
            cmd.push_str(&quote(&serialize_environment(env)));
        }
        if spec.start_stopped {
            cmd.push_str(" --start-stopped");
        }
        cmd.push(' ');
        cmd.push_str(&quote(spec.bundle_id));
        for arg in spec.args {
            cmd.push(' ');
            cmd.push_str(arg);
        }
        cmd
    }

    pub fn console(&self, device: &str, bundle_id: &str) -> String {
        format!(
            "{} device process launch --console --terminate-existing --device {} {}",
            self.exe(),
            quote(device),
            quote(bundle_id)
        )
    }
}
