use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use xcpilot_api::{CommandOutput, CommandRequest, CommandRunner, PilotError, Result};
use xcpilot_core::toolchain::DEVICECTL_SUBPATH;

/// Answers `defaults read` for bundles whose path contains a known marker.
pub struct FakeDefaults {
    versions: Vec<(&'static str, &'static str, &'static str)>,
    pub seen: Mutex<Vec<String>>,
}

impl FakeDefaults {
    /// `(path marker, CFBundleShortVersionString, ProductBuildVersion)`
    pub fn new(versions: Vec<(&'static str, &'static str, &'static str)>) -> Self {
        Self {
            versions,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for FakeDefaults {
    async fn execute(&self, request: CommandRequest) -> Result<CommandOutput> {
        self.seen.lock().unwrap().push(request.command.clone());
        let hit = self
            .versions
            .iter()
            .find(|(marker, _, _)| request.command.contains(&format!("/{marker}/")));
        match hit {
            Some((_, version, _)) if request.command.contains("CFBundleShortVersionString") => {
                Ok(CommandOutput::new(format!("{version}\n"), ""))
            }
            Some((_, _, build)) if request.command.contains("ProductBuildVersion") => {
                Ok(CommandOutput::new(format!("{build}\n"), ""))
            }
            _ => Err(PilotError::Process {
                command: request.command,
                code: Some(1),
                stdout: String::new(),
                stderr: "The domain/default pair does not exist".to_string(),
            }),
        }
    }
}

/// Create `<dir>/<name>` with a devicectl binary; `executable` sets the mode bits.
pub fn fake_xcode(dir: &Path, name: &str, executable: bool) -> PathBuf {
    let app = dir.join(name);
    let devicectl = app.join(DEVICECTL_SUBPATH);
    std::fs::create_dir_all(devicectl.parent().unwrap()).unwrap();
    std::fs::write(&devicectl, "#!/bin/sh\n").unwrap();

    use std::os::unix::fs::PermissionsExt;
    let mode = if executable { 0o755 } else { 0o644 };
    std::fs::set_permissions(&devicectl, std::fs::Permissions::from_mode(mode)).unwrap();
    app
}
