use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(60_000);

/// A fully assembled shell command line plus its execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: String,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// stdout followed by stderr, for parsers that don't care which stream a line came from.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes external commands.
///
/// Every toolchain interaction goes through this seam, which lets the registry and
/// the deployment workflow be driven by a scripted runner in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion.
    ///
    /// Fails with `SecurityViolation`, `Timeout`, or `Process` (non-zero exit).
    async fn execute(&self, request: CommandRequest) -> Result<CommandOutput>;
}
