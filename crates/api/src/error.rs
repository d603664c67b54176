use std::fmt;
use std::path::PathBuf;

/// Which of the two device identifier spaces an operation needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// UUID reported by `xctrace`, used by `xcodebuild` destinations.
    Primary,
    /// Identifier reported by `devicectl`, used for install/launch/console.
    Secondary,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Primary => f.write_str("UDID (xctrace)"),
            IdentifierKind::Secondary => f.write_str("CoreDevice identifier (devicectl)"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PilotError {
    #[error("Command rejected by security policy: {command}")]
    SecurityViolation { command: String },

    #[error("Command timed out after {timeout_ms}ms: {command}")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("Command failed with exit code {}: {command}\n{}", code.map_or("?".to_string(), |c| c.to_string()), render_output(stdout, stderr))]
    Process {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device '{device}' has no {kind}")]
    MissingIdentifier { device: String, kind: IdentifierKind },

    #[error(
        "Device '{device}' is only partially identified: missing {missing}. \
         Make sure it is connected, unlocked and paired so both xctrace and devicectl report it."
    )]
    IncompleteDeviceIdentity {
        device: String,
        missing: IdentifierKind,
    },

    #[error("PRODUCT_BUNDLE_IDENTIFIER not found in build settings of {} (scheme {scheme})", project.display())]
    BundleIdentifierNotFound { project: PathBuf, scheme: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PilotError {
    /// Combined stdout and stderr of a failed process, empty for other kinds.
    pub fn process_output(&self) -> String {
        match self {
            PilotError::Process { stdout, stderr, .. } => format!("{stdout}\n{stderr}"),
            _ => String::new(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PilotError::Timeout { .. })
    }
}

fn render_output(stdout: &str, stderr: &str) -> String {
    let mut out = String::new();
    if !stdout.trim().is_empty() {
        out.push_str("stdout:\n");
        out.push_str(stdout.trim_end());
        out.push('\n');
    }
    if !stderr.trim().is_empty() {
        out.push_str("stderr:\n");
        out.push_str(stderr.trim_end());
    }
    out
}

pub type Result<T> = std::result::Result<T, PilotError>;
