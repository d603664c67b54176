use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const UNKNOWN_VERSION: &str = "unknown";

/// One Xcode installation on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub path: PathBuf,
    pub version: String,
    pub build: Option<String>,
}

impl Installation {
    pub fn new(path: impl Into<PathBuf>, version: impl Into<String>, build: Option<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            build,
        }
    }

    /// An installation whose metadata could not be read.
    pub fn unknown(path: impl Into<PathBuf>) -> Self {
        Self::new(path, UNKNOWN_VERSION, None)
    }

    /// `<app>/Contents/Developer`, the value for `DEVELOPER_DIR`.
    pub fn developer_dir(&self) -> PathBuf {
        self.path.join("Contents").join("Developer")
    }
}

impl fmt::Display for Installation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (version {}", self.path.display(), self.version)?;
        if let Some(build) = &self.build {
            write!(f, ", build {build}")?;
        }
        write!(f, ")")
    }
}
