//! Xcode toolchain discovery and command construction.

pub mod command;
pub mod installations;
pub mod tool_path;

pub use command::{DeviceCtl, LaunchSpec, XcodeBuild, quote};
pub use installations::InstallationLocator;
pub use tool_path::{DEVICECTL_SUBPATH, ToolPathResolver};
