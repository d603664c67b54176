//! Build, install, launch and log streaming on a physical device.

pub mod log_stream;
pub mod orchestrator;

pub use log_stream::LogStreamer;
pub use orchestrator::{DeployReport, Deployer, is_not_installed};
