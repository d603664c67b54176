pub mod bundle;
pub mod config;
pub mod deploy;
pub mod device;
pub mod engine;
pub mod exec;
pub mod logging;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::XcpilotConfig;
pub use engine::XcpilotEngine;
pub use xcpilot_api::{PilotError, Result};
