//! Physical device discovery and identity reconciliation.

pub mod identity;
pub mod parse;
pub mod registry;

pub use identity::{IdentityPolicy, NameContainment};
pub use registry::{DeviceRegistry, DiscoveryOutcome, lookup};
