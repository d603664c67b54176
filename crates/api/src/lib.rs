pub mod error;
pub mod exec;
pub mod models;

// Re-export commonly used types
pub use error::{IdentifierKind, PilotError, Result};
pub use exec::{CommandOutput, CommandRequest, CommandRunner};
pub use models::*;
