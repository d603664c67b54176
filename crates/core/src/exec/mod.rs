//! Process execution.

pub mod security;
pub mod shell;

pub use security::check_command;
pub use shell::ShellExecutor;
