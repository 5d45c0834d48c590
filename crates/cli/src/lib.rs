//! aleth-zero CLI Library
//!
//! Console front-end for the control shell: argument parsing, the command
//! language, terminal prompts and the built-in plugins.

pub mod args;
pub mod commands;
pub mod console;
pub mod dispatch;
pub mod status;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use args::{CliArgs, LogLevel};
pub use commands::{parse, ConsoleCommand};
pub use console::{ConsoleView, TerminalInput, TerminalPrompt};
pub use dispatch::{prepare, Input, Job, Prepared};
pub use status::StatusPlugin;
