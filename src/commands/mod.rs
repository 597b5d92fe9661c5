//! Command implementations for thumbjob.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod generate;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
///
/// Returns the process exit code for the command. Setup failures (bad
/// config, unreadable properties) surface as errors instead and map to
/// their own exit codes in `main`.
pub fn dispatch(command: Command) -> Result<i32> {
    match command {
        Command::Generate(args) => generate::cmd_generate(args),
    }
}
