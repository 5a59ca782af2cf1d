//! Shared CLI plumbing: error type, exit codes and session setup.

use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::session::KeyboardSession;

/// Process exit status.
pub type ExitCode = i32;

/// Error raised by a CLI command, carrying the exit code it maps to.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid input or a failed check (exit code 1)
    #[error("{0}")]
    Validation(String),
    /// Reading or writing files failed (exit code 2)
    #[error("{0}")]
    Io(String),
}

impl CliError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Validation(_) => 1,
            Self::Io(_) => 2,
        }
    }
}

/// Result type of CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Opens and starts a keyboard session for `config`.
pub fn open_session(config: &Config) -> CliResult<KeyboardSession> {
    KeyboardSession::from_config(config)
        .map_err(|e| CliError::io(format!("Failed to start keyboard session: {e:#}")))
}

/// Saves the session unless the caller asked not to.
pub fn save_session(session: &mut KeyboardSession, no_save: bool) -> CliResult<()> {
    if no_save {
        return Ok(());
    }
    session
        .save()
        .map_err(|e| CliError::io(format!("Failed to save keyboard configuration: {e:#}")))
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON output: {e}")))?;
    println!("{json}");
    Ok(())
}
