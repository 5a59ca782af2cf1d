//! Shell command execution.

use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::info;

use super::CommandRunner;

/// Runs commands through `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn execute(&self, command: &str) -> Result<()> {
        info!("Executing: {}", command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .with_context(|| format!("Failed to spawn shell for: {command}"))?;

        if !output.status.success() {
            bail!(
                "Command '{}' failed ({}): {}",
                command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }
}
