//! Update helper: offer the layout of the system being updated.

use crate::cli::common::{open_session, save_session, CliError, CliResult};
use crate::config::Config;
use clap::Args;
use std::path::PathBuf;

/// Compare the layout with the one saved on a system being updated
#[derive(Debug, Clone, Args)]
pub struct UpdateCheckArgs {
    /// Root of the system being updated
    #[arg(value_name = "DESTDIR")]
    pub destdir: PathBuf,

    /// Switch to the layout of the system being updated
    #[arg(long)]
    pub adopt: bool,
}

impl UpdateCheckArgs {
    /// Execute the update-check command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        if !self.destdir.is_dir() {
            return Err(CliError::validation(format!(
                "Directory does not exist: {}",
                self.destdir.display()
            )));
        }

        let mut session = open_session(config)?;
        let candidate = session
            .update_candidate(&self.destdir)
            .map_err(|e| CliError::io(format!("Failed to read target configuration: {e:#}")))?;

        let Some(layout) = candidate else {
            println!("Keyboard layout matches the system being updated.");
            return Ok(());
        };

        println!(
            "System being updated uses {} ({}), current layout is {}.",
            layout,
            session.layout_name(&layout),
            session.state().current_layout
        );

        if self.adopt {
            session
                .adopt_update_layout(&layout)
                .map_err(|e| CliError::io(format!("Failed to set layout: {e:#}")))?;
            save_session(&mut session, false)?;
            println!("{}", session.summary());
        }
        Ok(())
    }
}
