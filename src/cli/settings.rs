//! Profile export and import.

use crate::cli::common::{open_session, save_session, CliError, CliResult};
use crate::config::Config;
use crate::models::KeyboardProfile;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Export the keyboard settings as a JSON profile
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Write the profile to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Import keyboard settings from a JSON profile
#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// Profile file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Do not write the configuration to the target system
    #[arg(long)]
    pub no_save: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let session = open_session(config)?;
        let profile = session.export_settings();

        let json = serde_json::to_string_pretty(&profile)
            .map_err(|e| CliError::io(format!("Failed to serialize profile: {e}")))?;

        match &self.output {
            Some(path) => {
                fs::write(path, format!("{json}\n")).map_err(|e| {
                    CliError::io(format!("Failed to write {}: {e}", path.display()))
                })?;
                println!("Exported keyboard settings to {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}

impl ImportArgs {
    /// Execute the import command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let content = fs::read_to_string(&self.file)
            .map_err(|e| CliError::io(format!("Failed to read {}: {e}", self.file.display())))?;
        let profile: KeyboardProfile = serde_json::from_str(&content).map_err(|e| {
            CliError::validation(format!("Invalid profile {}: {e}", self.file.display()))
        })?;

        let mut session = open_session(config)?;
        if !profile.keymap.is_empty() {
            let model = session.state().hardware_model.clone();
            if !session.db().reduced(&model).contains(&profile.keymap) {
                return Err(CliError::validation(format!(
                    "Unknown layout '{}' for keyboard model {}",
                    profile.keymap, model
                )));
            }
        }

        session
            .import_settings(&profile)
            .map_err(|e| CliError::io(format!("Failed to import settings: {e:#}")))?;
        save_session(&mut session, self.no_save)?;

        println!("{}", session.summary());
        Ok(())
    }
}
