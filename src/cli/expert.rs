//! Expert settings commands.

use crate::cli::common::{open_session, print_json, save_session, CliError, CliResult};
use crate::config::Config;
use crate::models::ExpertSettingsPatch;
use clap::{Args, Subcommand};

/// Keyboard expert settings (repeat rate, delay, numlock, caps lock)
#[derive(Args, Debug)]
pub struct ExpertArgs {
    #[command(subcommand)]
    command: ExpertCommand,
}

#[derive(Subcommand, Debug)]
enum ExpertCommand {
    /// Display the expert settings
    Show(ExpertShowArgs),
    /// Change expert settings
    Set(ExpertSetArgs),
}

/// Display the expert settings
#[derive(Args, Debug)]
pub struct ExpertShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Change expert settings
#[derive(Args, Debug)]
pub struct ExpertSetArgs {
    /// Keyboard repeat rate
    #[arg(long, value_name = "RATE")]
    rate: Option<String>,

    /// Keyboard repeat delay in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<String>,

    /// Numlock at boot (yes, no, bios or empty)
    #[arg(long, value_name = "STATE")]
    numlock: Option<String>,

    /// Disable Caps Lock
    #[arg(long, value_name = "BOOL")]
    discaps: Option<bool>,

    /// Do not write the configuration to the target system
    #[arg(long)]
    no_save: bool,
}

impl ExpertArgs {
    /// Execute expert subcommand
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        match &self.command {
            ExpertCommand::Show(args) => args.execute(config),
            ExpertCommand::Set(args) => args.execute(config),
        }
    }
}

impl ExpertShowArgs {
    /// Execute show command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let session = open_session(config)?;
        let expert = session.expert_settings();

        if self.json {
            return print_json(expert);
        }

        let or_unset = |value: &str| {
            if value.is_empty() {
                "(not set)".to_string()
            } else {
                value.to_string()
            }
        };
        println!("Repeat rate:       {}", or_unset(&expert.rate));
        println!("Repeat delay:      {}", or_unset(&expert.delay));
        println!("Numlock:           {}", or_unset(&expert.numlock));
        println!("Disable Caps Lock: {}", or_unset(&expert.disable_caps_lock));
        Ok(())
    }
}

impl ExpertSetArgs {
    /// Execute set command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let patch = ExpertSettingsPatch {
            rate: self.rate.clone(),
            delay: self.delay.clone(),
            numlock: self.numlock.clone(),
            discaps: self.discaps,
        };
        if patch.is_empty() {
            return Err(CliError::validation(
                "At least one setting must be specified: --rate, --delay, --numlock, or --discaps",
            ));
        }
        if let Some(numlock) = self.numlock.as_deref() {
            if !matches!(numlock, "" | "yes" | "no" | "bios") {
                return Err(CliError::validation(
                    "Invalid numlock state. Must be 'yes', 'no', 'bios' or empty",
                ));
            }
        }

        let mut session = open_session(config)?;
        session.set_expert_settings(&patch);

        if session.is_modified() {
            save_session(&mut session, self.no_save)?;
            println!("Expert settings updated.");
        } else {
            println!("Expert settings unchanged.");
        }
        Ok(())
    }
}
