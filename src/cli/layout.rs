//! Layout commands: show, list, set, propose and probe.

use crate::applier::AppliedCommands;
use crate::cli::common::{open_session, print_json, save_session, CliError, CliResult};
use crate::config::Config;
use crate::models::X11Parameters;
use crate::session::KeyboardSession;
use clap::Args;
use serde::Serialize;

/// Show the current keyboard configuration
#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// List the layouts available for the keyboard model
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Set the keyboard layout
#[derive(Debug, Clone, Args)]
pub struct SetArgs {
    /// Layout identifier (e.g., "german")
    #[arg(value_name = "LAYOUT")]
    pub layout: String,

    /// Apply without writing the configuration to the target system
    #[arg(long)]
    pub no_save: bool,
}

/// Propose a layout from the language and earlier choices
#[derive(Debug, Clone, Args)]
pub struct ProposeArgs {
    /// Go back to the session default and forget the user's choice
    #[arg(long)]
    pub reset: bool,

    /// The language was just changed
    #[arg(long)]
    pub language_changed: bool,

    /// Do not write the configuration to the target system
    #[arg(long)]
    pub no_save: bool,
}

/// Probe the attached keyboard and derive the layout from it
#[derive(Debug, Clone, Args)]
pub struct ProbeArgs {
    /// Do not write the configuration to the target system
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Serialize, Debug)]
struct ShowOutput<'a> {
    layout: &'a str,
    name: String,
    model: &'a str,
    console_keymap: &'a str,
    compose_table: &'a str,
    x11: &'a X11Parameters,
    console_command: &'a str,
    x11_command: &'a str,
    user_has_chosen: bool,
    modified: bool,
}

#[derive(Serialize, Debug)]
struct LayoutEntry {
    id: String,
    name: String,
}

impl ShowArgs {
    /// Execute the show command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let session = open_session(config)?;
        let state = session.state();

        if self.json {
            return print_json(&ShowOutput {
                layout: &state.current_layout,
                name: session.display_name(),
                model: &state.hardware_model,
                console_keymap: &state.console_keymap,
                compose_table: &state.compose_table,
                x11: &state.x11,
                console_command: &state.console_command,
                x11_command: &state.x11_command,
                user_has_chosen: state.user_has_chosen,
                modified: session.is_modified(),
            });
        }

        println!("{}", session.summary());
        println!();
        println!("  Layout:          {}", state.current_layout);
        println!("  Model:           {}", state.hardware_model);
        println!("  Console keymap:  {}", state.console_keymap);
        println!("  Compose table:   {}", state.compose_table);
        if !state.x11.layout.is_empty() {
            println!("  X11 layout:      {}", state.x11.layout);
        }
        if !state.x11_command.is_empty() {
            println!("  X11 command:     {}", state.x11_command);
        }
        Ok(())
    }
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let session = open_session(config)?;
        let entries: Vec<LayoutEntry> = session
            .selection()
            .into_iter()
            .map(|(id, name)| LayoutEntry { id, name })
            .collect();

        if self.json {
            return print_json(&entries);
        }

        let current = &session.state().current_layout;
        for entry in &entries {
            let marker = if &entry.id == current { "*" } else { " " };
            println!("{} {:<24} {}", marker, entry.id, entry.name);
        }
        Ok(())
    }
}

impl SetArgs {
    /// Execute the set command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let mut session = open_session(config)?;

        let model = session.state().hardware_model.clone();
        if !session.db().reduced(&model).contains(&self.layout) {
            return Err(CliError::validation(format!(
                "Unknown layout '{}' for keyboard model {}",
                self.layout, model
            )));
        }

        let applied = session
            .set_layout(&self.layout)
            .map_err(|e| CliError::io(format!("Failed to set layout: {e:#}")))?;
        if !applied {
            return Err(CliError::validation(format!(
                "Layout '{}' could not be applied",
                self.layout
            )));
        }
        session.mark_user_choice();

        save_session(&mut session, self.no_save)?;
        report(&session);
        Ok(())
    }
}

impl ProposeArgs {
    /// Execute the propose command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let mut session = open_session(config)?;
        let name = session
            .propose(self.reset, self.language_changed)
            .map_err(|e| CliError::io(format!("Failed to propose layout: {e:#}")))?;

        save_session(&mut session, self.no_save)?;
        println!("{name}");
        print_commands(session.last_applied());
        Ok(())
    }
}

impl ProbeArgs {
    /// Execute the probe command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let mut session = open_session(config)?;
        let layout = session
            .probe_and_initialize()
            .map_err(|e| CliError::io(format!("Failed to probe keyboard: {e:#}")))?;

        let state = session.state();
        if !state.unique_hardware_key.is_empty() {
            println!("Keyboard: {}", state.unique_hardware_key);
        }
        println!("Model:    {}", state.hardware_model);
        println!("Layout:   {} ({})", layout, session.layout_name(&layout));

        save_session(&mut session, self.no_save)?;
        Ok(())
    }
}

fn report(session: &KeyboardSession) {
    println!("{}", session.summary());
    print_commands(session.last_applied());
}

fn print_commands(applied: &AppliedCommands) {
    for command in &applied.executed {
        println!("  ran:     {command}");
    }
    for command in &applied.skipped {
        println!("  skipped: {command}");
    }
}
