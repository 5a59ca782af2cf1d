//! Console and X11 keymap application.
//!
//! The configuration state only computes command strings; this module
//! decides whether they run for the session at hand and hands them to the
//! [`CommandRunner`].

use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

use crate::models::SessionContext;
use crate::services::CommandRunner;
use crate::state::ConfigurationState;

/// Command that re-enables X11 autorepeat after `setxkbmap`.
pub const AUTOREPEAT_COMMAND: &str = "xset r on";

/// Where the apply commands come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplates {
    loadkeys: PathBuf,
    x11_bin_dir: PathBuf,
}

impl CommandTemplates {
    /// Creates templates for the given `loadkeys` binary and X11 binary directory.
    #[must_use]
    pub const fn new(loadkeys: PathBuf, x11_bin_dir: PathBuf) -> Self {
        Self {
            loadkeys,
            x11_bin_dir,
        }
    }

    /// `loadkeys <keymap>`
    #[must_use]
    pub fn console_command(&self, console_keymap: &str) -> String {
        format!("{} {}", self.loadkeys.display(), console_keymap)
    }

    /// `<x11 bin dir>/setxkbmap <apply>`
    #[must_use]
    pub fn x11_command(&self, apply: &str) -> String {
        format!("{} {}", self.x11_bin_dir.join("setxkbmap").display(), apply)
    }
}

/// Commands issued (or, in dry-run, merely computed) by one application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedCommands {
    /// Commands that were run, in order
    pub executed: Vec<String>,
    /// Commands that were computed but skipped
    pub skipped: Vec<String>,
}

/// Runs the apply commands of a state under the rules of a session.
pub struct Applier<'a> {
    ctx: &'a SessionContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> Applier<'a> {
    /// Creates an applier for one session.
    #[must_use]
    pub fn new(ctx: &'a SessionContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    fn run(&self, command: &str, applied: &mut AppliedCommands) {
        if let Err(e) = self.runner.execute(command) {
            error!("{:#}", e);
        }
        applied.executed.push(command.to_string());
    }

    /// Loads the console keymap of `state`.
    pub fn set_console(&self, state: &ConfigurationState, applied: &mut AppliedCommands) {
        if self.ctx.dry_run {
            info!("Test mode - NOT setting keyboard");
            applied.skipped.push(state.console_command.clone());
        } else if !self.ctx.loadkeys_supported {
            info!("Not calling loadkeys on this architecture");
            applied.skipped.push(state.console_command.clone());
        } else {
            info!("Setting console keyboard to: <{}>", state.current_layout);
            info!("loadkeys command: <{}>", state.console_command);
            self.run(&state.console_command, applied);
        }
    }

    /// Sets the X11 keymap of `state`, when there is a display to set it on.
    pub fn set_x11(&self, state: &ConfigurationState, applied: &mut AppliedCommands) {
        if self.ctx.dry_run {
            info!("Test mode - would have called:\n {}", state.x11_command);
            if !state.x11_command.is_empty() {
                applied.skipped.push(state.x11_command.clone());
            }
        } else if self.ctx.remote.text_mode {
            info!("Not setting X keyboard due to text mode");
        } else if self.ctx.display_is_forwarded() {
            info!("Not setting X keyboard: running over ssh");
        } else if !state.x11_command.is_empty() {
            info!("Setting X11 keyboard to: <{}>", state.current_layout);
            info!("Setting X11 keyboard:\n {}", state.x11_command);
            self.run(&state.x11_command, applied);

            if self.ctx.is_installer_environment() && !self.ctx.xen {
                info!("Calling xset to fix autorepeat problem: {}", AUTOREPEAT_COMMAND);
                self.run(AUTOREPEAT_COMMAND, applied);
            }
        }
    }

    /// Applies console then X11 keymap.
    #[must_use]
    pub fn apply(&self, state: &ConfigurationState) -> AppliedCommands {
        let mut applied = AppliedCommands::default();
        self.set_console(state, &mut applied);
        self.set_x11(state, &mut applied);
        applied
    }
}
