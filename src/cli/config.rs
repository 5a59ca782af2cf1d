//! Configuration management CLI commands.

use crate::cli::common::{print_json, CliError, CliResult};
use crate::config::Config;
use crate::models::{Mode, Stage};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Root of the system being configured
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Directory with external keyboard database tables
    #[arg(long, value_name = "DIR")]
    database_dir: Option<PathBuf>,

    /// Path of the xkbctrl translator
    #[arg(long, value_name = "FILE")]
    xkbctrl: Option<PathBuf>,

    /// Path of loadkeys
    #[arg(long, value_name = "FILE")]
    loadkeys: Option<PathBuf>,

    /// Directory holding setxkbmap
    #[arg(long, value_name = "DIR")]
    x11_bin_dir: Option<PathBuf>,

    /// Run mode (normal, installation, update, autoinstall, autoupgrade, config)
    #[arg(long, value_name = "MODE")]
    mode: Option<Mode>,

    /// Workflow stage (initial, continue, normal)
    #[arg(long, value_name = "STAGE")]
    stage: Option<Stage>,

    /// System language (e.g., de_DE)
    #[arg(long, value_name = "LANG")]
    language: Option<String>,

    /// Compute commands without executing them
    #[arg(long, value_name = "BOOL")]
    dry_run: Option<bool>,

    /// Installing from a live medium
    #[arg(long, value_name = "BOOL")]
    live_installation: Option<bool>,
}

/// JSON-serializable configuration for output
#[derive(Serialize, Debug)]
struct ConfigOutput {
    paths: PathsOutput,
    session: SessionOutput,
}

#[derive(Serialize, Debug)]
struct PathsOutput {
    root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_dir: Option<String>,
    xkbctrl: String,
    loadkeys: String,
    x11_bin_dir: String,
}

#[derive(Serialize, Debug)]
struct SessionOutput {
    mode: String,
    stage: String,
    language: String,
    dry_run: bool,
    live_installation: bool,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Set(args) => args.execute(),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = Config::load()
            .map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))?;

        if self.json {
            output_json(&config)
        } else {
            output_human_readable(&config);
            Ok(())
        }
    }
}

impl ConfigSetArgs {
    fn is_empty(&self) -> bool {
        self.root.is_none()
            && self.database_dir.is_none()
            && self.xkbctrl.is_none()
            && self.loadkeys.is_none()
            && self.x11_bin_dir.is_none()
            && self.mode.is_none()
            && self.stage.is_none()
            && self.language.is_none()
            && self.dry_run.is_none()
            && self.live_installation.is_none()
    }

    /// Execute set command
    pub fn execute(&self) -> CliResult<()> {
        if self.is_empty() {
            return Err(CliError::validation(
                "At least one configuration option must be specified (see --help)",
            ));
        }

        let mut config = Config::load().unwrap_or_default();

        if let Some(root) = &self.root {
            config.paths.root.clone_from(root);
        }
        if let Some(dir) = &self.database_dir {
            config.paths.database_dir = Some(dir.clone());
        }
        if let Some(path) = &self.xkbctrl {
            config.paths.xkbctrl.clone_from(path);
        }
        if let Some(path) = &self.loadkeys {
            config.paths.loadkeys.clone_from(path);
        }
        if let Some(dir) = &self.x11_bin_dir {
            config.paths.x11_bin_dir.clone_from(dir);
        }
        if let Some(mode) = self.mode {
            config.session.mode = mode;
        }
        if let Some(stage) = self.stage {
            config.session.stage = stage;
        }
        if let Some(language) = &self.language {
            config.session.language = Some(language.clone());
        }
        if let Some(dry_run) = self.dry_run {
            config.session.dry_run = dry_run;
        }
        if let Some(live) = self.live_installation {
            config.session.live_installation = live;
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        config
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated successfully.");
        Ok(())
    }
}

/// Output configuration in JSON format
fn output_json(config: &Config) -> CliResult<()> {
    let output = ConfigOutput {
        paths: PathsOutput {
            root: config.paths.root.to_string_lossy().to_string(),
            database_dir: config
                .paths
                .database_dir
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            xkbctrl: config.paths.xkbctrl.to_string_lossy().to_string(),
            loadkeys: config.paths.loadkeys.to_string_lossy().to_string(),
            x11_bin_dir: config.paths.x11_bin_dir.to_string_lossy().to_string(),
        },
        session: SessionOutput {
            mode: config.session.mode.to_string(),
            stage: config.session.stage.to_string(),
            language: config.system_language(),
            dry_run: config.session.dry_run,
            live_installation: config.session.live_installation,
        },
    };
    print_json(&output)
}

/// Output configuration in human-readable format
fn output_human_readable(config: &Config) {
    println!("Keyboard Setup Configuration");
    println!("============================");
    println!();

    println!("Paths:");
    println!("  Root: {}", config.paths.root.display());
    match &config.paths.database_dir {
        Some(dir) => println!("  Database: {}", dir.display()),
        None => println!("  Database: (embedded)"),
    }
    println!("  xkbctrl: {}", config.paths.xkbctrl.display());
    println!("  loadkeys: {}", config.paths.loadkeys.display());
    println!("  X11 binaries: {}", config.paths.x11_bin_dir.display());
    println!();

    println!("Session:");
    println!("  Mode: {}", config.session.mode);
    println!("  Stage: {}", config.session.stage);
    println!("  Language: {}", config.system_language());
    println!("  Dry run: {}", config.session.dry_run);
    println!();
}
