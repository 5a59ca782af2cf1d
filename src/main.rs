//! kbdsetup - keyboard layout setup for installed and installing systems
//!
//! Resolves the keyboard layout from saved state, hardware and language,
//! applies it to the console and X11, and persists it to the target root.
//!
//! # Usage
//!
//! ```bash
//! # Show the current layout
//! kbdsetup show
//!
//! # Set a layout on a system mounted at /mnt without running loadkeys
//! kbdsetup --root /mnt --dry-run set german
//!
//! # Follow a language change during installation
//! kbdsetup --mode installation --stage initial --language de_DE propose --language-changed
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kbdsetup::cli::{
    CliError, CliResult, ConfigArgs, DoctorArgs, ExpertArgs, ExportArgs, ImportArgs, ListArgs,
    ProbeArgs, ProposeArgs, SetArgs, ShowArgs, UpdateCheckArgs,
};
use kbdsetup::config::Config;
use kbdsetup::models::{Mode, Stage};

/// kbdsetup - resolve, apply and persist the system keyboard layout
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the system being configured
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Run mode (normal, installation, update, autoinstall, autoupgrade, config)
    #[arg(long, value_name = "MODE")]
    mode: Option<Mode>,

    /// Workflow stage (initial, continue, normal)
    #[arg(long, value_name = "STAGE")]
    stage: Option<Stage>,

    /// System language (e.g., de_DE)
    #[arg(long, value_name = "LANG")]
    language: Option<String>,

    /// Compute and log commands without executing them
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current keyboard configuration
    Show(ShowArgs),
    /// List the layouts available for the keyboard model
    List(ListArgs),
    /// Set the keyboard layout
    Set(SetArgs),
    /// Propose a layout from the language and earlier choices
    Propose(ProposeArgs),
    /// Probe the attached keyboard and derive the layout from it
    Probe(ProbeArgs),
    /// Keyboard expert settings
    Expert(ExpertArgs),
    /// Export the keyboard settings as a JSON profile
    Export(ExportArgs),
    /// Import keyboard settings from a JSON profile
    Import(ImportArgs),
    /// Compare the layout with the one saved on a system being updated
    UpdateCheck(UpdateCheckArgs),
    /// Configuration management
    Config(ConfigArgs),
    /// Check the tools and data keyboard setup depends on
    Doctor(DoctorArgs),
}

impl Cli {
    /// Loads the configuration file and applies the command line overrides.
    fn config(&self) -> CliResult<Config> {
        let mut config = Config::load()
            .map_err(|e| CliError::io(format!("Failed to load configuration: {e:#}")))?;

        if let Some(root) = &self.root {
            config.paths.root.clone_from(root);
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
        if self.dry_run {
            config.session.dry_run = true;
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    fn run(&self) -> CliResult<()> {
        // Config commands edit the file itself, not the overridden view
        if let Command::Config(args) = &self.command {
            return args.execute();
        }

        let config = self.config()?;
        match &self.command {
            Command::Show(args) => args.execute(&config),
            Command::List(args) => args.execute(&config),
            Command::Set(args) => args.execute(&config),
            Command::Propose(args) => args.execute(&config),
            Command::Probe(args) => args.execute(&config),
            Command::Expert(args) => args.execute(&config),
            Command::Export(args) => args.execute(&config),
            Command::Import(args) => args.execute(&config),
            Command::UpdateCheck(args) => args.execute(&config),
            Command::Doctor(args) => args.execute(&config),
            Command::Config(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = cli.run() {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}
