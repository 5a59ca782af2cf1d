//! CLI command handlers for kbdsetup.
//!
//! Every subcommand opens a keyboard session against the configured target
//! root, performs one operation and optionally saves the result.

pub mod common;
pub mod config;
pub mod doctor;
pub mod expert;
pub mod layout;
pub mod settings;
pub mod update;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use doctor::DoctorArgs;
pub use expert::ExpertArgs;
pub use layout::{ListArgs, ProbeArgs, ProposeArgs, SetArgs, ShowArgs};
pub use settings::{ExportArgs, ImportArgs};
pub use update::UpdateCheckArgs;
