//! Doctor command for environment checking.

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::doctor::{DependencyChecker, DoctorFormatter, OutputFormat, ToolStatus};
use clap::Args;

/// Check the tools and data keyboard setup depends on
#[derive(Debug, Clone, Args)]
pub struct DoctorArgs {
    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl DoctorArgs {
    /// Execute the doctor command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let statuses = DependencyChecker::new().check_all(config);

        let format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Terminal
        };
        println!("{}", DoctorFormatter::with_format(format).format_results(&statuses));

        if statuses.iter().any(|s| s.status == ToolStatus::Missing) {
            Err(CliError::validation("Some dependencies are missing"))
        } else {
            Ok(())
        }
    }
}
