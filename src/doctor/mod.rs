//! Dependency checking and environment validation.
//!
//! This module checks that the tools used to apply keymaps and the keyboard
//! database are in place, and reports what is saved on the target system.

pub mod checker;
pub mod formatter;

// Re-export checker types
pub use checker::{DependencyChecker, DependencyStatus, ToolStatus};
pub use formatter::{DoctorFormatter, OutputFormat};
