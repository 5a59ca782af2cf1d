//! Checks for the external tools and data the keyboard setup relies on.
//!
//! # Example
//!
//! ```rust
//! use kbdsetup::config::Config;
//! use kbdsetup::doctor::{DependencyChecker, ToolStatus};
//!
//! let config = Config::default();
//! let statuses = DependencyChecker::new().check_all(&config);
//!
//! for status in &statuses {
//!     match status.status {
//!         ToolStatus::Available => println!("✓ {}: {}", status.name, status.message),
//!         ToolStatus::Missing => println!("✗ {}: {}", status.name, status.message),
//!         ToolStatus::Unknown => println!("? {}: {}", status.name, status.message),
//!     }
//! }
//! ```
//!
//! Every check is non-panicking: a missing binary is reported as
//! [`ToolStatus::Missing`], a check that could not complete as
//! [`ToolStatus::Unknown`].

use std::path::Path;

use crate::config::Config;
use crate::keyboard_db::KeyboardDb;
use crate::persistence;
use crate::services::{Section, SysconfigFiles, SysconfigStore};

/// Status of a single dependency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Dependency is present and working
    Available,
    /// Dependency is not found or not working
    Missing,
    /// Could not determine status
    Unknown,
}

/// Result of checking a single dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    /// Name of the dependency (e.g., "loadkeys")
    pub name: String,
    /// Status of the dependency
    pub status: ToolStatus,
    /// Human-readable message about the status
    pub message: String,
}

impl DependencyStatus {
    /// Creates a new dependency status.
    #[must_use]
    pub fn new(name: impl Into<String>, status: ToolStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a status for an available dependency.
    #[must_use]
    pub fn available(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ToolStatus::Available, message)
    }

    /// Creates a status for a missing dependency.
    #[must_use]
    pub fn missing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ToolStatus::Missing, message)
    }

    /// Creates a status for an unknown dependency state.
    #[must_use]
    pub fn unknown(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ToolStatus::Unknown, message)
    }
}

/// Checker for the keyboard setup environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyChecker;

impl DependencyChecker {
    /// Creates a new dependency checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Checks all dependencies for the given configuration.
    #[must_use]
    pub fn check_all(&self, config: &Config) -> Vec<DependencyStatus> {
        let mut statuses = vec![
            self.check_binary(
                "loadkeys",
                &config.paths.loadkeys,
                config.hardware.loadkeys_supported,
            ),
            self.check_binary(
                "setxkbmap",
                &config.paths.x11_bin_dir.join("setxkbmap"),
                config.hardware.x11_setup_needed,
            ),
            self.check_binary("xkbctrl", &config.paths.xkbctrl, true),
            self.check_database(config.paths.database_dir.as_deref()),
        ];
        statuses.push(self.check_saved_layout(&config.paths.root));
        statuses
    }

    /// Checks that a binary exists; `required` false turns absence into a note.
    #[must_use]
    pub fn check_binary(&self, name: &str, path: &Path, required: bool) -> DependencyStatus {
        if path.is_file() {
            DependencyStatus::available(name, format!("Found at {}", path.display()))
        } else if required {
            DependencyStatus::missing(name, format!("Not found at {}", path.display()))
        } else {
            DependencyStatus::available(name, "Not used on this architecture")
        }
    }

    /// Checks that the keyboard database loads and has layouts.
    #[must_use]
    pub fn check_database(&self, database_dir: Option<&Path>) -> DependencyStatus {
        let loaded = match database_dir {
            Some(dir) => KeyboardDb::load_from_dir(dir),
            None => KeyboardDb::load(),
        };

        match loaded {
            Ok(db) if db.layout_count() > 0 => DependencyStatus::available(
                "Keyboard database",
                format!("{} layouts", db.layout_count()),
            ),
            Ok(_) => DependencyStatus::missing("Keyboard database", "Database has no layouts"),
            Err(e) => DependencyStatus::missing("Keyboard database", format!("{e:#}")),
        }
    }

    /// Reports the layout saved on the target system.
    #[must_use]
    pub fn check_saved_layout(&self, root: &Path) -> DependencyStatus {
        if !root.is_dir() {
            return DependencyStatus::missing(
                "Saved layout",
                format!("Target root does not exist: {}", root.display()),
            );
        }

        let store = SysconfigFiles::new(root);
        if !store.exists(Section::Keyboard) {
            return DependencyStatus::unknown(
                "Saved layout",
                format!("No {} on the target system yet", Section::Keyboard),
            );
        }

        match persistence::read_layout_id(&store) {
            Ok((layout, _)) if !layout.is_empty() => {
                DependencyStatus::available("Saved layout", layout)
            }
            Ok(_) => DependencyStatus::unknown("Saved layout", "No layout identifier saved"),
            Err(e) => DependencyStatus::unknown("Saved layout", format!("Error checking: {e:#}")),
        }
    }
}
