//! Application-wide constants.
//!
//! This module defines the application name and the fixed defaults the
//! keyboard logic falls back to when data is missing.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "Keyboard Setup";

/// The binary name of the application (used in command examples, lowercase with hyphens).
pub const APP_BINARY_NAME: &str = "kbdsetup";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "KBDSETUP_CONFIG_DIR";

/// Layout used when nothing better can be derived.
pub const DEFAULT_LAYOUT: &str = "english-us";

/// Hardware model assumed when the probe reports none.
pub const DEFAULT_HARDWARE_MODEL: &str = "pc104";

/// Language assumed when none is configured.
pub const DEFAULT_LANGUAGE: &str = "en_US";

/// Console keymap used when a database record omits one.
pub const DEFAULT_CONSOLE_KEYMAP: &str = "us.map.gz";

/// Compose suffix used when a database record omits one.
pub const DEFAULT_COMPOSE_SUFFIX: &str = "latin1.add";

/// Install-environment keytable names that the database keymaps do not cover.
///
/// These win over the mapping derived from the database.
pub const INSTALL_KEYTABLE_OVERRIDES: [(&str, &str); 2] =
    [("dk", "danish"), ("de-lat1-nd", "german")];

/// Comment written above the persisted layout identifier.
pub const LAYOUT_ID_COMMENT: &str =
    "\n# The internal identifier of the attached keyboard.\n#\n";

/// Sysconfig key holding `layout,model`.
pub const LAYOUT_ID_KEY: &str = "YAST_KEYBOARD";
