//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution, and turns it
//! into the [`SessionContext`] a keyboard session runs under.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::constants::{APP_BINARY_NAME, CONFIG_DIR_ENV, DEFAULT_LANGUAGE};
use crate::models::{Mode, SessionContext, Stage};
use crate::services::InstallInfo;

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Root of the system being configured (e.g., "/mnt" during installation)
    pub root: PathBuf,
    /// Directory with external keyboard database tables; embedded tables otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_dir: Option<PathBuf>,
    /// Console keymap → X11 translator binary
    pub xkbctrl: PathBuf,
    /// Directory holding `setxkbmap`
    pub x11_bin_dir: PathBuf,
    /// Console keymap loader binary
    pub loadkeys: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            database_dir: None,
            xkbctrl: PathBuf::from("/usr/sbin/xkbctrl"),
            x11_bin_dir: PathBuf::from("/usr/bin"),
            loadkeys: PathBuf::from("/bin/loadkeys"),
        }
    }
}

/// Session settings: how and where in a workflow the tool runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Run mode
    #[serde(default)]
    pub mode: Mode,
    /// Workflow stage
    #[serde(default)]
    pub stage: Stage,
    /// Installing from a live medium
    #[serde(default)]
    pub live_installation: bool,
    /// Compute and log commands without executing them
    #[serde(default)]
    pub dry_run: bool,
    /// System language; taken from `$LANG` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Language preselected by the install environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preselected_language: Option<String>,
    /// Product-level default layout; fixes the layout when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_default_layout: Option<String>,
}

/// Hardware capabilities and probe overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// Keyboard model reported instead of the probed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// X11 layout reported by the hardware (only some architectures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x11_layout: Option<String>,
    /// Architecture configures X11 during setup
    #[serde(default = "default_true")]
    pub x11_setup_needed: bool,
    /// Architecture can load console keymaps
    #[serde(default = "default_true")]
    pub loadkeys_supported: bool,
    /// Running as a Xen guest
    #[serde(default)]
    pub xen: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            model: None,
            x11_layout: None,
            x11_setup_needed: true,
            loadkeys_supported: true,
            xen: false,
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/kbdsetup/config.toml`
/// - `$KBDSETUP_CONFIG_DIR/config.toml` when the variable is set
///
/// # Validation
///
/// - `paths.root` must be an existing directory
/// - `paths.database_dir`, when set, must contain `keyboards.json`
/// - language codes must not be empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Hardware settings
    #[serde(default)]
    pub hardware: HardwareConfig,
    /// Extra language → layout entries; these win over the database table
    #[serde(default)]
    pub language_keyboards: BTreeMap<String, String>,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the config file exists on disk.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Gets the config directory path.
    ///
    /// `$KBDSETUP_CONFIG_DIR` wins; otherwise the platform config directory
    /// (`~/.config/kbdsetup/` on Linux).
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_BINARY_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save(&self) -> Result<()> {
        self.validate()?;

        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context(format!(
            "Failed to create config directory: {}",
            config_dir.display()
        ))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let config_path = Self::config_file_path()?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        fs::rename(&temp_path, &config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if !self.paths.root.is_dir() {
            anyhow::bail!(
                "Target root does not exist or is not a directory: {}",
                self.paths.root.display()
            );
        }

        if let Some(dir) = &self.paths.database_dir {
            let keyboards = dir.join(crate::keyboard_db::KEYBOARDS_FILE);
            if !keyboards.exists() {
                anyhow::bail!(
                    "Keyboard database directory is invalid: {} not found",
                    keyboards.display()
                );
            }
        }

        if self.session.language.as_deref() == Some("") {
            anyhow::bail!("Language must not be empty");
        }

        if let Some((language, _)) = self.language_keyboards.iter().find(|(k, v)| k.is_empty() || v.is_empty()) {
            anyhow::bail!("Invalid language_keyboards entry for '{}'", language);
        }

        Ok(())
    }

    /// System language: configured value, else `$LANG`, else `en_US`.
    #[must_use]
    pub fn system_language(&self) -> String {
        self.session
            .language
            .clone()
            .or_else(|| env::var("LANG").ok().and_then(|lang| language_from_locale(&lang)))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    /// Builds the session context for this configuration.
    ///
    /// Remote access flags come from the install environment of the target
    /// root and the display from `$DISPLAY`.
    #[must_use]
    pub fn to_context(&self) -> SessionContext {
        SessionContext {
            mode: self.session.mode,
            stage: self.session.stage,
            live_installation: self.session.live_installation,
            dry_run: self.session.dry_run,
            language: self.system_language(),
            preselected_language: self
                .session
                .preselected_language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            product_default_layout: self
                .session
                .product_default_layout
                .clone()
                .unwrap_or_default(),
            x11_setup_needed: self.hardware.x11_setup_needed,
            loadkeys_supported: self.hardware.loadkeys_supported,
            xen: self.hardware.xen,
            remote: InstallInfo::new(&self.paths.root).remote_access(),
            display: env::var("DISPLAY").ok(),
        }
    }
}

/// Language code of a locale string (`de_DE.UTF-8@euro` → `de_DE`).
///
/// `C` and `POSIX` carry no language.
#[must_use]
pub fn language_from_locale(locale: &str) -> Option<String> {
    let language = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();

    if language.is_empty() || language == "C" || language == "POSIX" {
        None
    } else {
        Some(language.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.paths.root, PathBuf::from("/"));
        assert_eq!(config.paths.xkbctrl, PathBuf::from("/usr/sbin/xkbctrl"));
        assert_eq!(config.session.mode, Mode::Normal);
        assert!(config.hardware.x11_setup_needed);
        assert!(config.language_keyboards.is_empty());
    }

    #[test]
    fn test_config_validate_root() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::new();
        config.paths.root = temp_dir.path().to_path_buf();
        assert!(config.validate().is_ok());

        config.paths.root = temp_dir.path().join("missing");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_database_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::new();
        config.paths.root = temp_dir.path().to_path_buf();
        config.paths.database_dir = Some(temp_dir.path().to_path_buf());
        assert!(config.validate().is_err());

        fs::write(temp_dir.path().join("keyboards.json"), "{}").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_language_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::new();
        config.paths.root = temp_dir.path().to_path_buf();
        config
            .language_keyboards
            .insert("de_AT".to_string(), String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let mut config = Config::new();
        config.session.mode = Mode::Installation;
        config.session.stage = Stage::Initial;
        config.hardware.model = Some("type5".to_string());
        config
            .language_keyboards
            .insert("de_AT".to_string(), "german".to_string());

        let content = toml::to_string_pretty(&config).unwrap();
        fs::write(&config_file, content).unwrap();

        let content = fs::read_to_string(&config_file).unwrap();
        let loaded: Config = toml::from_str(&content).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: Config = toml::from_str(
            r#"
[session]
mode = "update"

[hardware]
loadkeys_supported = false
"#,
        )
        .unwrap();

        assert_eq!(loaded.session.mode, Mode::Update);
        assert_eq!(loaded.session.stage, Stage::Normal);
        assert!(!loaded.hardware.loadkeys_supported);
        assert!(loaded.hardware.x11_setup_needed);
        assert_eq!(loaded.paths.loadkeys, PathBuf::from("/bin/loadkeys"));
    }

    #[test]
    fn test_language_from_locale() {
        assert_eq!(language_from_locale("de_DE.UTF-8").as_deref(), Some("de_DE"));
        assert_eq!(language_from_locale("de_DE@euro").as_deref(), Some("de_DE"));
        assert_eq!(language_from_locale("fr").as_deref(), Some("fr"));
        assert_eq!(language_from_locale("C.UTF-8"), None);
        assert_eq!(language_from_locale("POSIX"), None);
        assert_eq!(language_from_locale(""), None);
    }

    #[test]
    fn test_to_context_uses_configured_language_and_install_flags() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("etc")).unwrap();
        fs::write(temp_dir.path().join("etc/install.inf"), "UseSSH: 1\n").unwrap();

        let mut config = Config::new();
        config.paths.root = temp_dir.path().to_path_buf();
        config.session.language = Some("cs_CZ".to_string());
        config.session.product_default_layout = Some("czech".to_string());

        let ctx = config.to_context();
        assert_eq!(ctx.language, "cs_CZ");
        assert_eq!(ctx.preselected_language, "en_US");
        assert_eq!(ctx.product_default_layout, "czech");
        assert!(ctx.remote.ssh);
        assert!(!ctx.graphical_setup_allowed());
    }
}
