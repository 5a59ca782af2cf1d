//! Session context: the mode flags that steer layout precedence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_LANGUAGE;

/// What kind of run this session is part of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Running on an installed system
    #[default]
    Normal,
    /// Interactive installation
    Installation,
    /// Interactive system update
    Update,
    /// Unattended installation from a profile
    Autoinstall,
    /// Unattended system update from a profile
    Autoupgrade,
    /// Profile editing: nothing is probed, applied or executed
    Config,
}

/// Where in the install workflow this session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// First stage of an installation (installer environment)
    Initial,
    /// Second stage, after the first reboot into the installed system
    Continue,
    /// Installed system
    #[default]
    Normal,
}

impl Mode {
    /// Lowercase name as used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Installation => "installation",
            Self::Update => "update",
            Self::Autoinstall => "autoinstall",
            Self::Autoupgrade => "autoupgrade",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "installation" => Ok(Self::Installation),
            "update" => Ok(Self::Update),
            "autoinstall" => Ok(Self::Autoinstall),
            "autoupgrade" => Ok(Self::Autoupgrade),
            "config" => Ok(Self::Config),
            _ => Err(format!(
                "Invalid mode '{s}'. Must be one of: normal, installation, update, autoinstall, autoupgrade, config"
            )),
        }
    }
}

impl Stage {
    /// Lowercase name as used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Continue => "continue",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "initial" => Ok(Self::Initial),
            "continue" => Ok(Self::Continue),
            "normal" => Ok(Self::Normal),
            _ => Err(format!(
                "Invalid stage '{s}'. Must be one of: initial, continue, normal"
            )),
        }
    }
}

/// How the installer was reached, as reported by the install environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteAccess {
    /// Serial console in use
    pub serial_console: bool,
    /// VNC session
    pub vnc: bool,
    /// SSH session
    pub ssh: bool,
    /// Text mode front-end
    pub text_mode: bool,
}

impl RemoteAccess {
    /// True when any non-local or text-only access path is active.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.serial_console || self.vnc || self.ssh || self.text_mode
    }
}

/// Everything about the running session that layout decisions depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Run mode
    pub mode: Mode,
    /// Workflow stage
    pub stage: Stage,
    /// Installing from a live medium
    pub live_installation: bool,
    /// Compute and log commands without executing them
    pub dry_run: bool,
    /// Current system language (e.g., "de_DE")
    pub language: String,
    /// Language preselected by the install environment
    pub preselected_language: String,
    /// Product-level default layout; empty when the product sets none
    pub product_default_layout: String,
    /// Architecture supports configuring X11 during setup
    pub x11_setup_needed: bool,
    /// Architecture supports loading console keymaps
    pub loadkeys_supported: bool,
    /// Running as a Xen guest (no X11 autorepeat fix)
    pub xen: bool,
    /// Remote/text access flags
    pub remote: RemoteAccess,
    /// Value of the `DISPLAY` variable, if any
    pub display: Option<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            stage: Stage::Normal,
            live_installation: false,
            dry_run: false,
            language: DEFAULT_LANGUAGE.to_string(),
            preselected_language: DEFAULT_LANGUAGE.to_string(),
            product_default_layout: String::new(),
            x11_setup_needed: true,
            loadkeys_supported: true,
            xen: false,
            remote: RemoteAccess::default(),
            display: None,
        }
    }
}

impl SessionContext {
    /// First installation stage.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.stage == Stage::Initial
    }

    /// Profile editing mode.
    #[must_use]
    pub fn is_config(&self) -> bool {
        self.mode == Mode::Config
    }

    /// Interactive or unattended update.
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(self.mode, Mode::Update | Mode::Autoupgrade)
    }

    /// Saved state exists and should be read instead of probing.
    #[must_use]
    pub fn reads_saved_state(&self) -> bool {
        !self.is_initial() || self.live_installation
    }

    /// Initial stage of a regular (non-live) installation.
    #[must_use]
    pub fn is_installer_environment(&self) -> bool {
        self.is_initial() && !self.live_installation
    }

    /// Whether the layout must not follow language changes automatically.
    ///
    /// Any single condition suppresses language-following.
    #[must_use]
    pub fn layout_is_fixed(&self, user_has_chosen: bool) -> bool {
        user_has_chosen
            || (self.is_update() && !self.is_initial())
            || self.mode == Mode::Autoinstall
            || self.live_installation
            || !self.product_default_layout.is_empty()
    }

    /// Whether an X11 keymap should be set from this session at all.
    #[must_use]
    pub fn graphical_setup_allowed(&self) -> bool {
        self.x11_setup_needed && !self.remote.any()
    }

    /// True when `DISPLAY` points at a forwarded display (`:10` and above).
    #[must_use]
    pub fn display_is_forwarded(&self) -> bool {
        self.display
            .as_deref()
            .and_then(|display| display.split(':').nth(1))
            .and_then(|rest| rest.split('.').next())
            .and_then(|number| number.parse::<u32>().ok())
            .is_some_and(|number| number >= 10)
    }
}
