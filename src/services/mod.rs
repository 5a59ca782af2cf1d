//! External collaborators of the keyboard logic.
//!
//! Every side effect the keyboard logic needs goes through one of the
//! traits defined here: hardware probing, the X11 keymap translator, the
//! sysconfig-style key/value files, the device status store, command
//! execution and the install environment. The system implementations live
//! in the submodules; tests substitute in-memory doubles.

pub mod command;
pub mod device_status;
pub mod install_inf;
pub mod probe;
pub mod sysconfig;
pub mod xkbctrl;

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::Config;
use crate::models::{DeviceAttribute, ProbedKeyboard};

// Re-export commonly used types
pub use command::ShellRunner;
pub use device_status::DeviceStatusFile;
pub use install_inf::InstallInfo;
pub use probe::InputDevicesProbe;
pub use sysconfig::SysconfigFiles;
pub use xkbctrl::XkbctrlTranslator;

/// Supplies hardware facts about attached keyboards.
pub trait HardwareProbe {
    /// Probes the first attached keyboard.
    ///
    /// Returns the default model with empty layout and key when nothing is found.
    fn probe(&self) -> ProbedKeyboard;

    /// Unique keys of every keyboard the probe can currently see.
    fn probe_manual_all(&self) -> Vec<String>;
}

/// Translates a console keymap into X11 keyboard fields.
pub trait X11Translator {
    /// Returns raw X11 fields (`XkbModel`, `XkbLayout`, `Apply`, ...) or
    /// `None` when the translator is unavailable or knows nothing.
    fn translate(&self, console_keymap: &str) -> Option<BTreeMap<String, String>>;
}

/// A sysconfig-style file holding keyboard settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    /// `/etc/sysconfig/keyboard`
    Keyboard,
    /// `/etc/vconsole.conf`
    Vconsole,
}

impl Section {
    /// Path of the section's file relative to the target root.
    #[must_use]
    pub const fn relative_path(self) -> &'static str {
        match self {
            Self::Keyboard => "etc/sysconfig/keyboard",
            Self::Vconsole => "etc/vconsole.conf",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.relative_path())
    }
}

/// Key/value store with buffered writes, flushed per section.
pub trait SysconfigStore {
    /// Whether the section's backing file exists.
    fn exists(&self, section: Section) -> bool;

    /// Reads `key`, returning `default` when the key or file is missing.
    fn read(&self, section: Section, key: &str, default: &str) -> Result<String>;

    /// Buffers a value write.
    fn write(&mut self, section: Section, key: &str, value: &str);

    /// Buffers a comment to be placed above `key`.
    fn write_comment(&mut self, section: Section, key: &str, comment: &str);

    /// Writes all buffered changes of `section` to its backing file.
    fn flush(&mut self, section: Section) -> Result<()>;
}

/// Per-device configured/needed flags.
pub trait DeviceStatusStore {
    /// Sets one attribute of one device.
    fn mark(&mut self, unique_key: &str, attribute: DeviceAttribute, value: bool) -> Result<()>;

    /// Unique keys of every device the store has a record for.
    fn known_devices(&self) -> Vec<String>;
}

/// Executes opaque command strings.
pub trait CommandRunner {
    /// Runs `command`; an error means it could not be run or failed.
    fn execute(&self, command: &str) -> Result<()>;
}

/// Keymap hints from, and writeback to, the installer environment.
pub trait InstallEnvironment {
    /// Keytable selected when the installer was booted, if any.
    fn keytable(&self) -> Option<String>;

    /// Records the console keymap now in use for later installer stages.
    fn record_keytable(&mut self, console_keymap: &str) -> Result<()>;
}

/// The full set of collaborators a session works with.
pub struct Collaborators {
    /// Hardware probe
    pub probe: Box<dyn HardwareProbe>,
    /// X11 translator
    pub translator: Box<dyn X11Translator>,
    /// Sysconfig files of the target system
    pub sysconfig: Box<dyn SysconfigStore>,
    /// Device status store
    pub devices: Box<dyn DeviceStatusStore>,
    /// Command runner
    pub runner: Box<dyn CommandRunner>,
    /// Install environment
    pub install: Box<dyn InstallEnvironment>,
}

impl Collaborators {
    /// Wires the system implementations for the configured target root.
    #[must_use]
    pub fn system(config: &Config) -> Self {
        let root = &config.paths.root;
        Self {
            probe: Box::new(InputDevicesProbe::new(
                root,
                config.hardware.model.clone(),
                config.hardware.x11_layout.clone(),
            )),
            translator: Box::new(XkbctrlTranslator::new(&config.paths.xkbctrl)),
            sysconfig: Box::new(SysconfigFiles::new(root)),
            devices: Box::new(DeviceStatusFile::new(root)),
            runner: Box::new(ShellRunner),
            install: Box::new(InstallInfo::new(root)),
        }
    }
}
