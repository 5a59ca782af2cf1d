//! Hardware facts reported by the probe.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DEFAULT_HARDWARE_MODEL;

/// The first keyboard found by a hardware probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbedKeyboard {
    /// Hardware model key used for database lookups (e.g., "pc104")
    pub model: String,
    /// X11 layout reported by the hardware itself; empty on most machines
    #[serde(default)]
    pub x11_layout: String,
    /// Identifier of the physical device; empty when unknown
    #[serde(default)]
    pub unique_key: String,
}

impl Default for ProbedKeyboard {
    fn default() -> Self {
        Self {
            model: DEFAULT_HARDWARE_MODEL.to_string(),
            x11_layout: String::new(),
            unique_key: String::new(),
        }
    }
}

/// Attributes tracked per device in the probe status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceAttribute {
    /// Device has a configuration
    Configured,
    /// Device is required by the system
    Needed,
}

impl fmt::Display for DeviceAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => write!(f, "configured"),
            Self::Needed => write!(f, "needed"),
        }
    }
}
