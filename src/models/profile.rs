//! Import/export profile of the keyboard settings.

use serde::{Deserialize, Serialize};

use super::ExpertSettingsPatch;

/// Keyboard section of an unattended-install profile.
///
/// On export `keyboard_values` only carries the expert settings changed
/// since the session started and is left out entirely when nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyboardProfile {
    /// Layout identifier; empty on import keeps the current layout
    #[serde(default)]
    pub keymap: String,
    /// Expert settings
    #[serde(default, skip_serializing_if = "ExpertSettingsPatch::is_empty")]
    pub keyboard_values: ExpertSettingsPatch,
}
