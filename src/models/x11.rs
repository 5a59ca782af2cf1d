//! X11 keyboard parameters derived from a console keymap.

use serde::Serialize;
use std::collections::BTreeMap;

/// Graphical-session keyboard settings.
///
/// Never persisted; re-derived from the console keymap on every layout change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct X11Parameters {
    /// Xkb model (e.g., "pc104")
    pub model: String,
    /// Xkb layout (e.g., "de")
    pub layout: String,
    /// Xkb variant (e.g., "nodeadkeys")
    pub variant: String,
    /// Xkb options
    pub options: String,
    /// Left Alt behavior
    pub left_alt: String,
    /// Right Alt behavior
    pub right_alt: String,
    /// Scroll Lock behavior
    pub scroll_lock: String,
    /// Right Ctrl behavior
    pub right_ctl: String,
    /// Argument list passed to setxkbmap
    pub apply: String,
}

impl Default for X11Parameters {
    fn default() -> Self {
        Self::from_fields(&BTreeMap::new())
    }
}

impl X11Parameters {
    /// Builds parameters from translator output, defaulting each missing field.
    ///
    /// Missing model becomes "pc104", missing variant becomes "basic",
    /// everything else defaults to empty.
    #[must_use]
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        let get = |key: &str, default: &str| {
            fields
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            model: get("XkbModel", "pc104"),
            layout: get("XkbLayout", ""),
            variant: get("XkbVariant", "basic"),
            options: get("XkbOptions", ""),
            left_alt: get("LeftAlt", ""),
            right_alt: get("RightAlt", ""),
            scroll_lock: get("ScrollLock", ""),
            right_ctl: get("RightCtl", ""),
            apply: get("Apply", ""),
        }
    }

    /// Whether the model gets the Windows-key compose rules.
    #[must_use]
    pub fn has_winkeys(&self) -> bool {
        self.model == "pc104" || self.model == "pc105"
    }
}
