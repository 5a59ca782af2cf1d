//! Keyboard database entries.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMPOSE_SUFFIX, DEFAULT_CONSOLE_KEYMAP};

/// Console data for one hardware model of one layout.
///
/// Stored in the raw database under `layout -> architecture -> model`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Console keymap file (e.g., "de-latin1-nodeadkeys.map.gz")
    #[serde(rename = "ncurses", default, skip_serializing_if = "Option::is_none")]
    pub console_keymap: Option<String>,
    /// Compose table suffix (e.g., "latin2.add")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose: Option<String>,
}

/// One layout of the reduced database, valid for a single hardware model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRecord {
    /// Layout identifier (e.g., "english-us")
    pub id: String,
    /// Untranslated display name token, resolved at read time
    pub name_token: String,
    /// Console data for the hardware model in effect
    pub entry: ModelEntry,
}

impl LayoutRecord {
    /// Console keymap of this record, "us.map.gz" when the record omits it.
    #[must_use]
    pub fn console_keymap(&self) -> &str {
        self.entry
            .console_keymap
            .as_deref()
            .unwrap_or(DEFAULT_CONSOLE_KEYMAP)
    }

    /// Compose table suffix of this record, "latin1.add" when the record omits it.
    #[must_use]
    pub fn compose_suffix(&self) -> &str {
        self.entry.compose.as_deref().unwrap_or(DEFAULT_COMPOSE_SUFFIX)
    }

    /// Console keymap name without directory-independent suffixes (e.g., "us").
    ///
    /// This is the key used when mapping install-time keytables back to layouts.
    #[must_use]
    pub fn keymap_stem(&self) -> &str {
        self.entry
            .console_keymap
            .as_deref()
            .unwrap_or_default()
            .split('.')
            .next()
            .unwrap_or_default()
    }
}
