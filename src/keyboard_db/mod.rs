//! Keyboard layout database and translation tables.
//!
//! This module provides access to the embedded (or externally supplied)
//! keyboard database: per layout, console data for every architecture and
//! hardware model, plus the language→layout and X11 layout→layout tables.
//!
//! The raw database is never used directly for decisions. Callers ask for
//! the *reduced* view for one hardware model; a layout without data for that
//! model does not exist in the reduced view.

pub mod display;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::models::{LayoutRecord, ModelEntry};

pub use display::DisplayCatalog;

/// File name of the layout table inside a database directory.
pub const KEYBOARDS_FILE: &str = "keyboards.json";
/// File name of the language table inside a database directory.
pub const LANG2KEYBOARD_FILE: &str = "lang2keyboard.json";
/// File name of the X11 layout table inside a database directory.
pub const XKBLAYOUT2KEYBOARD_FILE: &str = "xkblayout2keyboard.json";

/// One layout of the raw database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLayout {
    /// Untranslated display name token (e.g., "English (US)")
    pub name: String,
    /// Architecture → hardware model → console data
    #[serde(default)]
    pub architectures: BTreeMap<String, BTreeMap<String, ModelEntry>>,
}

impl RawLayout {
    /// Console data for `model`, looked up across all architectures.
    ///
    /// Hardware model keys are architecture specific, so at most one
    /// architecture carries a given model. Empty entries count as missing.
    fn entry_for_model(&self, model: &str) -> Option<&ModelEntry> {
        self.architectures
            .values()
            .filter_map(|models| models.get(model))
            .find(|entry| entry.console_keymap.is_some() || entry.compose.is_some())
    }
}

/// Database schema from keyboards.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyboardDatabase {
    version: String,
    layouts: BTreeMap<String, RawLayout>,
}

/// The database filtered down to one hardware model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedDb {
    model: String,
    records: BTreeMap<String, LayoutRecord>,
}

impl ReducedDb {
    /// Hardware model this view was built for.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Gets a layout record by identifier.
    #[must_use]
    pub fn get(&self, layout_id: &str) -> Option<&LayoutRecord> {
        self.records.get(layout_id)
    }

    /// Whether the layout is available on this hardware model.
    #[must_use]
    pub fn contains(&self, layout_id: &str) -> bool {
        self.records.contains_key(layout_id)
    }

    /// All records, ordered by layout identifier.
    pub fn records(&self) -> impl Iterator<Item = &LayoutRecord> {
        self.records.values()
    }

    /// Number of layouts available on this hardware model.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no layout is available on this hardware model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maps console keymap stems (e.g., "us") to layout identifiers.
    ///
    /// When several layouts share a keymap, the last one in identifier
    /// order wins.
    #[must_use]
    pub fn keymap_to_layout(&self) -> BTreeMap<String, String> {
        self.records
            .values()
            .map(|record| (record.keymap_stem().to_string(), record.id.clone()))
            .collect()
    }
}

/// Keyboard database with lookup and translation capabilities.
#[derive(Debug, Clone)]
pub struct KeyboardDb {
    /// All layouts with data for every architecture and model
    layouts: BTreeMap<String, RawLayout>,
    /// Language code → layout identifier
    lang2keyboard: BTreeMap<String, String>,
    /// X11 layout code → layout identifier
    xkblayout2keyboard: BTreeMap<String, String>,
}

impl KeyboardDb {
    /// Loads the database from the embedded JSON files.
    pub fn load() -> Result<Self> {
        let db: KeyboardDatabase = serde_json::from_str(include_str!("../data/keyboards.json"))
            .context("Failed to parse embedded keyboards.json")?;
        let lang2keyboard = serde_json::from_str(include_str!("../data/lang2keyboard.json"))
            .context("Failed to parse embedded lang2keyboard.json")?;
        let xkblayout2keyboard =
            serde_json::from_str(include_str!("../data/xkblayout2keyboard.json"))
                .context("Failed to parse embedded xkblayout2keyboard.json")?;

        debug!("Loaded embedded keyboard database version {}", db.version);
        Ok(Self::from_parts(db.layouts, lang2keyboard, xkblayout2keyboard))
    }

    /// Loads the database from a directory holding the three JSON tables.
    ///
    /// The layout table is required; a missing translation table is treated
    /// as empty.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let keyboards_path = dir.join(KEYBOARDS_FILE);
        let content = fs::read_to_string(&keyboards_path).with_context(|| {
            format!(
                "Failed to read keyboard database: {}",
                keyboards_path.display()
            )
        })?;
        let db: KeyboardDatabase = serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to parse keyboard database: {}",
                keyboards_path.display()
            )
        })?;

        let lang2keyboard = read_optional_table(&dir.join(LANG2KEYBOARD_FILE))?;
        let xkblayout2keyboard = read_optional_table(&dir.join(XKBLAYOUT2KEYBOARD_FILE))?;

        info!(
            "Loaded keyboard database version {} from {}",
            db.version,
            dir.display()
        );
        Ok(Self::from_parts(db.layouts, lang2keyboard, xkblayout2keyboard))
    }

    /// Builds a database from already parsed tables.
    #[must_use]
    pub fn from_parts(
        layouts: BTreeMap<String, RawLayout>,
        lang2keyboard: BTreeMap<String, String>,
        xkblayout2keyboard: BTreeMap<String, String>,
    ) -> Self {
        Self {
            layouts,
            lang2keyboard,
            xkblayout2keyboard,
        }
    }

    /// Unions extra language→layout entries over the table; extras win.
    #[must_use]
    pub fn with_language_overrides(mut self, extra: &BTreeMap<String, String>) -> Self {
        self.lang2keyboard
            .extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Builds the reduced view for `model`.
    ///
    /// Recomputed on every call; the governing model can change between calls.
    #[must_use]
    pub fn reduced(&self, model: &str) -> ReducedDb {
        info!("Keyboard model used: {}", model);
        let records = self
            .layouts
            .iter()
            .filter_map(|(id, raw)| {
                raw.entry_for_model(model).map(|entry| {
                    (
                        id.clone(),
                        LayoutRecord {
                            id: id.clone(),
                            name_token: raw.name.clone(),
                            entry: entry.clone(),
                        },
                    )
                })
            })
            .collect();

        ReducedDb {
            model: model.to_string(),
            records,
        }
    }

    /// Looks up one layout for one hardware model.
    #[must_use]
    pub fn lookup(&self, layout_id: &str, model: &str) -> Option<LayoutRecord> {
        let raw = self.layouts.get(layout_id)?;
        let entry = raw.entry_for_model(model)?;
        Some(LayoutRecord {
            id: layout_id.to_string(),
            name_token: raw.name.clone(),
            entry: entry.clone(),
        })
    }

    /// Exact lookup in the language→layout table.
    #[must_use]
    pub fn translate_language_to_layout(&self, language_code: &str) -> Option<&str> {
        self.lang2keyboard.get(language_code).map(String::as_str)
    }

    /// Exact lookup in the X11 layout→layout table (e.g., "de" → "german").
    #[must_use]
    pub fn translate_x11_layout_to_layout(&self, x11_code: &str) -> Option<&str> {
        let layout = self.xkblayout2keyboard.get(x11_code).map(String::as_str);
        info!(
            "X11 layout {} translates to {}",
            x11_code,
            layout.unwrap_or_default()
        );
        layout
    }

    /// `(layout identifier, display name token)` of every layout available on `model`.
    #[must_use]
    pub fn all_entries(&self, model: &str) -> Vec<(String, String)> {
        self.reduced(model)
            .records()
            .map(|record| (record.id.clone(), record.name_token.clone()))
            .collect()
    }

    /// Total number of layouts across all hardware models.
    #[must_use]
    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }
}

/// The language family of a language code: its first two characters.
#[must_use]
pub fn language_family(language_code: &str) -> &str {
    language_code
        .char_indices()
        .nth(2)
        .map_or(language_code, |(end, _)| &language_code[..end])
}

fn read_optional_table(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse table: {}", path.display()))
}
