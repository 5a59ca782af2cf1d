//! Display text resolution for layout names.
//!
//! Database records store an untranslated name token. The token is turned
//! into display text only when it is read, using the language active at
//! that moment, so a language change needs no database reload.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File name of the catalog inside a database directory.
pub const TRANSLATIONS_FILE: &str = "translations.json";

/// Translation catalog: language → token → display text.
#[derive(Debug, Clone, Default)]
pub struct DisplayCatalog {
    languages: BTreeMap<String, BTreeMap<String, String>>,
}

impl DisplayCatalog {
    /// Loads the embedded catalog.
    pub fn load() -> Result<Self> {
        let languages = serde_json::from_str(include_str!("../data/translations.json"))
            .context("Failed to parse embedded translations.json")?;
        Ok(Self { languages })
    }

    /// Loads `translations.json` from a database directory, or the embedded
    /// catalog when the directory has none.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(TRANSLATIONS_FILE);
        if !path.exists() {
            return Self::load();
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read translations: {}", path.display()))?;
        let languages = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse translations: {}", path.display()))?;
        Ok(Self { languages })
    }

    /// Resolves a name token for `language`.
    ///
    /// Tries the full language code, then its two-letter family; falls back
    /// to the token itself.
    #[must_use]
    pub fn resolve_display_text(&self, token: &str, language: &str) -> String {
        let family = super::language_family(language);
        [language, family]
            .iter()
            .filter_map(|code| self.languages.get(*code))
            .find_map(|catalog| catalog.get(token))
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }
}
