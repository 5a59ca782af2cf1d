//! Layout resolution from language and hardware signals.

use tracing::info;

use crate::keyboard_db::{language_family, KeyboardDb};

/// Derives the layout identifier that should become current.
#[derive(Debug, Clone, Copy)]
pub struct LayoutResolver<'a> {
    db: &'a KeyboardDb,
}

impl<'a> LayoutResolver<'a> {
    /// Creates a resolver over the database's translation tables.
    #[must_use]
    pub const fn new(db: &'a KeyboardDb) -> Self {
        Self { db }
    }

    /// Resolves the layout for a session.
    ///
    /// A non-empty `probed_x11_layout` wins and is resolved through the
    /// language table with an empty fallback. Otherwise the system language
    /// is resolved with `fallback`.
    #[must_use]
    pub fn resolve(&self, language_code: &str, probed_x11_layout: &str, fallback: &str) -> String {
        if probed_x11_layout.is_empty() {
            self.layout_for_language(language_code, fallback)
        } else {
            self.layout_for_language(probed_x11_layout, "")
        }
    }

    /// Language lookup: exact code first, then the two-letter family, then `fallback`.
    #[must_use]
    pub fn layout_for_language(&self, language_code: &str, fallback: &str) -> String {
        if let Some(layout) = self.db.translate_language_to_layout(language_code) {
            if !layout.is_empty() {
                info!(
                    "Layout for language {} (default {}): {}",
                    language_code, fallback, layout
                );
                return layout.to_string();
            }
        }

        let family = language_family(language_code);
        let layout = self
            .db
            .translate_language_to_layout(family)
            .unwrap_or(fallback)
            .to_string();
        info!(
            "Layout for language {} (default {}): {}",
            family, fallback, layout
        );
        layout
    }
}
