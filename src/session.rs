//! The keyboard configuration session.
//!
//! A [`KeyboardSession`] owns the [`ConfigurationState`] of one process
//! together with the database and collaborators it works against. It is
//! the surface the command line (or an installer front-end) drives:
//! start, propose, set, save, import and export.

use anyhow::Result;
use std::path::Path;
use tracing::{error, info};

use crate::applier::{AppliedCommands, Applier, CommandTemplates};
use crate::config::Config;
use crate::constants::{DEFAULT_LANGUAGE, DEFAULT_LAYOUT, INSTALL_KEYTABLE_OVERRIDES, LAYOUT_ID_KEY};
use crate::keyboard_db::{DisplayCatalog, KeyboardDb};
use crate::models::{ExpertSettings, ExpertSettingsPatch, KeyboardProfile, Mode, SessionContext};
use crate::persistence;
use crate::resolver::LayoutResolver;
use crate::services::{Collaborators, Section, SysconfigFiles, SysconfigStore};
use crate::state::{ConfigurationState, LayoutEnv};

/// One keyboard configuration session.
pub struct KeyboardSession {
    ctx: SessionContext,
    db: KeyboardDb,
    catalog: DisplayCatalog,
    templates: CommandTemplates,
    services: Collaborators,
    state: ConfigurationState,
    load_called: bool,
    last_applied: AppliedCommands,
}

impl KeyboardSession {
    /// Creates a session without reading anything.
    #[must_use]
    pub fn new(
        ctx: SessionContext,
        db: KeyboardDb,
        catalog: DisplayCatalog,
        templates: CommandTemplates,
        services: Collaborators,
    ) -> Self {
        Self {
            ctx,
            db,
            catalog,
            templates,
            services,
            state: ConfigurationState::new(),
            load_called: false,
            last_applied: AppliedCommands::default(),
        }
    }

    /// Creates and starts a session against the system described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (db, catalog) = match &config.paths.database_dir {
            Some(dir) => (KeyboardDb::load_from_dir(dir)?, DisplayCatalog::load_from_dir(dir)?),
            None => (KeyboardDb::load()?, DisplayCatalog::load()?),
        };
        let db = db.with_language_overrides(&config.language_keyboards);
        let templates =
            CommandTemplates::new(config.paths.loadkeys.clone(), config.paths.x11_bin_dir.clone());

        let mut session = Self::new(
            config.to_context(),
            db,
            catalog,
            templates,
            Collaborators::system(config),
        );
        session.start()?;
        Ok(session)
    }

    /// Initializes the state from saved data or, failing that, from probing.
    pub fn start(&mut self) -> Result<()> {
        if self.ctx.is_config() {
            self.read();
            return Ok(());
        }

        info!(
            "initial: {}, update: {}",
            self.ctx.is_initial(),
            self.ctx.is_update()
        );

        let success = if self.ctx.reads_saved_state() {
            self.load()?
        } else {
            self.state.expert =
                persistence::read_expert_settings(self.services.sysconfig.as_ref(), &self.state.expert)?;
            false
        };

        if !success {
            self.probe_and_initialize()?;
        }

        self.read();
        Ok(())
    }

    fn apply(&mut self, layout_id: &str) -> bool {
        let env = LayoutEnv {
            db: &self.db,
            translator: self.services.translator.as_ref(),
            graphical_setup: self.ctx.graphical_setup_allowed(),
            commands: &self.templates,
        };
        self.state.apply_layout(layout_id, &env)
    }

    /// Restores the saved configuration.
    ///
    /// Returns false when no layout was saved; the state then holds the
    /// built-in defaults.
    pub fn load(&mut self) -> Result<bool> {
        self.load_called = true;
        self.state.expert =
            persistence::read_expert_settings(self.services.sysconfig.as_ref(), &self.state.expert)?;

        if !self.ctx.reads_saved_state() {
            return Ok(true);
        }

        let (layout, model) = persistence::read_layout_id(self.services.sysconfig.as_ref())?;
        if let Some(model) = model {
            self.state.hardware_model = model;
        }
        info!(
            "current_kbd {} model {}",
            layout, self.state.hardware_model
        );

        if layout.is_empty() {
            info!("Restoring data failed, returning defaults");
            self.state.reset_to_builtin_default();
            return Ok(false);
        }

        if self.ctx.is_config() {
            self.state.record_layout(&layout, &self.db);
        } else {
            self.state.current_layout.clone_from(&layout);
            self.apply(&layout);
            info!("Restored data (sysconfig) for keyboard: <{}>", layout);
        }
        Ok(true)
    }

    /// Whether [`Self::load`] has been called since the last reset.
    #[must_use]
    pub fn called_load(&self) -> bool {
        self.load_called
    }

    /// Probes the hardware and derives the layout from it and the language.
    ///
    /// Returns the layout identifier the session ends up with.
    pub fn probe_and_initialize(&mut self) -> Result<String> {
        info!("Keyboard probe");
        let probed = self.services.probe.probe();
        self.state.hardware_model = probed.model;
        self.state.probed_x11_layout = probed.x11_layout;
        self.state.unique_hardware_key = probed.unique_key;

        let default_layout = LayoutResolver::new(&self.db).resolve(
            &self.ctx.language,
            &self.state.probed_x11_layout,
            DEFAULT_LAYOUT,
        );
        self.apply(&default_layout);

        if self.ctx.is_initial() {
            if let Some(keytable) = self.services.install.keytable() {
                info!("Install environment keyboard: {}", keytable);
                let stem = keytable
                    .find(".map.gz")
                    .map_or(keytable.as_str(), |pos| &keytable[..pos]);

                let mut keymap_to_layout = self.db.reduced(&self.state.hardware_model).keymap_to_layout();
                keymap_to_layout.extend(
                    INSTALL_KEYTABLE_OVERRIDES
                        .iter()
                        .map(|(keymap, layout)| ((*keymap).to_string(), (*layout).to_string())),
                );

                if let Some(layout) = keymap_to_layout.get(stem).filter(|l| !l.is_empty()).cloned() {
                    self.set_layout(&layout)?;
                    self.state.user_has_chosen = true;
                }
            } else if self.ctx.preselected_language != DEFAULT_LANGUAGE {
                info!(
                    "Language ({}) was preselected -> setting keyboard to {}",
                    self.ctx.preselected_language, default_layout
                );
                self.set_layout(&default_layout)?;
            }
        }

        info!("End probe {}", default_layout);
        Ok(self.state.current_layout.clone())
    }

    /// Takes the on-entry snapshot used for change tracking and export.
    pub fn read(&mut self) {
        self.state.snapshot();
    }

    /// Makes `layout_id` current and applies it to the running system.
    ///
    /// Returns false when the layout is not available on this hardware.
    pub fn set_layout(&mut self, layout_id: &str) -> Result<bool> {
        info!("set to {}", layout_id);

        if self.ctx.is_config() {
            self.state.record_layout(layout_id, &self.db);
            return Ok(true);
        }

        if !self.apply(layout_id) {
            return Ok(false);
        }

        self.last_applied =
            Applier::new(&self.ctx, self.services.runner.as_ref()).apply(&self.state);

        if self.ctx.is_installer_environment() {
            self.services
                .install
                .record_keytable(&self.state.console_keymap)?;
        }
        Ok(true)
    }

    /// Reconciles the layout with the language and the user's choice.
    ///
    /// Returns the display name of the resulting layout.
    pub fn propose(&mut self, force_reset: bool, language_changed: bool) -> Result<String> {
        info!("force_reset: {}", force_reset);
        info!("language_changed: {}", language_changed);

        if force_reset {
            if !self.state.default_layout.is_empty() {
                let default_layout = self.state.default_layout.clone();
                self.set_layout(&default_layout)?;
            }
            self.state.user_has_chosen = false;
            self.load_called = false;
        } else if self.ctx.layout_is_fixed(self.state.user_has_chosen) {
            if language_changed {
                info!("User has chosen a keyboard; not following language - only retranslation.");
                let current = self.state.current_layout.clone();
                self.set_layout(&current)?;
            }
        } else {
            let local = LayoutResolver::new(&self.db).layout_for_language(&self.ctx.language, DEFAULT_LAYOUT);
            if !local.is_empty() {
                self.set_layout(&local)?;
            } else if language_changed {
                error!("Can't follow language - only retranslation");
                let current = self.state.current_layout.clone();
                self.set_layout(&current)?;
            }
        }

        Ok(self.display_name())
    }

    /// Sets the layout belonging to `language`, if there is one.
    pub fn set_layout_for_language(&mut self, language: &str) -> Result<()> {
        let layout = LayoutResolver::new(&self.db).layout_for_language(language, DEFAULT_LAYOUT);
        info!("language {} proposed keyboard {}", language, layout);
        if !layout.is_empty() {
            self.set_layout(&layout)?;
        }
        Ok(())
    }

    /// Makes the current layout the session default.
    pub fn set_default_layout(&mut self) {
        info!("Setting default keyboard to {}", self.state.current_layout);
        self.state.default_layout.clone_from(&self.state.current_layout);
    }

    /// Records that the user picked the layout explicitly.
    pub fn mark_user_choice(&mut self) {
        self.state.user_has_chosen = true;
    }

    /// Changes the session language (display texts and language-following).
    pub fn set_language(&mut self, language: &str) {
        self.ctx.language = language.to_string();
    }

    /// Display name of the current layout in the session language.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.state.display_name(&self.catalog, &self.ctx.language)
    }

    /// Display name of any layout; the identifier itself when unknown.
    #[must_use]
    pub fn layout_name(&self, layout_id: &str) -> String {
        self.db
            .reduced(&self.state.hardware_model)
            .get(layout_id)
            .map_or_else(
                || layout_id.to_string(),
                |record| {
                    self.catalog
                        .resolve_display_text(&record.name_token, &self.ctx.language)
                },
            )
    }

    /// `(identifier, display name)` of every available layout, sorted by name.
    #[must_use]
    pub fn selection(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .db
            .all_entries(&self.state.hardware_model)
            .into_iter()
            .map(|(id, token)| {
                let name = self.catalog.resolve_display_text(&token, &self.ctx.language);
                (id, name)
            })
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// One-line summary of the configuration.
    #[must_use]
    pub fn summary(&self) -> String {
        let label = self
            .catalog
            .resolve_display_text("Current Keyboard Layout: %1", &self.ctx.language);
        label.replace("%1", &self.display_name())
    }

    /// True when the layout or an expert setting changed since the snapshot.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.state.modified()
    }

    /// Current expert settings.
    #[must_use]
    pub fn expert_settings(&self) -> &ExpertSettings {
        &self.state.expert
    }

    /// Changes expert settings.
    pub fn set_expert_settings(&mut self, patch: &ExpertSettingsPatch) {
        self.state.set_expert(patch);
    }

    /// Writes the configuration to the target system.
    ///
    /// During an update only a missing layout identifier is filled in.
    pub fn save(&mut self) -> Result<()> {
        if self.ctx.is_update() {
            persistence::backfill_layout_id(
                self.services.sysconfig.as_mut(),
                self.services.translator.as_ref(),
                &self.db,
            )?;
            return Ok(());
        }

        persistence::write_state(self.services.sysconfig.as_mut(), &self.state)?;

        let probed = self.services.probe.probe_manual_all();
        persistence::mark_devices(
            self.services.devices.as_mut(),
            &probed,
            &self.state.unique_hardware_key,
            self.ctx.remote.serial_console,
        )?;

        info!("Saved data for keyboard: <{}>", self.state.current_layout);
        Ok(())
    }

    /// Layout of the system mounted at `destdir`, when it should be offered.
    ///
    /// Offered when it differs from the current layout and is available on
    /// this hardware. Never offered during an unattended update.
    pub fn update_candidate(&self, destdir: &Path) -> Result<Option<String>> {
        if self.ctx.mode == Mode::Autoupgrade {
            return Ok(None);
        }

        let target = SysconfigFiles::new(destdir).read(
            Section::Keyboard,
            LAYOUT_ID_KEY,
            &self.state.current_layout,
        )?;
        let (target, _) = persistence::split_layout_id(&target);

        let available = self.db.reduced(&self.state.hardware_model).contains(&target);
        if target != self.state.current_layout && available {
            info!(
                "current_kbd: {}, target_kbd: {}",
                self.state.current_layout, target
            );
            return Ok(Some(target));
        }
        Ok(None)
    }

    /// Switches to the layout of the system being updated.
    pub fn adopt_update_layout(&mut self, layout_id: &str) -> Result<bool> {
        let applied = self.set_layout(layout_id)?;
        self.state.user_has_chosen = true;
        Ok(applied)
    }

    /// Applies a profile.
    pub fn import_settings(&mut self, profile: &KeyboardProfile) -> Result<bool> {
        if !self.state.has_snapshot() {
            self.read();
        }

        let layout = if profile.keymap.is_empty() {
            self.state.current_layout.clone()
        } else {
            profile.keymap.clone()
        };
        self.set_layout(&layout)?;
        self.set_expert_settings(&profile.keyboard_values);
        Ok(true)
    }

    /// Current layout plus the expert settings changed since the snapshot.
    #[must_use]
    pub fn export_settings(&self) -> KeyboardProfile {
        KeyboardProfile {
            keymap: self.state.current_layout.clone(),
            keyboard_values: self.state.expert_diff(),
        }
    }

    /// The configuration state.
    #[must_use]
    pub fn state(&self) -> &ConfigurationState {
        &self.state
    }

    /// The session context.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// The keyboard database.
    #[must_use]
    pub fn db(&self) -> &KeyboardDb {
        &self.db
    }

    /// Commands issued by the last [`Self::set_layout`].
    #[must_use]
    pub fn last_applied(&self) -> &AppliedCommands {
        &self.last_applied
    }
}
