//! In-memory keyboard configuration of one session.
//!
//! [`ConfigurationState`] holds the current layout and everything derived
//! from it (console keymap, compose table, X11 parameters, apply commands),
//! the sticky session default, the on-entry snapshot used for change
//! tracking, and the expert settings.

use serde::Serialize;
use tracing::{debug, info};

use crate::applier::CommandTemplates;
use crate::constants::{DEFAULT_CONSOLE_KEYMAP, DEFAULT_HARDWARE_MODEL, DEFAULT_LAYOUT};
use crate::keyboard_db::{DisplayCatalog, KeyboardDb};
use crate::models::{ExpertSettings, ExpertSettingsPatch, X11Parameters};
use crate::services::X11Translator;

/// What `apply_layout` needs besides the state itself.
#[derive(Clone, Copy)]
pub struct LayoutEnv<'a> {
    /// Keyboard database
    pub db: &'a KeyboardDb,
    /// Console keymap → X11 translator
    pub translator: &'a dyn X11Translator,
    /// Whether an X11 command may be built for this session
    pub graphical_setup: bool,
    /// Command templates for the apply commands
    pub commands: &'a CommandTemplates,
}

/// The central mutable keyboard state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationState {
    /// Active layout identifier; empty means unset
    pub current_layout: String,
    /// Hardware model used for database lookups
    pub hardware_model: String,
    /// Console keymap file of the current layout
    pub console_keymap: String,
    /// Compose table of the current layout
    pub compose_table: String,
    /// X11 parameters of the current layout
    pub x11: X11Parameters,
    /// X11 layout reported by the hardware; empty on most machines
    pub probed_x11_layout: String,
    /// Command that loads the console keymap
    pub console_command: String,
    /// Command that sets the X11 keymap; empty when X11 is not configured
    pub x11_command: String,
    /// First layout established in this session
    pub default_layout: String,
    /// Layout at the time of the on-entry snapshot
    pub on_entry_layout: String,
    /// Expert settings at the time of the on-entry snapshot
    pub on_entry_expert: Option<ExpertSettings>,
    /// Set once the user picked a layout; stops language-following
    pub user_has_chosen: bool,
    /// Expert settings
    pub expert: ExpertSettings,
    /// An expert setting actually changed since the snapshot
    pub expert_changed: bool,
    /// Unique key of the probed keyboard device
    pub unique_hardware_key: String,
    /// Untranslated display name token of the current layout
    pub name_token: String,
}

impl Default for ConfigurationState {
    fn default() -> Self {
        Self {
            current_layout: String::new(),
            hardware_model: DEFAULT_HARDWARE_MODEL.to_string(),
            console_keymap: DEFAULT_CONSOLE_KEYMAP.to_string(),
            compose_table: "clear winkeys shiftctrl latin1.add".to_string(),
            x11: X11Parameters::default(),
            probed_x11_layout: String::new(),
            console_command: String::new(),
            x11_command: String::new(),
            default_layout: String::new(),
            on_entry_layout: String::new(),
            on_entry_expert: None,
            user_has_chosen: false,
            expert: ExpertSettings::default(),
            expert_changed: false,
            unique_hardware_key: String::new(),
            name_token: String::new(),
        }
    }
}

impl ConfigurationState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `layout_id` current and re-derives everything from it.
    ///
    /// Returns false and leaves the state untouched when the layout has no
    /// data for the current hardware model.
    pub fn apply_layout(&mut self, layout_id: &str, env: &LayoutEnv<'_>) -> bool {
        info!("Setting keyboard to: <{}>", layout_id);

        let reduced = env.db.reduced(&self.hardware_model);
        let Some(record) = reduced.get(layout_id) else {
            info!("No description for keyboard <{}>", layout_id);
            return false;
        };
        info!("Description for keyboard <{}>: <{:?}>", layout_id, record);

        let console_keymap = record.console_keymap().to_string();
        let x11 = env
            .translator
            .translate(&console_keymap)
            .map(|fields| X11Parameters::from_fields(&fields))
            .unwrap_or_default();
        debug!("X11 parameters: {:?}", x11);

        let mut compose_table = String::from("clear ");
        if x11.has_winkeys() {
            compose_table.push_str("winkeys shiftctrl ");
        }
        compose_table.push_str(record.compose_suffix());

        self.console_command = env.commands.console_command(&console_keymap);
        self.x11_command = if !x11.apply.is_empty() && env.graphical_setup {
            env.commands.x11_command(&x11.apply)
        } else {
            String::new()
        };

        self.name_token.clone_from(&record.name_token);
        self.console_keymap = console_keymap;
        self.compose_table = compose_table;
        self.x11 = x11;
        self.current_layout = layout_id.to_string();

        if self.default_layout.is_empty() {
            self.default_layout = layout_id.to_string();
        }

        true
    }

    /// Records a layout without deriving anything (profile editing).
    pub fn record_layout(&mut self, layout_id: &str, db: &KeyboardDb) {
        self.current_layout = layout_id.to_string();
        self.name_token = db
            .lookup(layout_id, &self.hardware_model)
            .map_or_else(|| layout_id.to_string(), |record| record.name_token);
    }

    /// Display name of the current layout in `language`.
    #[must_use]
    pub fn display_name(&self, catalog: &DisplayCatalog, language: &str) -> String {
        catalog.resolve_display_text(&self.name_token, language)
    }

    /// Takes the on-entry snapshot and clears the expert dirty flag.
    pub fn snapshot(&mut self) {
        self.on_entry_layout.clone_from(&self.current_layout);
        self.on_entry_expert = Some(self.expert.clone());
        self.expert_changed = false;
        debug!("keyboard_on_entry: {}", self.on_entry_layout);
    }

    /// Whether a snapshot has been taken.
    #[must_use]
    pub fn has_snapshot(&self) -> bool {
        self.on_entry_expert.is_some()
    }

    /// True when the layout or an expert setting changed since the snapshot.
    #[must_use]
    pub fn modified(&self) -> bool {
        self.current_layout != self.on_entry_layout || self.expert_changed
    }

    /// Applies expert setting changes; the dirty flag only rises on a real change.
    pub fn set_expert(&mut self, patch: &ExpertSettingsPatch) {
        if self.expert.apply(patch) {
            self.expert_changed = true;
        }
        info!(
            "rate:{} delay:{} numlock:{} disclock:{}",
            self.expert.rate,
            self.expert.delay,
            self.expert.numlock,
            self.expert.disable_caps_lock
        );
    }

    /// Expert settings that differ from the on-entry snapshot.
    #[must_use]
    pub fn expert_diff(&self) -> ExpertSettingsPatch {
        match &self.on_entry_expert {
            Some(base) => self.expert.diff_from(base),
            None => self.expert.diff_from(&ExpertSettings::default()),
        }
    }

    /// Resets the layout to the built-in default without deriving anything.
    pub fn reset_to_builtin_default(&mut self) {
        self.current_layout = DEFAULT_LAYOUT.to_string();
        self.hardware_model = DEFAULT_HARDWARE_MODEL.to_string();
    }

    /// Value persisted as the layout identifier (`layout,model`).
    #[must_use]
    pub fn persisted_id(&self) -> String {
        format!("{},{}", self.current_layout, self.hardware_model)
    }
}
