//! Shared test fixtures: a small keyboard database and in-memory collaborators.
#![allow(dead_code)] // Not every test binary uses every fixture

use anyhow::{bail, Result};
use kbdsetup::applier::CommandTemplates;
use kbdsetup::keyboard_db::{DisplayCatalog, KeyboardDb, RawLayout};
use kbdsetup::models::{DeviceAttribute, ModelEntry, Mode, ProbedKeyboard, SessionContext, Stage};
use kbdsetup::services::{
    Collaborators, CommandRunner, DeviceStatusStore, HardwareProbe, InstallEnvironment, Section,
    SysconfigStore, X11Translator,
};
use kbdsetup::session::KeyboardSession;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

/// Unique key of the keyboard the fake probe reports.
pub const PROBED_KEY: &str = "0003:046d:c31c/usb-0000:00:14.0-1/input0";

/// Builds a raw layout with pc104 data on x86_64.
fn pc_layout(name: &str, keymap: &str, compose: Option<&str>) -> RawLayout {
    let entry = ModelEntry {
        console_keymap: Some(keymap.to_string()),
        compose: compose.map(str::to_string),
    };
    RawLayout {
        name: name.to_string(),
        architectures: BTreeMap::from([(
            "x86_64".to_string(),
            BTreeMap::from([("pc104".to_string(), entry)]),
        )]),
    }
}

fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Creates a deterministic keyboard database.
///
/// `german` additionally has data for the `macintosh` model; `mac-us` has
/// data for `macintosh` only.
pub fn sample_db() -> KeyboardDb {
    let mut german = pc_layout("German", "de-latin1-nodeadkeys.map.gz", None);
    german.architectures.insert(
        "ppc".to_string(),
        BTreeMap::from([(
            "macintosh".to_string(),
            ModelEntry {
                console_keymap: Some("mac-de-latin1-nodeadkeys.map.gz".to_string()),
                compose: None,
            },
        )]),
    );

    let mac_us = RawLayout {
        name: "English (US, Mac)".to_string(),
        architectures: BTreeMap::from([(
            "ppc".to_string(),
            BTreeMap::from([(
                "macintosh".to_string(),
                ModelEntry {
                    console_keymap: Some("mac-us.map.gz".to_string()),
                    compose: None,
                },
            )]),
        )]),
    };

    let layouts = BTreeMap::from([
        ("english-us".to_string(), pc_layout("English (US)", "us.map.gz", None)),
        ("german".to_string(), german),
        (
            "french".to_string(),
            pc_layout("French", "fr-latin1.map.gz", Some("latin9.add")),
        ),
        ("danish".to_string(), pc_layout("Danish", "dk-latin1.map.gz", None)),
        ("mac-us".to_string(), mac_us),
    ]);

    KeyboardDb::from_parts(
        layouts,
        table(&[
            ("en_US", "english-us"),
            ("de", "german"),
            ("de_DE", "german"),
            ("fr", "french"),
            ("da", "danish"),
        ]),
        table(&[
            ("us", "english-us"),
            ("de", "german"),
            ("fr", "french"),
            ("dk", "danish"),
        ]),
    )
}

/// Command templates with fixed binary locations.
pub fn templates() -> CommandTemplates {
    CommandTemplates::new(PathBuf::from("/bin/loadkeys"), PathBuf::from("/usr/bin"))
}

/// Session context of an installed system.
pub fn normal_context(language: &str) -> SessionContext {
    SessionContext {
        language: language.to_string(),
        ..SessionContext::default()
    }
}

/// Session context of the first stage of an interactive installation.
pub fn installer_context(language: &str) -> SessionContext {
    SessionContext {
        mode: Mode::Installation,
        stage: Stage::Initial,
        language: language.to_string(),
        ..SessionContext::default()
    }
}

/// Session context of an update of an installed system.
pub fn update_context(mode: Mode, language: &str) -> SessionContext {
    SessionContext {
        mode,
        language: language.to_string(),
        ..SessionContext::default()
    }
}

// ============================================================================
// Collaborator doubles
// ============================================================================

/// Probe reporting a fixed keyboard.
pub struct FakeProbe {
    keyboard: ProbedKeyboard,
    attached: Vec<String>,
}

impl HardwareProbe for FakeProbe {
    fn probe(&self) -> ProbedKeyboard {
        self.keyboard.clone()
    }

    fn probe_manual_all(&self) -> Vec<String> {
        self.attached.clone()
    }
}

/// Translator knowing the keymaps of [`sample_db`]; pc105 model.
pub struct FakeTranslator;

impl X11Translator for FakeTranslator {
    fn translate(&self, console_keymap: &str) -> Option<BTreeMap<String, String>> {
        let stem = console_keymap.trim_end_matches(".map.gz");
        let layout = match stem {
            "us" => "us",
            "de-latin1-nodeadkeys" => "de",
            "fr-latin1" => "fr",
            "dk-latin1" => "dk",
            _ => return None,
        };
        let apply = format!("-model pc105 -layout {layout}");
        Some(table(&[
            ("XkbModel", "pc105"),
            ("XkbLayout", layout),
            ("XkbVariant", "nodeadkeys"),
            ("Apply", apply.as_str()),
        ]))
    }
}

/// Contents of the in-memory sysconfig store.
#[derive(Debug, Default)]
pub struct SysconfigData {
    /// Flushed values
    pub values: BTreeMap<(Section, String), String>,
    /// Flushed comments
    pub comments: BTreeMap<(Section, String), String>,
    pending: BTreeMap<(Section, String), String>,
    /// Sections flushed, in order
    pub flushed: Vec<Section>,
}

/// Sysconfig store holding everything in memory.
pub struct MemorySysconfig(Rc<RefCell<SysconfigData>>);

impl SysconfigStore for MemorySysconfig {
    fn exists(&self, section: Section) -> bool {
        self.0.borrow().values.keys().any(|(s, _)| *s == section)
    }

    fn read(&self, section: Section, key: &str, default: &str) -> Result<String> {
        let data = self.0.borrow();
        let id = (section, key.to_string());
        Ok(data
            .pending
            .get(&id)
            .or_else(|| data.values.get(&id))
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    fn write(&mut self, section: Section, key: &str, value: &str) {
        self.0
            .borrow_mut()
            .pending
            .insert((section, key.to_string()), value.to_string());
    }

    fn write_comment(&mut self, section: Section, key: &str, comment: &str) {
        self.0
            .borrow_mut()
            .comments
            .insert((section, key.to_string()), comment.to_string());
    }

    fn flush(&mut self, section: Section) -> Result<()> {
        let mut data = self.0.borrow_mut();
        let flushed: Vec<_> = data
            .pending
            .keys()
            .filter(|(s, _)| *s == section)
            .cloned()
            .collect();
        for id in flushed {
            if let Some(value) = data.pending.remove(&id) {
                data.values.insert(id, value);
            }
        }
        data.flushed.push(section);
        Ok(())
    }
}

/// Device status store holding everything in memory.
pub struct MemoryDevices(Rc<RefCell<BTreeMap<(String, DeviceAttribute), bool>>>);

impl DeviceStatusStore for MemoryDevices {
    fn mark(&mut self, unique_key: &str, attribute: DeviceAttribute, value: bool) -> Result<()> {
        self.0
            .borrow_mut()
            .insert((unique_key.to_string(), attribute), value);
        Ok(())
    }

    fn known_devices(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.borrow().keys().map(|(k, _)| k.clone()).collect();
        keys.dedup();
        keys
    }
}

/// Command runner recording every command; optionally failing all of them.
pub struct RecordingRunner {
    log: Rc<RefCell<Vec<String>>>,
    fail: bool,
}

impl CommandRunner for RecordingRunner {
    fn execute(&self, command: &str) -> Result<()> {
        self.log.borrow_mut().push(command.to_string());
        if self.fail {
            bail!("{command}: exited with status 1");
        }
        Ok(())
    }
}

/// Install environment with a fixed keytable hint.
pub struct FakeInstall {
    keytable: Option<String>,
    recorded: Rc<RefCell<Vec<String>>>,
}

impl InstallEnvironment for FakeInstall {
    fn keytable(&self) -> Option<String> {
        self.keytable.clone()
    }

    fn record_keytable(&mut self, console_keymap: &str) -> Result<()> {
        self.recorded.borrow_mut().push(console_keymap.to_string());
        Ok(())
    }
}

// ============================================================================
// Test rig
// ============================================================================

/// Builds sessions wired to in-memory collaborators and keeps handles to
/// their contents for assertions.
pub struct TestRig {
    /// Keyboard reported by the probe
    pub keyboard: ProbedKeyboard,
    /// Keys returned by manual probing
    pub attached: Vec<String>,
    /// Install environment keytable hint
    pub keytable: Option<String>,
    /// Make every command fail
    pub failing_commands: bool,
    /// Extra language→layout entries over [`sample_db`]
    pub languages: BTreeMap<String, String>,
    /// Sysconfig contents
    pub sysconfig: Rc<RefCell<SysconfigData>>,
    /// Device status contents
    pub devices: Rc<RefCell<BTreeMap<(String, DeviceAttribute), bool>>>,
    /// Commands executed
    pub commands: Rc<RefCell<Vec<String>>>,
    /// Keymaps recorded in the install environment
    pub recorded_keytables: Rc<RefCell<Vec<String>>>,
}

impl Default for TestRig {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRig {
    /// A rig with one attached keyboard and nothing saved.
    pub fn new() -> Self {
        Self {
            keyboard: ProbedKeyboard {
                unique_key: PROBED_KEY.to_string(),
                ..ProbedKeyboard::default()
            },
            attached: vec![PROBED_KEY.to_string()],
            keytable: None,
            failing_commands: false,
            languages: BTreeMap::new(),
            sysconfig: Rc::default(),
            devices: Rc::default(),
            commands: Rc::default(),
            recorded_keytables: Rc::default(),
        }
    }

    /// Pre-populates a flushed sysconfig value.
    pub fn with_saved(self, section: Section, key: &str, value: &str) -> Self {
        self.sysconfig
            .borrow_mut()
            .values
            .insert((section, key.to_string()), value.to_string());
        self
    }

    /// Sets the hardware model and X11 layout the probe reports.
    pub fn with_probed(mut self, model: &str, x11_layout: &str) -> Self {
        self.keyboard.model = model.to_string();
        self.keyboard.x11_layout = x11_layout.to_string();
        self
    }

    /// Adds a language→layout entry to the database.
    pub fn with_language(mut self, language: &str, layout: &str) -> Self {
        self.languages
            .insert(language.to_string(), layout.to_string());
        self
    }

    /// Sets the install environment keytable hint.
    pub fn with_keytable(mut self, keytable: &str) -> Self {
        self.keytable = Some(keytable.to_string());
        self
    }

    /// Fresh collaborators sharing this rig's storage.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            probe: Box::new(FakeProbe {
                keyboard: self.keyboard.clone(),
                attached: self.attached.clone(),
            }),
            translator: Box::new(FakeTranslator),
            sysconfig: Box::new(MemorySysconfig(Rc::clone(&self.sysconfig))),
            devices: Box::new(MemoryDevices(Rc::clone(&self.devices))),
            runner: Box::new(RecordingRunner {
                log: Rc::clone(&self.commands),
                fail: self.failing_commands,
            }),
            install: Box::new(FakeInstall {
                keytable: self.keytable.clone(),
                recorded: Rc::clone(&self.recorded_keytables),
            }),
        }
    }

    /// Creates a session without starting it.
    pub fn unstarted(&self, ctx: SessionContext) -> KeyboardSession {
        let catalog = DisplayCatalog::load().expect("embedded catalog");
        let db = sample_db().with_language_overrides(&self.languages);
        KeyboardSession::new(ctx, db, catalog, templates(), self.collaborators())
    }

    /// Creates and starts a session.
    pub fn session(&self, ctx: SessionContext) -> KeyboardSession {
        let mut session = self.unstarted(ctx);
        session.start().expect("session start");
        session
    }

    /// A flushed sysconfig value.
    pub fn saved(&self, section: Section, key: &str) -> Option<String> {
        self.sysconfig
            .borrow()
            .values
            .get(&(section, key.to_string()))
            .cloned()
    }

    /// Commands executed so far.
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    /// A device status flag.
    pub fn device(&self, key: &str, attribute: DeviceAttribute) -> Option<bool> {
        self.devices
            .borrow()
            .get(&(key.to_string(), attribute))
            .copied()
    }
}
