//! Reading and writing the keyboard configuration of the target system.
//!
//! The persisted record is split over two sections: the keyboard section
//! holds `YAST_KEYBOARD="layout,model"`, the vconsole section holds the
//! console keymap, the compose table and the expert values.

use anyhow::Result;
use std::collections::BTreeSet;
use tracing::info;

use crate::constants::{DEFAULT_HARDWARE_MODEL, LAYOUT_ID_COMMENT, LAYOUT_ID_KEY};
use crate::keyboard_db::KeyboardDb;
use crate::models::{DeviceAttribute, ExpertSettings};
use crate::services::{DeviceStatusStore, Section, SysconfigStore, X11Translator};
use crate::state::ConfigurationState;

/// Console keymap key in the vconsole section.
pub const KEYMAP_KEY: &str = "KEYMAP";
/// Obsolete keymap key in the keyboard section.
pub const OBSOLETE_KEYTABLE_KEY: &str = "KEYTABLE";
/// Compose table key in the vconsole section.
pub const COMPOSETABLE_KEY: &str = "COMPOSETABLE";
/// Repeat rate key in the vconsole section.
pub const RATE_KEY: &str = "KBD_RATE";
/// Repeat delay key in the vconsole section.
pub const DELAY_KEY: &str = "KBD_DELAY";
/// Numlock key in the vconsole section.
pub const NUMLOCK_KEY: &str = "KBD_NUMLOCK";
/// Caps lock key in the vconsole section.
pub const DISABLE_CAPS_LOCK_KEY: &str = "KBD_DISABLE_CAPS_LOCK";

/// Reads the expert values, keeping `current` for anything not stored.
pub fn read_expert_settings(
    store: &dyn SysconfigStore,
    current: &ExpertSettings,
) -> Result<ExpertSettings> {
    let mut settings = current.clone();

    if store.exists(Section::Vconsole) {
        settings.rate = store.read(Section::Vconsole, RATE_KEY, &current.rate)?;
        settings.delay = store.read(Section::Vconsole, DELAY_KEY, &current.delay)?;
        settings.numlock = store.read(Section::Vconsole, NUMLOCK_KEY, &current.numlock)?;
        settings.disable_caps_lock = store.read(
            Section::Vconsole,
            DISABLE_CAPS_LOCK_KEY,
            &current.disable_caps_lock,
        )?;
    }

    info!(
        "rate:{} delay:{} numlock:{} disclock:{}",
        settings.rate,
        settings.delay,
        settings.numlock,
        settings.disable_caps_lock
    );
    Ok(settings)
}

/// Splits `layout,model`. The model is only split off when the comma is not
/// the first character.
#[must_use]
pub fn split_layout_id(value: &str) -> (String, Option<String>) {
    match value.find(',') {
        Some(pos) if pos > 0 => (value[..pos].to_string(), Some(value[pos + 1..].to_string())),
        _ => (value.to_string(), None),
    }
}

/// Reads the persisted layout identifier and hardware model.
pub fn read_layout_id(store: &dyn SysconfigStore) -> Result<(String, Option<String>)> {
    let value = store.read(Section::Keyboard, LAYOUT_ID_KEY, "")?;
    Ok(split_layout_id(&value))
}

/// Console keymap as written to vconsole.conf (without `.map.gz`).
#[must_use]
pub fn keymap_setting(console_keymap: &str) -> &str {
    console_keymap
        .strip_suffix(".map.gz")
        .unwrap_or(console_keymap)
}

/// Writes the full state.
pub fn write_state(store: &mut dyn SysconfigStore, state: &ConfigurationState) -> Result<()> {
    store.write(Section::Keyboard, LAYOUT_ID_KEY, &state.persisted_id());
    store.write_comment(Section::Keyboard, LAYOUT_ID_KEY, LAYOUT_ID_COMMENT);
    store.flush(Section::Keyboard)?;

    store.write(
        Section::Vconsole,
        KEYMAP_KEY,
        keymap_setting(&state.console_keymap),
    );
    store.write(Section::Vconsole, COMPOSETABLE_KEY, &state.compose_table);
    store.write(Section::Vconsole, RATE_KEY, &state.expert.rate);
    store.write(Section::Vconsole, DELAY_KEY, &state.expert.delay);
    store.write(Section::Vconsole, NUMLOCK_KEY, &state.expert.numlock);
    store.write(
        Section::Vconsole,
        DISABLE_CAPS_LOCK_KEY,
        &state.expert.disable_caps_lock,
    );
    store.flush(Section::Vconsole)?;

    Ok(())
}

/// Fills in a missing layout identifier on a system being updated.
///
/// The identifier is derived from the stored console keymap (`KEYMAP`, or
/// the obsolete `KEYTABLE`) through the X11 translator. Returns the value
/// written, if any.
pub fn backfill_layout_id(
    store: &mut dyn SysconfigStore,
    translator: &dyn X11Translator,
    db: &KeyboardDb,
) -> Result<Option<String>> {
    let existing = store.read(Section::Keyboard, LAYOUT_ID_KEY, "")?;
    if !existing.is_empty() {
        return Ok(None);
    }

    let mut keymap = store.read(Section::Vconsole, KEYMAP_KEY, "")?;
    if keymap.is_empty() {
        keymap = store.read(Section::Keyboard, OBSOLETE_KEYTABLE_KEY, "")?;
    }
    if keymap.is_empty() {
        return Ok(None);
    }

    let Some(data) = translator.translate(&keymap) else {
        return Ok(None);
    };
    let Some(x11_layout) = data.get("XkbLayout").filter(|l| !l.is_empty()) else {
        return Ok(None);
    };

    let value = format!(
        "{},{}",
        db.translate_x11_layout_to_layout(x11_layout).unwrap_or_default(),
        data.get("XkbModel")
            .map_or(DEFAULT_HARDWARE_MODEL, String::as_str)
    );
    store.write(Section::Keyboard, LAYOUT_ID_KEY, &value);
    store.write_comment(Section::Keyboard, LAYOUT_ID_KEY, LAYOUT_ID_COMMENT);
    store.flush(Section::Keyboard)?;

    info!("Backfilled {} from keymap {}: {}", LAYOUT_ID_KEY, keymap, value);
    Ok(Some(value))
}

/// Marks the configured keyboard and unmarks every other known device.
///
/// `probed` are the keys seen by manual probing; keys already recorded in
/// the store are unmarked too, so that unplugged keyboards are covered.
pub fn mark_devices(
    devices: &mut dyn DeviceStatusStore,
    probed: &[String],
    unique_key: &str,
    serial_console: bool,
) -> Result<()> {
    let keys: BTreeSet<String> = probed
        .iter()
        .cloned()
        .chain(devices.known_devices())
        .filter(|key| !key.is_empty())
        .collect();

    if keys.is_empty() {
        info!("No probed keyboards. Not unconfiguring any keyboards");
    }

    for key in &keys {
        if key == unique_key {
            info!("Skipping active key <{}> --> to be configured", key);
            continue;
        }
        devices.mark(key, DeviceAttribute::Configured, false)?;
        devices.mark(key, DeviceAttribute::Needed, false)?;
    }

    if unique_key.is_empty() {
        info!("NOT marking keyboard as configured (no unique_key)");
    } else {
        devices.mark(unique_key, DeviceAttribute::Configured, true)?;
        if !serial_console {
            devices.mark(unique_key, DeviceAttribute::Needed, true)?;
        }
    }

    Ok(())
}
