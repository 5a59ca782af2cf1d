//! Persistent configured/needed flags per keyboard device.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::DeviceStatusStore;
use crate::models::DeviceAttribute;

/// Location of the store relative to the target root.
pub const DEVICE_STATUS_PATH: &str = "var/lib/kbdsetup/devices.json";

/// Flags recorded for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Device has been configured
    #[serde(default)]
    pub configured: bool,
    /// Device is needed by the system
    #[serde(default)]
    pub needed: bool,
}

/// JSON-backed device status store.
#[derive(Debug, Clone)]
pub struct DeviceStatusFile {
    path: PathBuf,
}

impl DeviceStatusFile {
    /// Creates a store at `<root>/var/lib/kbdsetup/devices.json`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(DEVICE_STATUS_PATH),
        }
    }

    /// Loads every record; a missing file is an empty store.
    pub fn load(&self) -> Result<BTreeMap<String, DeviceStatus>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read device status: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse device status: {}", self.path.display()))
    }

    fn save(&self, records: &BTreeMap<String, DeviceStatus>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(records).context("Failed to serialize device status")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename temp file to: {}", self.path.display()))?;

        Ok(())
    }
}

impl DeviceStatusStore for DeviceStatusFile {
    fn mark(&mut self, unique_key: &str, attribute: DeviceAttribute, value: bool) -> Result<()> {
        let mut records = self.load()?;
        let record = records.entry(unique_key.to_string()).or_default();
        match attribute {
            DeviceAttribute::Configured => record.configured = value,
            DeviceAttribute::Needed => record.needed = value,
        }
        info!(
            "Marked {} {}={}",
            unique_key,
            attribute,
            if value { "yes" } else { "no" }
        );
        self.save(&records)
    }

    fn known_devices(&self) -> Vec<String> {
        self.load()
            .map(|records| records.into_keys().collect())
            .unwrap_or_default()
    }
}
