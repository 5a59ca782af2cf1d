//! Installer environment files (`install.inf`, `yast.inf`).
//!
//! Both are `Key: value` line files. `install.inf` is written by the boot
//! loader of the installer and carries the keytable chosen at boot plus the
//! way the installer is being accessed; `yast.inf` passes values on to later
//! installer stages.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::InstallEnvironment;
use crate::models::RemoteAccess;

/// Location of the boot-time install info relative to the root.
pub const INSTALL_INF_PATH: &str = "etc/install.inf";
/// Location of the writeback file relative to the root.
pub const YAST_INF_PATH: &str = "etc/yast.inf";

fn lookup<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        (k.trim() == key).then(|| v.trim())
    })
}

fn is_set(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "0")
}

/// Reader for `install.inf`, writer for `yast.inf`.
#[derive(Debug, Clone)]
pub struct InstallInfo {
    install_inf: PathBuf,
    yast_inf: PathBuf,
}

impl InstallInfo {
    /// Creates an accessor for the files below `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            install_inf: root.join(INSTALL_INF_PATH),
            yast_inf: root.join(YAST_INF_PATH),
        }
    }

    fn content(&self) -> String {
        fs::read_to_string(&self.install_inf).unwrap_or_default()
    }

    /// Reads one value; `None` when the file or key is missing.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        lookup(&self.content(), key).map(str::to_string)
    }

    /// Remote and text-mode flags of the installer session.
    #[must_use]
    pub fn remote_access(&self) -> RemoteAccess {
        let content = self.content();
        RemoteAccess {
            serial_console: is_set(lookup(&content, "Console")),
            vnc: is_set(lookup(&content, "VNC")),
            ssh: is_set(lookup(&content, "UseSSH")),
            text_mode: is_set(lookup(&content, "Textmode")),
        }
    }
}

impl InstallEnvironment for InstallInfo {
    fn keytable(&self) -> Option<String> {
        let keytable = self.value("Keytable").filter(|k| !k.is_empty());
        debug!("Keytable from install.inf: {:?}", keytable);
        keytable
    }

    fn record_keytable(&mut self, console_keymap: &str) -> Result<()> {
        let existing = if self.yast_inf.exists() {
            fs::read_to_string(&self.yast_inf)
                .with_context(|| format!("Failed to read {}", self.yast_inf.display()))?
        } else {
            String::new()
        };

        let entry = format!("Keytable: {console_keymap}");
        let mut replaced = false;
        let mut lines: Vec<String> = existing
            .lines()
            .map(|line| match line.split_once(':') {
                Some((key, _)) if key.trim() == "Keytable" => {
                    replaced = true;
                    entry.clone()
                }
                _ => line.to_string(),
            })
            .collect();
        if !replaced {
            lines.push(entry);
        }

        if let Some(parent) = self.yast_inf.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&self.yast_inf, content)
            .with_context(|| format!("Failed to write {}", self.yast_inf.display()))?;

        info!("Keytable {} recorded in {}", console_keymap, self.yast_inf.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_install_inf(content: &str) -> (TempDir, InstallInfo) {
        let temp_dir = TempDir::new().unwrap();
        let etc = temp_dir.path().join("etc");
        fs::create_dir_all(&etc).unwrap();
        fs::write(etc.join("install.inf"), content).unwrap();
        let info = InstallInfo::new(temp_dir.path());
        (temp_dir, info)
    }

    #[test]
    fn test_keytable_and_remote_flags() {
        let (_dir, info) = with_install_inf("Keytable: de-lat1-nd\nVNC: 1\nUseSSH: 0\nTextmode: \n");
        assert_eq!(info.keytable().as_deref(), Some("de-lat1-nd"));

        let remote = info.remote_access();
        assert!(remote.vnc);
        assert!(!remote.ssh);
        assert!(!remote.text_mode);
        assert!(!remote.serial_console);
    }

    #[test]
    fn test_missing_file_has_no_hints() {
        let temp_dir = TempDir::new().unwrap();
        let info = InstallInfo::new(temp_dir.path());
        assert!(info.keytable().is_none());
        assert!(!info.remote_access().any());
    }

    #[test]
    fn test_record_keytable_replaces_existing_entry() {
        let (dir, mut info) = with_install_inf("");
        fs::write(dir.path().join(YAST_INF_PATH), "Language: de_DE\nKeytable: us\n").unwrap();

        info.record_keytable("de-latin1-nodeadkeys.map.gz").unwrap();

        let content = fs::read_to_string(dir.path().join(YAST_INF_PATH)).unwrap();
        assert_eq!(content, "Language: de_DE\nKeytable: de-latin1-nodeadkeys.map.gz\n");
    }

    #[test]
    fn test_record_keytable_appends_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let mut info = InstallInfo::new(temp_dir.path());
        info.record_keytable("us.map.gz").unwrap();

        let content = fs::read_to_string(temp_dir.path().join(YAST_INF_PATH)).unwrap();
        assert_eq!(content, "Keytable: us.map.gz\n");
    }
}
