//! End-to-end tests for the `kbdsetup` command line.
//!
//! Every command runs against a temporary target root with `--dry-run`, so
//! nothing is loaded into the running console or X server, and with an
//! isolated configuration directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the kbdsetup binary
fn kbdsetup_bin() -> &'static str {
    env!("CARGO_BIN_EXE_kbdsetup")
}

/// Isolated config directory and target root.
struct TestEnv {
    config_dir: TempDir,
    root: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            root: TempDir::new().unwrap(),
        }
    }

    fn command(&self, language: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(kbdsetup_bin());
        cmd.env("KBDSETUP_CONFIG_DIR", self.config_dir.path())
            .env_remove("RUST_LOG")
            .env_remove("DISPLAY")
            .arg("--root")
            .arg(self.root.path())
            .arg("--language")
            .arg(language)
            .arg("--dry-run")
            .args(args);
        cmd
    }

    fn run(&self, language: &str, args: &[&str]) -> Output {
        self.command(language, args)
            .output()
            .expect("Failed to execute command")
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.path().join(relative)).unwrap_or_default()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output) {
    assert_eq!(
        output.status.code(),
        Some(0),
        "Command should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn write_target_layout(root: &Path, value: &str) {
    let sysconfig = root.join("etc/sysconfig");
    fs::create_dir_all(&sysconfig).unwrap();
    fs::write(
        sysconfig.join("keyboard"),
        format!("YAST_KEYBOARD=\"{value}\"\n"),
    )
    .unwrap();
}

// ============================================================================
// Show and list
// ============================================================================

#[test]
fn test_show_json_first_run() {
    let env = TestEnv::new();
    let output = env.run("de_DE", &["show", "--json"]);
    assert_success(&output);

    let result: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("Should parse JSON output");
    assert_eq!(result["layout"], "german");
    assert_eq!(result["name"], "Deutsch");
    assert_eq!(result["model"], "pc104");
    assert_eq!(result["console_keymap"], "de-latin1-nodeadkeys.map.gz");
    assert_eq!(result["modified"], false);
}

#[test]
fn test_show_human_readable() {
    let env = TestEnv::new();
    let output = env.run("en_US", &["show"]);
    assert_success(&output);

    let text = stdout(&output);
    assert!(text.contains("Current Keyboard Layout: English (US)"));
    assert!(text.contains("us.map.gz"));
}

#[test]
fn test_list_json() {
    let env = TestEnv::new();
    let output = env.run("en_US", &["list", "--json"]);
    assert_success(&output);

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let entries = result.as_array().expect("Should be an array");
    assert!(entries
        .iter()
        .any(|e| e["id"] == "german" && e["name"] == "German"));
    assert!(entries.iter().any(|e| e["id"] == "english-us"));
}

// ============================================================================
// Set
// ============================================================================

#[test]
fn test_set_writes_configuration() {
    let env = TestEnv::new();
    let output = env.run("en_US", &["set", "german"]);
    assert_success(&output);

    let text = stdout(&output);
    assert!(text.contains("Current Keyboard Layout: German"));
    assert!(
        text.contains("skipped: /bin/loadkeys de-latin1-nodeadkeys.map.gz"),
        "dry run should report the skipped loadkeys call: {text}"
    );

    assert!(env
        .read("etc/sysconfig/keyboard")
        .contains("YAST_KEYBOARD=\"german,pc104\""));
    let vconsole = env.read("etc/vconsole.conf");
    assert!(vconsole.contains("KEYMAP=\"de-latin1-nodeadkeys\""));
    assert!(vconsole.contains("KBD_DISABLE_CAPS_LOCK=\"\""));
}

#[test]
fn test_set_is_restored_by_next_run() {
    let env = TestEnv::new();
    assert_success(&env.run("en_US", &["set", "french"]));

    let output = env.run("de_DE", &["show", "--json"]);
    assert_success(&output);
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["layout"], "french");
    assert_eq!(result["name"], "Französisch");
}

#[test]
fn test_set_no_save() {
    let env = TestEnv::new();
    assert_success(&env.run("en_US", &["set", "german", "--no-save"]));
    assert!(!env.root.path().join("etc/sysconfig/keyboard").exists());
}

#[test]
fn test_set_unknown_layout_fails() {
    let env = TestEnv::new();
    let output = env.run("en_US", &["set", "klingon"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown layout 'klingon'"));
    assert!(!env.root.path().join("etc/sysconfig/keyboard").exists());
}

// ============================================================================
// Propose and probe
// ============================================================================

#[test]
fn test_propose_follows_language_change() {
    let env = TestEnv::new();
    assert_success(&env.run("de_DE", &["set", "german"]));

    let output = env.run("fr_FR", &["propose", "--language-changed"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Français"));
    assert!(env
        .read("etc/sysconfig/keyboard")
        .contains("YAST_KEYBOARD=\"french,pc104\""));
}

#[test]
fn test_probe_without_save() {
    let env = TestEnv::new();
    let output = env.run("de_DE", &["probe", "--no-save"]);
    assert_success(&output);

    let text = stdout(&output);
    assert!(text.contains("Model:    pc104"));
    assert!(text.contains("german"));
    assert!(!env.root.path().join("etc/vconsole.conf").exists());
}

// ============================================================================
// Expert settings
// ============================================================================

#[test]
fn test_expert_set_and_show() {
    let env = TestEnv::new();
    let output = env.run("en_US", &["expert", "set", "--rate", "20", "--discaps", "true"]);
    assert_success(&output);

    let vconsole = env.read("etc/vconsole.conf");
    assert!(vconsole.contains("KBD_RATE=\"20\""));
    assert!(vconsole.contains("KBD_DISABLE_CAPS_LOCK=\"yes\""));

    let output = env.run("en_US", &["expert", "show", "--json"]);
    assert_success(&output);
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["rate"], "20");
    assert_eq!(result["discaps"], true);
}

#[test]
fn test_expert_set_requires_option() {
    let env = TestEnv::new();
    assert_eq!(env.run("en_US", &["expert", "set"]).status.code(), Some(1));
}

#[test]
fn test_expert_set_rejects_bad_numlock() {
    let env = TestEnv::new();
    let output = env.run("en_US", &["expert", "set", "--numlock", "maybe"]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// Export and import
// ============================================================================

#[test]
fn test_export_to_file() {
    let env = TestEnv::new();
    let out_dir = TempDir::new().unwrap();
    let out_file = out_dir.path().join("keyboard.json");

    let output = env.run(
        "de_DE",
        &["export", "--output", out_file.to_str().unwrap()],
    );
    assert_success(&output);

    let profile: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_file).unwrap()).unwrap();
    assert_eq!(profile, serde_json::json!({ "keymap": "german" }));
}

#[test]
fn test_import_profile() {
    let env = TestEnv::new();
    let dir = TempDir::new().unwrap();
    let profile = dir.path().join("profile.json");
    fs::write(
        &profile,
        r#"{"keymap":"french","keyboard_values":{"delay":"250"}}"#,
    )
    .unwrap();

    let output = env.run("en_US", &["import", profile.to_str().unwrap()]);
    assert_success(&output);

    assert!(env
        .read("etc/sysconfig/keyboard")
        .contains("YAST_KEYBOARD=\"french,pc104\""));
    assert!(env.read("etc/vconsole.conf").contains("KBD_DELAY=\"250\""));
}

#[test]
fn test_import_errors() {
    let env = TestEnv::new();
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.json");
    let output = env.run("en_US", &["import", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2), "missing file is an I/O error");

    let invalid = dir.path().join("invalid.json");
    fs::write(&invalid, "{ not json").unwrap();
    let output = env.run("en_US", &["import", invalid.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1), "invalid JSON is a validation error");

    let unknown = dir.path().join("unknown.json");
    fs::write(&unknown, r#"{"keymap":"klingon"}"#).unwrap();
    let output = env.run("en_US", &["import", unknown.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// Update check
// ============================================================================

#[test]
fn test_update_check_offers_and_adopts_target_layout() {
    let env = TestEnv::new();
    let target = TempDir::new().unwrap();
    write_target_layout(target.path(), "french,pc104");

    let output = env.run("de_DE", &["update-check", target.path().to_str().unwrap()]);
    assert_success(&output);
    assert!(stdout(&output).contains("System being updated uses french"));

    let output = env.run(
        "de_DE",
        &["update-check", target.path().to_str().unwrap(), "--adopt"],
    );
    assert_success(&output);
    assert!(env
        .read("etc/sysconfig/keyboard")
        .contains("YAST_KEYBOARD=\"french,pc104\""));
}

#[test]
fn test_update_check_matching_layout() {
    let env = TestEnv::new();
    let target = TempDir::new().unwrap();
    write_target_layout(target.path(), "german,pc104");

    let output = env.run("de_DE", &["update-check", target.path().to_str().unwrap()]);
    assert_success(&output);
    assert!(stdout(&output).contains("matches"));
}

#[test]
fn test_update_check_missing_directory() {
    let env = TestEnv::new();
    let output = env.run("de_DE", &["update-check", "/nonexistent/kbdsetup/target"]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// Configuration and global options
// ============================================================================

#[test]
fn test_config_set_and_show() {
    let env = TestEnv::new();
    let root = env.root.path().to_str().unwrap();

    let output = Command::new(kbdsetup_bin())
        .env("KBDSETUP_CONFIG_DIR", env.config_dir.path())
        .args(["config", "set", "--root", root, "--language", "de_CH", "--mode", "update"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(env.config_dir.path().join("config.toml").exists());

    let output = Command::new(kbdsetup_bin())
        .env("KBDSETUP_CONFIG_DIR", env.config_dir.path())
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert_success(&output);

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["paths"]["root"], root);
    assert_eq!(result["session"]["language"], "de_CH");
    assert_eq!(result["session"]["mode"], "update");
}

#[test]
fn test_config_set_validation() {
    let env = TestEnv::new();

    let output = Command::new(kbdsetup_bin())
        .env("KBDSETUP_CONFIG_DIR", env.config_dir.path())
        .args(["config", "set"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let output = Command::new(kbdsetup_bin())
        .env("KBDSETUP_CONFIG_DIR", env.config_dir.path())
        .args(["config", "set", "--root", "/nonexistent/kbdsetup/root"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(!env.config_dir.path().join("config.toml").exists());
}

#[test]
fn test_invalid_root_is_rejected() {
    let env = TestEnv::new();
    let output = Command::new(kbdsetup_bin())
        .env("KBDSETUP_CONFIG_DIR", env.config_dir.path())
        .args(["--root", "/nonexistent/kbdsetup/root", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_doctor_json() {
    let env = TestEnv::new();
    let output = env.run("en_US", &["doctor", "--json"]);

    // Tool availability depends on the host; the report itself must be valid
    assert!(matches!(output.status.code(), Some(0 | 1)));
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = result["dependencies"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec!["loadkeys", "setxkbmap", "xkbctrl", "Keyboard database", "Saved layout"]
    );
}
