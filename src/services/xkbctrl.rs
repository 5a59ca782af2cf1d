//! X11 keymap translation through the `xkbctrl` helper.
//!
//! `xkbctrl <keymap>` prints a map of X11 keyboard fields for a console
//! keymap:
//!
//! ```text
//! $[
//!  "XkbLayout" : "de",
//!  "XkbModel"  : "pc104",
//!  "Apply"     : "-layout de -model pc104",
//! ]
//! ```

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::{info, warn};

use super::X11Translator;

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""([A-Za-z]+)"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid field pattern")
    })
}

/// Parses `"Key" : "value"` pairs out of `xkbctrl` output.
#[must_use]
pub fn parse_xkbctrl_output(output: &str) -> BTreeMap<String, String> {
    field_pattern()
        .captures_iter(output)
        .map(|caps| (caps[1].to_string(), caps[2].replace("\\\"", "\"")))
        .collect()
}

/// Runs the `xkbctrl` binary to translate console keymaps.
#[derive(Debug, Clone)]
pub struct XkbctrlTranslator {
    binary: PathBuf,
}

impl XkbctrlTranslator {
    /// Creates a translator using the given `xkbctrl` binary.
    #[must_use]
    pub fn new(binary: &Path) -> Self {
        Self {
            binary: binary.to_path_buf(),
        }
    }
}

impl X11Translator for XkbctrlTranslator {
    fn translate(&self, console_keymap: &str) -> Option<BTreeMap<String, String>> {
        if !self.binary.is_file() {
            warn!("{} not found", self.binary.display());
            return None;
        }

        let output = match Command::new(&self.binary).arg(console_keymap).output() {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run {}: {}", self.binary.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            warn!(
                "{} {} failed: {}",
                self.binary.display(),
                console_keymap,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let fields = parse_xkbctrl_output(&String::from_utf8_lossy(&output.stdout));
        info!("x11data={:?}", fields);
        (!fields.is_empty()).then_some(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xkbctrl_output() {
        let output = r#"$[
 "XkbLayout"     : "de",
 "XkbModel"      : "pc105",
 "XkbVariant"    : "nodeadkeys",
 "XkbOptions"    : "",
 "Apply"         : "-layout de -model pc105 -variant nodeadkeys",
]"#;
        let fields = parse_xkbctrl_output(output);
        assert_eq!(fields.len(), 5);
        assert_eq!(fields["XkbLayout"], "de");
        assert_eq!(fields["XkbModel"], "pc105");
        assert_eq!(fields["XkbOptions"], "");
        assert_eq!(fields["Apply"], "-layout de -model pc105 -variant nodeadkeys");
    }

    #[test]
    fn test_parse_garbage_yields_nothing() {
        assert!(parse_xkbctrl_output("command not found").is_empty());
    }

    #[test]
    fn test_missing_binary_translates_to_nothing() {
        let translator = XkbctrlTranslator::new(Path::new("/this/path/does/not/exist/xkbctrl"));
        assert!(translator.translate("us.map.gz").is_none());
    }
}
