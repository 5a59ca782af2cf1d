//! Shell-style `KEY="value"` configuration files.
//!
//! Writes are buffered per section and only reach the disk on
//! [`SysconfigStore::flush`]. Flushing rewrites the file atomically
//! (temp file + rename), keeping unrelated lines and comments intact.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Section, SysconfigStore};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingWrite {
    Value { key: String, value: String },
    Comment { key: String, comment: String },
}

/// Sysconfig files below a target root.
#[derive(Debug, Clone)]
pub struct SysconfigFiles {
    root: PathBuf,
    pending: BTreeMap<Section, Vec<PendingWrite>>,
}

impl SysconfigFiles {
    /// Creates a store for the files below `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            pending: BTreeMap::new(),
        }
    }

    /// Absolute path of a section's file.
    #[must_use]
    pub fn path(&self, section: Section) -> PathBuf {
        self.root.join(section.relative_path())
    }

    fn read_lines(&self, section: Section) -> Result<Vec<String>> {
        let path = self.path(section);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

/// Splits an assignment line into key and unquoted value.
fn parse_assignment(line: &str) -> Option<(&str, String)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }

    let (key, raw) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some((key, unquote(raw.trim())))
}

fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    let inner = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    value
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn key_line(lines: &[String], key: &str) -> Option<usize> {
    lines
        .iter()
        .rposition(|line| parse_assignment(line).is_some_and(|(k, _)| k == key))
}

fn comment_lines(comment: &str) -> Vec<String> {
    comment
        .trim_end_matches('\n')
        .split('\n')
        .map(str::to_string)
        .collect()
}

fn apply_pending(lines: &mut Vec<String>, writes: &[PendingWrite]) {
    for write in writes {
        match write {
            PendingWrite::Value { key, value } => {
                let line = format!("{key}={}", quote(value));
                match key_line(lines, key) {
                    Some(idx) => lines[idx] = line,
                    None => lines.push(line),
                }
            }
            PendingWrite::Comment { key, comment } => {
                // Only added where the key has no comment directly above it.
                let position = key_line(lines, key).unwrap_or(lines.len());
                let commented = position > 0 && lines[position - 1].trim_start().starts_with('#');
                if !commented {
                    let block = comment_lines(comment);
                    lines.splice(position..position, block);
                }
            }
        }
    }
}

impl SysconfigStore for SysconfigFiles {
    fn exists(&self, section: Section) -> bool {
        self.path(section).exists()
    }

    fn read(&self, section: Section, key: &str, default: &str) -> Result<String> {
        let buffered = self.pending.get(&section).and_then(|writes| {
            writes.iter().rev().find_map(|write| match write {
                PendingWrite::Value { key: k, value } if k == key => Some(value.clone()),
                _ => None,
            })
        });
        if let Some(value) = buffered {
            return Ok(value);
        }

        let lines = self.read_lines(section)?;
        Ok(key_line(&lines, key)
            .and_then(|idx| parse_assignment(&lines[idx]).map(|(_, value)| value))
            .unwrap_or_else(|| default.to_string()))
    }

    fn write(&mut self, section: Section, key: &str, value: &str) {
        self.pending
            .entry(section)
            .or_default()
            .push(PendingWrite::Value {
                key: key.to_string(),
                value: value.to_string(),
            });
    }

    fn write_comment(&mut self, section: Section, key: &str, comment: &str) {
        self.pending
            .entry(section)
            .or_default()
            .push(PendingWrite::Comment {
                key: key.to_string(),
                comment: comment.to_string(),
            });
    }

    fn flush(&mut self, section: Section) -> Result<()> {
        let Some(writes) = self.pending.remove(&section) else {
            return Ok(());
        };

        let mut lines = self.read_lines(section)?;
        apply_pending(&mut lines, &writes);

        let path = self.path(section);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut content = lines.join("\n");
        content.push('\n');

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

        debug!("Flushed {} change(s) to {}", writes.len(), path.display());
        Ok(())
    }
}
