//! Output formatting for dependency check results.

use crate::doctor::{DependencyStatus, ToolStatus};
use serde::Serialize;
use std::fmt::Write;

/// Output format for doctor results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output
    Terminal,
    /// Machine-readable JSON output
    Json,
}

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonOutput {
    status: &'static str,
    passed: usize,
    failed: usize,
    unknown: usize,
    dependencies: Vec<JsonDependency>,
}

#[derive(Debug, Serialize)]
struct JsonDependency {
    name: String,
    status: &'static str,
    message: String,
}

/// Formatter for dependency check results.
pub struct DoctorFormatter {
    format: OutputFormat,
}

const fn status_name(status: ToolStatus) -> &'static str {
    match status {
        ToolStatus::Available => "available",
        ToolStatus::Missing => "missing",
        ToolStatus::Unknown => "unknown",
    }
}

impl DoctorFormatter {
    /// Creates a new formatter with the given output format.
    #[must_use]
    pub const fn with_format(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats dependency check results.
    #[must_use]
    pub fn format_results(&self, statuses: &[DependencyStatus]) -> String {
        match self.format {
            OutputFormat::Terminal => Self::format_terminal(statuses),
            OutputFormat::Json => Self::format_json(statuses),
        }
    }

    fn count(statuses: &[DependencyStatus], status: ToolStatus) -> usize {
        statuses.iter().filter(|s| s.status == status).count()
    }

    fn format_terminal(statuses: &[DependencyStatus]) -> String {
        let mut output = String::new();

        output.push_str("Keyboard Setup Environment Status\n");
        output.push_str("═════════════════════════════════\n\n");

        for status in statuses {
            let (symbol, status_text) = match status.status {
                ToolStatus::Available => ("✓", "OK"),
                ToolStatus::Missing => ("✗", "MISSING"),
                ToolStatus::Unknown => ("⚠", "UNKNOWN"),
            };

            // ✓ loadkeys ............ OK
            let name_width: usize = 20;
            let dots = ".".repeat(name_width.saturating_sub(status.name.len()));
            let _ = writeln!(output, "{} {}{} {}", symbol, status.name, dots, status_text);
            let _ = writeln!(output, "    {}", status.message);
        }

        let passed = Self::count(statuses, ToolStatus::Available);
        let failed = Self::count(statuses, ToolStatus::Missing);
        let unknown = Self::count(statuses, ToolStatus::Unknown);

        output.push_str("\n─────────────────────────────────\n");
        let _ = write!(output, "Summary: {passed} passed");
        if failed > 0 {
            let _ = write!(output, ", {failed} failed");
        }
        if unknown > 0 {
            let _ = write!(output, ", {unknown} unknown");
        }
        output.push('\n');

        output
    }

    fn format_json(statuses: &[DependencyStatus]) -> String {
        let failed = Self::count(statuses, ToolStatus::Missing);
        let unknown = Self::count(statuses, ToolStatus::Unknown);

        let json_output = JsonOutput {
            status: if failed > 0 {
                "missing_dependencies"
            } else if unknown > 0 {
                "warnings"
            } else {
                "ready"
            },
            passed: Self::count(statuses, ToolStatus::Available),
            failed,
            unknown,
            dependencies: statuses
                .iter()
                .map(|s| JsonDependency {
                    name: s.name.clone(),
                    status: status_name(s.status),
                    message: s.message.clone(),
                })
                .collect(),
        };

        serde_json::to_string_pretty(&json_output).unwrap_or_else(|_| {
            r#"{"status":"error","message":"Failed to serialize JSON output"}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses() -> Vec<DependencyStatus> {
        vec![
            DependencyStatus::available("loadkeys", "Found at /bin/loadkeys"),
            DependencyStatus::missing("xkbctrl", "Not found at /usr/sbin/xkbctrl"),
        ]
    }

    #[test]
    fn test_terminal_output() {
        let output = DoctorFormatter::with_format(OutputFormat::Terminal).format_results(&statuses());
        assert!(output.contains("✓ loadkeys"));
        assert!(output.contains("✗ xkbctrl"));
        assert!(output.contains("Summary: 1 passed, 1 failed"));
    }

    #[test]
    fn test_json_output() {
        let output = DoctorFormatter::with_format(OutputFormat::Json).format_results(&statuses());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "missing_dependencies");
        assert_eq!(value["passed"], 1);
        assert_eq!(value["dependencies"][1]["status"], "missing");
    }
}
