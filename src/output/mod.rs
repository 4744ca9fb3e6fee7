//! Reports for a settled audit.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::{ColorMode, TextFormatter};

use serde::Serialize;
use serde_json::Value;

use crate::auditor::{Auditor, CheckResult};
use crate::error::Result;
use crate::rules::RuleArg;

/// Trait for formatting an audit report into various output formats.
pub trait OutputFormatter {
    /// Format the report into a string.
    ///
    /// # Errors
    /// Returns an error if the formatting fails.
    fn format(&self, report: &AuditReport) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

/// One executed check as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Rule name, `refute.`-prefixed when negated.
    pub rule: String,
    pub args: Vec<Value>,
    pub outcome: Value,
    pub passed: bool,
}

impl From<&CheckResult> for ReportEntry {
    fn from(result: &CheckResult) -> Self {
        Self {
            rule: result.display_name(),
            args: result.args.iter().map(RuleArg::to_json).collect(),
            outcome: result.outcome.clone(),
            passed: result.passed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub dir: String,
    pub passed: bool,
    pub results: Vec<ReportEntry>,
    /// Queued checks never run because an earlier one failed.
    pub skipped: usize,
}

impl AuditReport {
    /// Snapshot of an auditor after `evaluate()`.
    #[must_use]
    pub fn from_auditor(auditor: &Auditor) -> Self {
        Self {
            dir: auditor.dir().to_string(),
            passed: auditor.is_match(),
            results: auditor.results().iter().map(ReportEntry::from).collect(),
            skipped: auditor.skipped(),
        }
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
