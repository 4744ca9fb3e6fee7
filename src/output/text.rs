use std::fmt::Write;

use crate::error::Result;

use super::{AuditReport, OutputFormatter, ReportEntry};

/// Color output mode for terminal display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Auto-detect: use colors if stdout is a TTY and `NO_COLOR` is not set
    #[default]
    Auto,
    Always,
    Never,
}

mod ansi {
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RESET: &str = "\x1b[0m";
}

pub struct TextFormatter {
    use_colors: bool,
    verbose: u8,
}

impl TextFormatter {
    #[must_use]
    pub fn new(mode: ColorMode) -> Self {
        Self::with_verbose(mode, 0)
    }

    /// With `verbose >= 1` passing checks are listed too.
    #[must_use]
    pub fn with_verbose(mode: ColorMode, verbose: u8) -> Self {
        Self {
            use_colors: Self::should_use_colors(mode),
            verbose,
        }
    }

    fn should_use_colors(mode: ColorMode) -> bool {
        match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                if std::env::var_os("NO_COLOR").is_some() {
                    return false;
                }
                std::io::IsTerminal::is_terminal(&std::io::stdout())
            }
        }
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{}", ansi::RESET)
        } else {
            text.to_string()
        }
    }

    fn format_entry(&self, entry: &ReportEntry, output: &mut String) {
        let (icon, color) = if entry.passed {
            ("✓", ansi::GREEN)
        } else {
            ("✗", ansi::RED)
        };
        let args = entry
            .args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            output,
            "{} {}({args})",
            self.paint(icon, color),
            entry.rule
        );
        if !entry.passed {
            let _ = writeln!(output, "   Outcome: {}", entry.outcome);
        }
    }

    fn format_summary(&self, report: &AuditReport) -> String {
        let verdict = if report.passed {
            self.paint("PASSED", ansi::GREEN)
        } else {
            self.paint("FAILED", ansi::RED)
        };
        let mut summary = format!(
            "Audit of {}: {verdict} ({} executed, {} failed",
            report.dir,
            report.results.len(),
            report.failed()
        );
        if report.skipped > 0 {
            let skipped = self.paint(&report.skipped.to_string(), ansi::YELLOW);
            let _ = write!(summary, ", {skipped} skipped");
        }
        summary.push(')');
        summary
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new(ColorMode::Auto)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &AuditReport) -> Result<String> {
        let mut output = String::new();
        for entry in &report.results {
            if entry.passed && self.verbose == 0 {
                continue;
            }
            self.format_entry(entry, &mut output);
        }
        output.push_str(&self.format_summary(report));
        output.push('\n');
        Ok(output)
    }
}

#[cfg(test)]
#[path = "text_tests.rs"]
mod tests;
