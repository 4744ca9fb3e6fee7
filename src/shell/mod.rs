//! Shell capability consumed by the rules.
//!
//! Rules never spawn processes or touch the active directory themselves; they go
//! through [`Shell`], which keeps them testable with a recording stub.

mod real;

#[cfg(test)]
pub(crate) mod stub;

pub use real::RealShell;

use serde_json::Value;

use crate::error::Result;

/// Exit code and matching lines of a `grep -l` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrepOutput {
    pub code: i32,
    /// Output lines, only populated when grep exited with 0.
    pub matches: Vec<String>,
}

impl GrepOutput {
    /// Build from an `exec` result object (`{code, output}`).
    #[must_use]
    pub fn from_exec(result: &Value) -> Self {
        let code = result
            .get("code")
            .and_then(Value::as_i64)
            .and_then(|c| i32::try_from(c).ok())
            .unwrap_or(0);
        let matches = if code == 0 {
            result
                .get("output")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .lines()
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        } else {
            Vec::new()
        };
        Self { code, matches }
    }

    /// grep reports 1 for "no match" and 2 for errors; anything above counts as found.
    #[must_use]
    pub fn found(&self) -> bool {
        self.code > 2 || !self.matches.is_empty()
    }
}

pub trait Shell {
    /// Generic passthrough, e.g. `["test", "-f", "/tmp/x/a.txt"]` or `["cd", "/tmp/x"]`.
    ///
    /// # Errors
    /// Returns an error for unsupported commands or when a process cannot be spawned.
    fn raw(&mut self, args: &[Value]) -> Result<Value>;

    /// Invoke a named helper method, e.g. `find_by_regex`.
    ///
    /// # Errors
    /// Returns an error for unknown methods or failed invocations.
    fn named(&mut self, method: &str, args: &[Value]) -> Result<Value>;

    /// Run `grep -l` through `exec`. A leading `-x` argument is merged into the flags.
    ///
    /// # Errors
    /// Propagates errors from [`Shell::raw`].
    fn grep(&mut self, args: &[String]) -> Result<GrepOutput> {
        let result = self.raw(&[Value::from("exec"), Value::from(grep_command(args))])?;
        Ok(GrepOutput::from_exec(&result))
    }
}

/// Render `grep <flags>l "<pattern>" <files..>` from grep-style arguments.
#[must_use]
pub fn grep_command(args: &[String]) -> String {
    let (flags, rest) = match args.split_first() {
        Some((first, rest)) if first.starts_with('-') => (format!("{first}l"), rest),
        _ => ("-l".to_string(), args),
    };

    let mut parts = vec!["grep".to_string(), flags];
    if let Some((pattern, files)) = rest.split_first() {
        parts.push(format!("\"{}\"", escape_double_quoted(pattern)));
        parts.extend(files.iter().cloned());
    }
    parts.join(" ")
}

/// Backslash-escape the characters `sh` still interprets inside double quotes.
fn escape_double_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Add an invert-match flag: `-r` becomes `-rv`, otherwise a separate `-v` is prepended.
#[must_use]
pub fn invert_grep_args(mut args: Vec<String>) -> Vec<String> {
    match args.first_mut() {
        Some(first) if first.starts_with('-') => first.push('v'),
        _ => args.insert(0, "-v".to_string()),
    }
    args
}

/// String form of a shell argument: strings verbatim, anything else as JSON.
#[must_use]
pub fn arg_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
