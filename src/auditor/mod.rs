//! The auditor: queues named checks, evaluates them lazily with short-circuiting,
//! and records what ran.
//!
//! ```no_run
//! use audit_fs::Auditor;
//!
//! let mut audit = Auditor::new();
//! audit.set("dir", "/srv/site");
//! let passed = audit
//!     .has_file("index.html")
//!     .has_dir("assets")
//!     .not()
//!     .exists("debug.log")
//!     .evaluate()?;
//! # Ok::<(), audit_fs::AuditError>(())
//! ```

mod chain;

pub use chain::Negated;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{AuditError, Result};
use crate::probe::{FileSystem, RealFileSystem};
use crate::rules::{self, Rule, RuleArg, RuleRegistry, is_truthy};
use crate::shell::{RealShell, Shell};

/// Settings key holding the target directory.
pub const DIR_KEY: &str = "dir";

/// Lifecycle of one auditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditState {
    /// Checks are being queued.
    #[default]
    Pending,
    Evaluating,
    /// `evaluate()` finished; match flag and log are final.
    Settled,
}

/// What a rule sees while it runs: settings, the shell, and the filesystem.
pub struct AuditContext {
    settings: IndexMap<String, String>,
    shell: Box<dyn Shell>,
    fs: Box<dyn FileSystem>,
}

impl AuditContext {
    pub(crate) fn new(dir: String, shell: Box<dyn Shell>, fs: Box<dyn FileSystem>) -> Self {
        let mut settings = IndexMap::new();
        settings.insert(DIR_KEY.to_string(), dir);
        Self {
            settings,
            shell,
            fs,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// The configured target directory.
    #[must_use]
    pub fn dir(&self) -> &str {
        self.get(DIR_KEY).unwrap_or_default()
    }

    /// `<dir>/<rel>` by plain concatenation: no normalization of slashes or empty parts.
    #[must_use]
    pub fn resolve(&self, rel: &str) -> String {
        format!("{}/{}", self.dir(), rel)
    }

    /// Absolute filenames as-is, anything else through [`AuditContext::resolve`].
    #[must_use]
    pub fn locate(&self, filename: &str) -> PathBuf {
        if Path::new(filename).is_absolute() {
            PathBuf::from(filename)
        } else {
            PathBuf::from(self.resolve(filename))
        }
    }

    pub fn shell(&mut self) -> &mut dyn Shell {
        self.shell.as_mut()
    }

    #[must_use]
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }
}

/// A queued check. The evaluator is bound when the check is queued.
#[derive(Clone)]
pub struct PendingCheck {
    pub name: String,
    pub args: Vec<RuleArg>,
    pub negated: bool,
    evaluator: Option<Rule>,
}

impl PendingCheck {
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.name, self.negated)
    }

    /// False when the name was not registered, or is a negated `assert`/`refute`.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.evaluator.is_some()
    }
}

impl std::fmt::Debug for PendingCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCheck")
            .field("name", &self.display_name())
            .field("args", &self.args)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Record of one executed check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub args: Vec<RuleArg>,
    /// Raw rule outcome, before negation.
    pub outcome: Value,
    pub negated: bool,
}

impl CheckResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        is_truthy(&self.outcome) != self.negated
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.name, self.negated)
    }
}

fn display_name(name: &str, negated: bool) -> String {
    if negated {
        format!("refute.{name}")
    } else {
        name.to_string()
    }
}

pub struct Auditor {
    ctx: AuditContext,
    rules: RuleRegistry,
    queue: Vec<PendingCheck>,
    results: Vec<CheckResult>,
    matched: bool,
    state: AuditState,
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("dir", &self.dir())
            .field("queue", &self.queue)
            .field("results", &self.results)
            .field("matched", &self.matched)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Auditor {
    /// Real shell and filesystem, rules from the process-wide registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(rules::snapshot(), RealShell::new(), RealFileSystem)
    }

    /// Build from explicit collaborators. The target directory defaults to
    /// `fs.current_dir()`.
    #[must_use]
    pub fn with_parts<S, F>(rules: RuleRegistry, shell: S, fs: F) -> Self
    where
        S: Shell + 'static,
        F: FileSystem + 'static,
    {
        let dir = fs
            .current_dir()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_else(|_| ".".to_string());
        Self {
            ctx: AuditContext::new(dir, Box::new(shell), Box::new(fs)),
            rules,
            queue: Vec::new(),
            results: Vec::new(),
            matched: true,
            state: AuditState::Pending,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.ctx.settings.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.ctx.get(key)
    }

    #[must_use]
    pub fn dir(&self) -> &str {
        self.ctx.dir()
    }

    #[must_use]
    pub fn resolve(&self, rel: &str) -> String {
        self.ctx.resolve(rel)
    }

    /// Rule set bound at construction.
    #[must_use]
    pub const fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Queue the rule `name` with `args`. Unknown names fail when evaluated.
    pub fn rule(&mut self, name: &str, args: Vec<RuleArg>) -> &mut Self {
        self.enqueue(name, args, false)
    }

    /// Queue negated variants: the next check passes when the rule's outcome is falsy.
    pub fn not(&mut self) -> Negated<'_> {
        Negated::new(self)
    }

    pub(crate) fn enqueue(&mut self, name: &str, args: Vec<RuleArg>, negated: bool) -> &mut Self {
        let evaluator = if negated && !rules::has_negated_variant(name) {
            None
        } else {
            self.rules.get(name).cloned()
        };
        self.queue.push(PendingCheck {
            name: name.to_string(),
            args,
            negated,
            evaluator,
        });
        self
    }

    /// Run every queued check in order and return whether all of them passed.
    ///
    /// The shell first changes into the target directory. Once a check fails the
    /// rest are skipped and not recorded. Calling this again replays the queue
    /// against a fresh log.
    ///
    /// # Errors
    /// Propagates rule faults (missing paths, shell failures, unknown rules). The
    /// log then holds the checks that completed before the fault.
    pub fn evaluate(&mut self) -> Result<bool> {
        self.state = AuditState::Evaluating;
        self.results.clear();
        self.matched = true;
        self.enter_target_dir();

        let queue = std::mem::take(&mut self.queue);
        let outcome = queue.iter().try_for_each(|check| self.run_check(check));
        self.queue = queue;
        self.state = AuditState::Settled;
        outcome?;

        tracing::info!(
            dir = %self.dir(),
            passed = self.matched,
            executed = self.results.len(),
            skipped = self.skipped(),
            "audit settled"
        );
        Ok(self.matched)
    }

    fn enter_target_dir(&mut self) {
        let dir = self.dir().to_string();
        match self.ctx.shell().raw(&[Value::from("cd"), Value::from(dir.as_str())]) {
            Ok(res) if is_truthy(&res) => tracing::debug!(%dir, "entered target directory"),
            Ok(_) => tracing::warn!(%dir, "could not enter target directory"),
            Err(e) => tracing::warn!(%dir, error = %e, "could not enter target directory"),
        }
    }

    fn run_check(&mut self, check: &PendingCheck) -> Result<()> {
        if !self.matched {
            tracing::debug!(rule = %check.display_name(), "skipped after earlier failure");
            return Ok(());
        }

        let rule = check
            .evaluator
            .as_ref()
            .ok_or_else(|| AuditError::UnknownRule(check.display_name()))?;
        let outcome = (**rule)(&mut self.ctx, &check.args)?;

        let result = CheckResult {
            name: check.name.clone(),
            args: check.args.clone(),
            outcome,
            negated: check.negated,
        };
        let passed = result.passed();
        tracing::debug!(rule = %result.display_name(), args = ?result.args, passed, "check executed");

        self.results.push(result);
        self.matched = self.matched && passed;
        Ok(())
    }

    /// The most recently recorded result.
    #[must_use]
    pub fn last(&self) -> Option<&CheckResult> {
        self.results.last()
    }

    #[must_use]
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    #[must_use]
    pub fn pending(&self) -> &[PendingCheck] {
        &self.queue
    }

    /// Queued checks that were not recorded by the last evaluation.
    #[must_use]
    pub fn skipped(&self) -> usize {
        if self.state == AuditState::Settled {
            self.queue.len().saturating_sub(self.results.len())
        } else {
            0
        }
    }

    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.matched
    }

    #[must_use]
    pub const fn state(&self) -> AuditState {
        self.state
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
