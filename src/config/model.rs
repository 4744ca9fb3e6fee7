use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auditor::{Auditor, DIR_KEY};
use crate::error::{AuditError, Result};
use crate::rules::{RuleArg, RuleRegistry, names};

pub const PLAN_VERSION: &str = "1";

/// A declarative audit: optional target directory plus an ordered list of checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Target directory. Relative values are resolved against the plan file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default, rename = "check", skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckSpec {
    pub rule: String,

    #[serde(default)]
    pub args: Vec<Value>,

    /// Queue the negated variant.
    #[serde(default)]
    pub negate: bool,
}

impl CheckSpec {
    #[must_use]
    pub fn new(rule: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            rule: rule.into(),
            args,
            negate: false,
        }
    }

    #[must_use]
    pub const fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }
}

impl AuditPlan {
    pub fn push(&mut self, check: CheckSpec) -> &mut Self {
        self.checks.push(check);
        self
    }

    /// Check the plan against `rules` before anything is queued.
    ///
    /// # Errors
    /// Returns [`AuditError::Config`] for an unsupported version or for `assert`/`refute`
    /// checks, and [`AuditError::UnknownRule`] for names `rules` does not hold.
    pub fn validate(&self, rules: &RuleRegistry) -> Result<()> {
        match self.version.as_deref() {
            None | Some(PLAN_VERSION) => {}
            Some(v) => {
                return Err(AuditError::Config(format!(
                    "Unsupported plan version '{v}'. Only version '{PLAN_VERSION}' is supported."
                )));
            }
        }

        for (index, check) in self.checks.iter().enumerate() {
            if check.rule == names::ASSERT || check.rule == names::REFUTE {
                return Err(AuditError::Config(format!(
                    "check #{}: `{}` takes a callback and cannot be declared in a plan",
                    index + 1,
                    check.rule
                )));
            }
            if !rules.contains(&check.rule) {
                return Err(AuditError::UnknownRule(check.rule.clone()));
            }
        }
        Ok(())
    }

    /// Set the target directory (when given) and queue every check, in order.
    pub fn apply_to(&self, auditor: &mut Auditor) {
        if let Some(dir) = &self.dir {
            auditor.set(DIR_KEY, dir.as_str());
        }
        for check in &self.checks {
            let args: Vec<RuleArg> = check.args.iter().cloned().map(RuleArg::Value).collect();
            if check.negate {
                auditor.not().rule(&check.rule, args);
            } else {
                auditor.rule(&check.rule, args);
            }
        }
        tracing::debug!(checks = self.checks.len(), dir = ?self.dir, "plan applied");
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
