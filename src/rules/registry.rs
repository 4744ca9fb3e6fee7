use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;
use serde_json::Value;

use crate::auditor::AuditContext;
use crate::error::Result;

use super::RuleArg;
use super::builtin::register_builtins;

/// A rule evaluates queued arguments against the auditor's context.
pub type Rule = Arc<dyn Fn(&mut AuditContext, &[RuleArg]) -> Result<Value> + Send + Sync>;

/// Wrap a closure as a shareable [`Rule`].
pub fn rule_fn<F>(f: F) -> Rule
where
    F: Fn(&mut AuditContext, &[RuleArg]) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Open mapping from rule name to rule function, in registration order.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: IndexMap<String, Rule>,
}

impl RuleRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in rule.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Insert or overwrite `name`. Last writer wins.
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F) -> &mut Self
    where
        F: Fn(&mut AuditContext, &[RuleArg]) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(name, rule_fn(rule))
    }

    pub fn insert(&mut self, name: impl Into<String>, rule: Rule) -> &mut Self {
        self.rules.insert(name.into(), rule);
        self
    }

    /// Merge pairs one at a time, in iteration order.
    pub fn extend<I, S>(&mut self, rules: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, Rule)>,
        S: Into<String>,
    {
        for (name, rule) in rules {
            self.insert(name, rule);
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rules.keys()).finish()
    }
}

static DEFAULT_REGISTRY: LazyLock<RwLock<RuleRegistry>> =
    LazyLock::new(|| RwLock::new(RuleRegistry::builtin()));

/// Register a rule in the process-wide registry.
///
/// Auditors constructed earlier keep the rule set they were built with.
pub fn register<F>(name: impl Into<String>, rule: F)
where
    F: Fn(&mut AuditContext, &[RuleArg]) -> Result<Value> + Send + Sync + 'static,
{
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, rule);
}

/// Merge rules into the process-wide registry.
pub fn extend<I, S>(rules: I)
where
    I: IntoIterator<Item = (S, Rule)>,
    S: Into<String>,
{
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .extend(rules);
}

/// Copy of the process-wide registry as it is right now.
#[must_use]
pub fn snapshot() -> RuleRegistry {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
