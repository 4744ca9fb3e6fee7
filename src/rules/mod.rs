//! Rule registry and the built-in rule set.

mod builtin;
mod registry;

pub use builtin::register_builtins;
pub use registry::{Rule, RuleRegistry, extend, register, rule_fn, snapshot};

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::shell::Shell;

/// Built-in rule names.
pub mod names {
    pub const RAW: &str = "_";
    pub const OUTER: &str = "__";
    pub const ASSERT: &str = "assert";
    pub const REFUTE: &str = "refute";
    pub const EXISTS: &str = "exists";
    pub const HAS_DIR: &str = "hasDir";
    pub const HAS_FILE: &str = "hasFile";
    pub const GREP: &str = "grep";
    pub const GREPV: &str = "grepv";
    pub const MIN_SIZE: &str = "minSize";
    pub const MAX_SIZE: &str = "maxSize";
    pub const MIN_COUNT: &str = "minCount";
    pub const MAX_COUNT: &str = "maxCount";
    pub const CREATED: &str = "created";
    pub const MODIFIED: &str = "modified";
}

/// `assert` and `refute` are each other's negation and get no negated variant.
#[must_use]
pub fn has_negated_variant(name: &str) -> bool {
    name != names::ASSERT && name != names::REFUTE
}

/// Callback handed to `assert`/`refute`; its return value is the check outcome.
pub type Callback = Rc<dyn Fn(&mut dyn Shell) -> Result<Value>>;

/// One positional rule argument, captured when the check is queued.
#[derive(Clone)]
pub enum RuleArg {
    Value(Value),
    Callback(Callback),
}

impl RuleArg {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Shell) -> Result<Value> + 'static,
    {
        Self::Callback(Rc::new(f))
    }

    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Callback(_) => None,
        }
    }

    /// JSON view for reports; callbacks render as `"<callback>"`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Callback(_) => Value::from("<callback>"),
        }
    }
}

impl fmt::Debug for RuleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Callback(_) => f.write_str("<callback>"),
        }
    }
}

impl PartialEq for RuleArg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Callback(a), Self::Callback(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for RuleArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for RuleArg {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for RuleArg {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

/// Truthiness of a rule outcome.
///
/// `null`, `false`, zero, the empty string and the empty array are falsy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
