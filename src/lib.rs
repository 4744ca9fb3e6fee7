//! Lazily evaluated assertions about a directory tree.
//!
//! Checks are queued on an [`Auditor`] through chain methods and run in order by
//! [`Auditor::evaluate`], which stops at the first failing check.

pub mod auditor;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod probe;
pub mod rules;
pub mod shell;

pub use auditor::{AuditContext, AuditState, Auditor, CheckResult, Negated, PendingCheck};
pub use error::{AuditError, Result};
pub use rules::{Rule, RuleArg, RuleRegistry};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_AUDIT_FAILED: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
