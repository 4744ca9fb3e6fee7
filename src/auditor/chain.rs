//! Typed chain methods for the built-in rules.
//!
//! Each method only packs its arguments and queues the rule by name; the same set
//! is generated for [`Auditor`] and for its negated view [`Negated`].

use serde_json::{Value, json};

use crate::error::Result;
use crate::rules::{RuleArg, names};
use crate::shell::Shell;

use super::Auditor;

macro_rules! rule_methods {
    ($recv:ty => $ret:ty) => {
        /// Truthy-test a raw shell invocation, e.g. `["test", "-L", "link"]`.
        pub fn raw(self: $recv, args: Vec<Value>) -> $ret {
            let args = args.into_iter().map(RuleArg::Value).collect();
            Self::queue(self, names::RAW, args)
        }

        /// Truthy-test a named shell method, e.g. `find_by_regex`.
        pub fn outer(self: $recv, method: &str, args: Vec<Value>) -> $ret {
            let mut all = vec![RuleArg::from(method)];
            all.extend(args.into_iter().map(RuleArg::Value));
            Self::queue(self, names::OUTER, all)
        }

        /// Path (of any type) exists under the target directory.
        pub fn exists(self: $recv, path: &str) -> $ret {
            Self::queue(self, names::EXISTS, vec![RuleArg::from(path)])
        }

        pub fn has_dir(self: $recv, path: &str) -> $ret {
            Self::queue(self, names::HAS_DIR, vec![RuleArg::from(path)])
        }

        pub fn has_file(self: $recv, path: &str) -> $ret {
            Self::queue(self, names::HAS_FILE, vec![RuleArg::from(path)])
        }

        /// `grep -l` style arguments: optional leading flags, pattern, files.
        pub fn grep(self: $recv, args: &[&str]) -> $ret {
            Self::queue(self, names::GREP, args.iter().map(|a| RuleArg::from(*a)).collect())
        }

        /// Like [`grep`](Self::grep) with inverted matching.
        pub fn grepv(self: $recv, args: &[&str]) -> $ret {
            Self::queue(self, names::GREPV, args.iter().map(|a| RuleArg::from(*a)).collect())
        }

        /// Aggregate size in bytes is at least `size`.
        pub fn min_size(self: $recv, filename: &str, size: u64) -> $ret {
            let args = vec![RuleArg::Value(json!({ "filename": filename, "size": size }))];
            Self::queue(self, names::MIN_SIZE, args)
        }

        /// Aggregate size in bytes is at most `size`.
        pub fn max_size(self: $recv, filename: &str, size: u64) -> $ret {
            let args = vec![RuleArg::Value(json!({ "filename": filename, "size": size }))];
            Self::queue(self, names::MAX_SIZE, args)
        }

        /// Directory holds at least `count` non-directory entries.
        pub fn min_count(self: $recv, filename: &str, count: u64) -> $ret {
            let args = vec![RuleArg::Value(json!({ "filename": filename, "count": count }))];
            Self::queue(self, names::MIN_COUNT, args)
        }

        /// Directory holds at most `count` non-directory entries.
        pub fn max_count(self: $recv, filename: &str, count: u64) -> $ret {
            let args = vec![RuleArg::Value(json!({ "filename": filename, "count": count }))];
            Self::queue(self, names::MAX_COUNT, args)
        }

        /// Created (status change on Unix) within the last `max_secs` seconds.
        pub fn created(self: $recv, filename: &str, max_secs: u64) -> $ret {
            let args = vec![RuleArg::Value(json!({ "filename": filename, "max": max_secs }))];
            Self::queue(self, names::CREATED, args)
        }

        /// Modified within the last `max_secs` seconds.
        pub fn modified(self: $recv, filename: &str, max_secs: u64) -> $ret {
            let args = vec![RuleArg::Value(json!({ "filename": filename, "max": max_secs }))];
            Self::queue(self, names::MODIFIED, args)
        }
    };
}

// `self: $recv` lets one macro serve both receivers.
#[allow(clippy::needless_arbitrary_self_type)]
impl Auditor {
    fn queue(&mut self, name: &str, args: Vec<RuleArg>) -> &mut Self {
        self.enqueue(name, args, false)
    }

    rule_methods!(&mut Self => &mut Self);

    /// Passes when `check` returns a truthy value. `label` is descriptive only.
    pub fn assert<F>(&mut self, label: &str, check: F) -> &mut Self
    where
        F: Fn(&mut dyn Shell) -> Result<Value> + 'static,
    {
        self.queue(names::ASSERT, vec![RuleArg::from(label), RuleArg::callback(check)])
    }

    /// Passes when `check` returns a falsy value. `label` is descriptive only.
    pub fn refute<F>(&mut self, label: &str, check: F) -> &mut Self
    where
        F: Fn(&mut dyn Shell) -> Result<Value> + 'static,
    {
        self.queue(names::REFUTE, vec![RuleArg::from(label), RuleArg::callback(check)])
    }
}

/// Negated view of an [`Auditor`]; every method queues one negated check and hands
/// the auditor back.
pub struct Negated<'a> {
    auditor: &'a mut Auditor,
}

#[allow(clippy::needless_arbitrary_self_type)]
impl<'a> Negated<'a> {
    pub(super) const fn new(auditor: &'a mut Auditor) -> Self {
        Self { auditor }
    }

    /// Queue the negated variant of any registered rule.
    pub fn rule(self, name: &str, args: Vec<RuleArg>) -> &'a mut Auditor {
        self.auditor.enqueue(name, args, true)
    }

    fn queue(self, name: &str, args: Vec<RuleArg>) -> &'a mut Auditor {
        self.rule(name, args)
    }

    rule_methods!(Self => &'a mut Auditor);
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
