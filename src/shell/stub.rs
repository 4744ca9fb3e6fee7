use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{AuditError, Result};

use super::Shell;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCall {
    Raw(Vec<Value>),
    Named(String, Vec<Value>),
}

pub type CallLog = Rc<RefCell<Vec<ShellCall>>>;

/// Recording shell: answers from a table of exact argument lists, else a default.
pub struct StubShell {
    calls: CallLog,
    responses: Vec<(Vec<Value>, Value)>,
    failing: Vec<Vec<Value>>,
    default: Value,
}

impl StubShell {
    pub fn new() -> Self {
        Self::returning(Value::Bool(true))
    }

    pub fn returning(default: Value) -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            responses: Vec::new(),
            failing: Vec::new(),
            default,
        }
    }

    pub fn respond(mut self, args: &[&str], value: Value) -> Self {
        self.responses.push((to_values(args), value));
        self
    }

    pub fn fail_on(mut self, args: &[&str]) -> Self {
        self.failing.push(to_values(args));
        self
    }

    pub fn log(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    fn answer(&self, args: &[Value]) -> Result<Value> {
        if self.failing.iter().any(|f| f.as_slice() == args) {
            return Err(AuditError::Shell {
                command: args.first().map(ToString::to_string).unwrap_or_default(),
                message: "stubbed failure".to_string(),
            });
        }
        Ok(self
            .responses
            .iter()
            .find(|(expected, _)| expected.as_slice() == args)
            .map_or_else(|| self.default.clone(), |(_, value)| value.clone()))
    }
}

pub fn to_values(args: &[&str]) -> Vec<Value> {
    args.iter().map(|a| Value::from(*a)).collect()
}

pub fn raw_calls(log: &CallLog) -> Vec<Vec<Value>> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            ShellCall::Raw(args) => Some(args.clone()),
            ShellCall::Named(..) => None,
        })
        .collect()
}

impl Shell for StubShell {
    fn raw(&mut self, args: &[Value]) -> Result<Value> {
        self.calls.borrow_mut().push(ShellCall::Raw(args.to_vec()));
        self.answer(args)
    }

    fn named(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        self.calls
            .borrow_mut()
            .push(ShellCall::Named(method.to_string(), args.to_vec()));
        let mut full = vec![Value::from(method)];
        full.extend_from_slice(args);
        self.answer(&full)
    }
}
