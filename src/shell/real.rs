use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::{Value, json};
use walkdir::WalkDir;

use crate::error::{AuditError, Result};

use super::{Shell, arg_to_string, invert_grep_args};

/// Shell backed by `sh -c` (via `duct`) and `std::fs`.
///
/// `cd` only moves this shell's active directory, never the process's.
#[derive(Debug, Clone)]
pub struct RealShell {
    cwd: PathBuf,
}

impl Default for RealShell {
    fn default() -> Self {
        Self::new()
    }
}

impl RealShell {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { cwd: dir.into() }
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn locate(&self, path: &str) -> PathBuf {
        self.cwd.join(path)
    }

    fn cd(&mut self, dir: &str) -> Value {
        let target = self.locate(dir);
        if target.is_dir() {
            tracing::trace!(dir = %target.display(), "changed active directory");
            self.cwd = target;
            Value::Bool(true)
        } else {
            tracing::debug!(dir = %target.display(), "cd target is not a directory");
            Value::Bool(false)
        }
    }

    fn test(&self, flag: &str, path: &str) -> Result<Value> {
        let path = self.locate(path);
        let outcome = match flag {
            "-e" => path.exists(),
            "-d" => path.is_dir(),
            "-f" => path.is_file(),
            "-L" => path.is_symlink(),
            "-s" => path.metadata().is_ok_and(|m| m.len() > 0),
            other => {
                return Err(AuditError::Shell {
                    command: "test".to_string(),
                    message: format!("unsupported flag `{other}`"),
                });
            }
        };
        Ok(Value::Bool(outcome))
    }

    fn exec(&self, command: &str) -> Result<Value> {
        let output = duct::cmd("sh", ["-c", command])
            .dir(&self.cwd)
            .stdin_null()
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|e| AuditError::Shell {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        Ok(json!({
            "code": output.status.code().unwrap_or(-1),
            "output": String::from_utf8_lossy(&output.stdout),
        }))
    }

    fn find_by_regex(&self, dir: &str, pattern: &str) -> Result<Value> {
        let regex = Regex::new(pattern).map_err(|source| AuditError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let found: Vec<Value> = WalkDir::new(self.locate(dir))
            .into_iter()
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path().to_string_lossy().into_owned())
            .filter(|path| regex.is_match(path))
            .map(Value::String)
            .collect();

        Ok(Value::Array(found))
    }
}

fn string_args(args: &[Value]) -> Vec<String> {
    args.iter().map(arg_to_string).collect()
}

fn missing_arg(command: &str, what: &str) -> AuditError {
    AuditError::Shell {
        command: command.to_string(),
        message: format!("missing {what}"),
    }
}

impl Shell for RealShell {
    fn raw(&mut self, args: &[Value]) -> Result<Value> {
        let args = string_args(args);
        let Some((command, rest)) = args.split_first() else {
            return Err(missing_arg("", "command"));
        };

        match command.as_str() {
            "cd" => {
                let dir = rest.first().ok_or_else(|| missing_arg("cd", "directory"))?;
                Ok(self.cd(dir))
            }
            "pwd" => Ok(Value::String(self.cwd.to_string_lossy().into_owned())),
            "test" => match rest {
                [flag, path, ..] => self.test(flag, path),
                _ => Err(missing_arg("test", "flag or path")),
            },
            "exec" => {
                let line = rest.first().ok_or_else(|| missing_arg("exec", "command line"))?;
                self.exec(line)
            }
            other => Err(AuditError::Shell {
                command: other.to_string(),
                message: "unsupported command".to_string(),
            }),
        }
    }

    fn named(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        let args = string_args(args);
        match method {
            "grep" => Ok(Value::Bool(self.grep(&args)?.found())),
            "grepv" => Ok(Value::Bool(self.grep(&invert_grep_args(args))?.found())),
            "exec" => {
                let line = args.first().ok_or_else(|| missing_arg("exec", "command line"))?;
                self.exec(line)
            }
            "find_by_regex" => match args.as_slice() {
                [dir, pattern, ..] => self.find_by_regex(dir, pattern),
                _ => Err(missing_arg("find_by_regex", "directory or pattern")),
            },
            other => Err(AuditError::Shell {
                command: other.to_string(),
                message: "unknown shell method".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "real_tests.rs"]
mod tests;
