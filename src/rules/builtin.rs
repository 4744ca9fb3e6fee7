use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde_json::{Map, Value, json};

use crate::auditor::AuditContext;
use crate::error::{AuditError, Result};
use crate::probe::{EntryStatus, aggregate_size, file_count};
use crate::shell::{arg_to_string, invert_grep_args};

use super::registry::RuleRegistry;
use super::{RuleArg, is_truthy, names};

/// Add every built-in rule to `registry`, overwriting same-named entries.
pub fn register_builtins(registry: &mut RuleRegistry) {
    registry
        .register(names::RAW, raw)
        .register(names::OUTER, outer)
        .register(names::ASSERT, assert)
        .register(names::REFUTE, refute)
        .register(names::EXISTS, exists)
        .register(names::HAS_DIR, has_dir)
        .register(names::HAS_FILE, has_file)
        .register(names::GREP, grep)
        .register(names::GREPV, grepv)
        .register(names::MIN_SIZE, min_size)
        .register(names::MAX_SIZE, max_size)
        .register(names::MIN_COUNT, min_count)
        .register(names::MAX_COUNT, max_count)
        .register(names::CREATED, created)
        .register(names::MODIFIED, modified);
}

fn invalid(rule: &str, message: impl Into<String>) -> AuditError {
    AuditError::InvalidArgument {
        rule: rule.to_string(),
        message: message.into(),
    }
}

fn data_args(rule: &str, args: &[RuleArg]) -> Result<Vec<Value>> {
    args.iter()
        .map(|arg| {
            arg.as_value()
                .cloned()
                .ok_or_else(|| invalid(rule, "callbacks are only accepted by assert and refute"))
        })
        .collect()
}

fn string_args(rule: &str, args: &[RuleArg]) -> Result<Vec<String>> {
    Ok(data_args(rule, args)?.iter().map(arg_to_string).collect())
}

fn path_arg<'a>(rule: &str, args: &'a [RuleArg]) -> Result<&'a str> {
    args.first()
        .and_then(RuleArg::as_value)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(rule, "expected a relative path"))
}

fn options_arg<'a>(rule: &str, args: &'a [RuleArg]) -> Result<&'a Map<String, Value>> {
    args.first()
        .and_then(RuleArg::as_value)
        .and_then(Value::as_object)
        .ok_or_else(|| invalid(rule, "expected an options object with `filename`"))
}

fn target_path(rule: &str, ctx: &AuditContext, options: &Map<String, Value>) -> Result<PathBuf> {
    options
        .get("filename")
        .and_then(Value::as_str)
        .map(|filename| ctx.locate(filename))
        .ok_or_else(|| invalid(rule, "missing `filename`"))
}

/// Missing or non-numeric limits compare false.
fn limit(options: &Map<String, Value>, key: &str) -> Option<f64> {
    options.get(key).and_then(Value::as_f64)
}

fn raw(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    let values = data_args(names::RAW, args)?;
    Ok(Value::Bool(is_truthy(&ctx.shell().raw(&values)?)))
}

fn outer(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    let values = data_args(names::OUTER, args)?;
    let (method, rest) = values
        .split_first()
        .ok_or_else(|| invalid(names::OUTER, "missing shell method name"))?;
    let method = arg_to_string(method);
    Ok(Value::Bool(is_truthy(&ctx.shell().named(&method, rest)?)))
}

fn run_callback(rule: &str, ctx: &mut AuditContext, args: &[RuleArg]) -> Result<bool> {
    match args.get(1) {
        Some(RuleArg::Callback(callback)) => Ok(is_truthy(&(**callback)(ctx.shell())?)),
        _ => Err(invalid(rule, "expected (label, callback)")),
    }
}

fn assert(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    run_callback(names::ASSERT, ctx, args).map(Value::Bool)
}

fn refute(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    run_callback(names::REFUTE, ctx, args).map(|passed| Value::Bool(!passed))
}

fn shell_test(rule: &str, flag: &str, ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    let path = ctx.resolve(path_arg(rule, args)?);
    ctx.shell().raw(&[json!("test"), json!(flag), json!(path)])
}

fn exists(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    shell_test(names::EXISTS, "-e", ctx, args)
}

fn has_dir(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    shell_test(names::HAS_DIR, "-d", ctx, args)
}

fn has_file(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    shell_test(names::HAS_FILE, "-f", ctx, args)
}

fn grep(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    let args = string_args(names::GREP, args)?;
    Ok(Value::Bool(ctx.shell().grep(&args)?.found()))
}

fn grepv(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    let args = invert_grep_args(string_args(names::GREPV, args)?);
    Ok(Value::Bool(ctx.shell().grep(&args)?.found()))
}

#[allow(clippy::cast_precision_loss)]
fn size_within(
    rule: &str,
    ctx: &AuditContext,
    args: &[RuleArg],
    within: fn(f64, f64) -> bool,
) -> Result<Value> {
    let options = options_arg(rule, args)?;
    let path = target_path(rule, ctx, options)?;
    let actual = aggregate_size(ctx.fs(), &path)? as f64;
    Ok(Value::Bool(
        limit(options, "size").is_some_and(|size| within(actual, size)),
    ))
}

#[allow(clippy::cast_precision_loss)]
fn count_within(
    rule: &str,
    ctx: &AuditContext,
    args: &[RuleArg],
    within: fn(f64, f64) -> bool,
) -> Result<Value> {
    let options = options_arg(rule, args)?;
    let path = target_path(rule, ctx, options)?;
    let actual = file_count(ctx.fs(), &path)? as f64;
    Ok(Value::Bool(
        limit(options, "count").is_some_and(|count| within(actual, count)),
    ))
}

fn at_least(actual: f64, bound: f64) -> bool {
    actual >= bound
}

fn at_most(actual: f64, bound: f64) -> bool {
    actual <= bound
}

fn min_size(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    size_within(names::MIN_SIZE, ctx, args, at_least)
}

fn max_size(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    size_within(names::MAX_SIZE, ctx, args, at_most)
}

fn min_count(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    count_within(names::MIN_COUNT, ctx, args, at_least)
}

fn max_count(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    count_within(names::MAX_COUNT, ctx, args, at_most)
}

/// Seconds since `then`; timestamps in the future count as age zero.
fn age_secs(then: SystemTime) -> f64 {
    SystemTime::now()
        .duration_since(then)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}

fn younger_than(
    rule: &str,
    ctx: &AuditContext,
    args: &[RuleArg],
    pick: fn(&EntryStatus) -> SystemTime,
) -> Result<Value> {
    let options = options_arg(rule, args)?;
    let path = target_path(rule, ctx, options)?;
    let status = ctx
        .fs()
        .status(&path)
        .map_err(|source| AuditError::FileAccess { path, source })?;
    let age = age_secs(pick(&status));
    Ok(Value::Bool(
        limit(options, "max").is_some_and(|max| age <= max),
    ))
}

fn created(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    younger_than(names::CREATED, ctx, args, |status| status.created)
}

fn modified(ctx: &mut AuditContext, args: &[RuleArg]) -> Result<Value> {
    younger_than(names::MODIFIED, ctx, args, |status| status.modified)
}

#[cfg(test)]
#[path = "builtin_tests.rs"]
mod tests;
