use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

use crate::auditor::AuditContext;
use crate::error::AuditError;
use crate::probe::mock_fs::MockFileSystem;
use crate::rules::{RuleArg, RuleRegistry, names};
use crate::shell::stub::{CallLog, ShellCall, StubShell, raw_calls, to_values};

fn context(shell: StubShell, fs: MockFileSystem) -> (AuditContext, CallLog) {
    let log = shell.log();
    let ctx = AuditContext::new("/tmp/x".to_string(), Box::new(shell), Box::new(fs));
    (ctx, log)
}

fn run(name: &str, ctx: &mut AuditContext, args: &[RuleArg]) -> crate::Result<Value> {
    let registry = RuleRegistry::builtin();
    let rule = registry.get(name).unwrap();
    (**rule)(ctx, args)
}

fn strs(args: &[&str]) -> Vec<RuleArg> {
    args.iter().map(|a| RuleArg::from(*a)).collect()
}

fn sized_tree() -> MockFileSystem {
    MockFileSystem::new()
        .with_dir("/tmp/x", 4096)
        .with_dir("/tmp/x/dist", 100)
        .with_file("/tmp/x/dist/a.js", 50)
        .with_file("/tmp/x/dist/b.js", 50)
        .with_dir("/tmp/x/dist/maps", 0)
}

#[test]
fn builtin_registry_has_every_rule() {
    let registry = RuleRegistry::builtin();
    let expected = [
        names::RAW,
        names::OUTER,
        names::ASSERT,
        names::REFUTE,
        names::EXISTS,
        names::HAS_DIR,
        names::HAS_FILE,
        names::GREP,
        names::GREPV,
        names::MIN_SIZE,
        names::MAX_SIZE,
        names::MIN_COUNT,
        names::MAX_COUNT,
        names::CREATED,
        names::MODIFIED,
    ];
    assert_eq!(registry.names().collect::<Vec<_>>(), expected);
}

// =============================================================================
// Shell passthrough rules
// =============================================================================

#[test]
fn has_file_tests_concatenated_path() {
    let (mut ctx, log) = context(StubShell::new(), MockFileSystem::new());

    let res = run(names::HAS_FILE, &mut ctx, &strs(&["file.ext"])).unwrap();

    assert_eq!(res, json!(true));
    assert_eq!(raw_calls(&log), vec![to_values(&["test", "-f", "/tmp/x/file.ext"])]);
}

#[test]
fn has_dir_with_empty_path_keeps_trailing_slash() {
    let (mut ctx, log) = context(StubShell::new(), MockFileSystem::new());

    run(names::HAS_DIR, &mut ctx, &strs(&[""])).unwrap();

    assert_eq!(raw_calls(&log), vec![to_values(&["test", "-d", "/tmp/x/"])]);
}

#[test]
fn exists_uses_any_type_flag() {
    let shell = StubShell::returning(json!(false));
    let (mut ctx, log) = context(shell, MockFileSystem::new());

    let res = run(names::EXISTS, &mut ctx, &strs(&["sub/thing"])).unwrap();

    assert_eq!(res, json!(false));
    assert_eq!(raw_calls(&log), vec![to_values(&["test", "-e", "/tmp/x/sub/thing"])]);
}

#[test]
fn path_rules_require_a_string() {
    let (mut ctx, _) = context(StubShell::new(), MockFileSystem::new());
    let err = run(names::HAS_FILE, &mut ctx, &[]).unwrap_err();
    assert!(matches!(err, AuditError::InvalidArgument { .. }));
}

#[test]
fn raw_forwards_args_and_casts_to_bool() {
    let shell = StubShell::new().respond(&["test", "-L", "link"], json!({"code": 0}));
    let (mut ctx, log) = context(shell, MockFileSystem::new());

    let res = run(names::RAW, &mut ctx, &strs(&["test", "-L", "link"])).unwrap();

    assert_eq!(res, json!(true));
    assert_eq!(raw_calls(&log), vec![to_values(&["test", "-L", "link"])]);
}

#[test]
fn raw_empty_string_result_is_false() {
    let (mut ctx, _) = context(StubShell::returning(json!("")), MockFileSystem::new());
    assert_eq!(run(names::RAW, &mut ctx, &strs(&["pwd"])).unwrap(), json!(false));
}

#[test]
fn outer_calls_named_method_with_rest() {
    let (mut ctx, log) = context(StubShell::new(), MockFileSystem::new());

    let res = run(names::OUTER, &mut ctx, &strs(&["grep", "needle", "/path/to/haystack"])).unwrap();

    assert_eq!(res, json!(true));
    assert_eq!(
        *log.borrow(),
        vec![ShellCall::Named(
            "grep".to_string(),
            to_values(&["needle", "/path/to/haystack"])
        )]
    );
}

#[test]
fn outer_without_method_is_invalid() {
    let (mut ctx, _) = context(StubShell::new(), MockFileSystem::new());
    assert!(matches!(
        run(names::OUTER, &mut ctx, &[]),
        Err(AuditError::InvalidArgument { .. })
    ));
}

#[test]
fn shell_fault_propagates() {
    let shell = StubShell::new().fail_on(&["test", "-f", "/tmp/x/a"]);
    let (mut ctx, _) = context(shell, MockFileSystem::new());
    assert!(matches!(
        run(names::HAS_FILE, &mut ctx, &strs(&["a"])),
        Err(AuditError::Shell { .. })
    ));
}

// =============================================================================
// assert / refute
// =============================================================================

#[test]
fn assert_callback_receives_shell() {
    let (mut ctx, log) = context(StubShell::returning(json!("/tmp/x")), MockFileSystem::new());
    let args = vec![
        RuleArg::from("cwd is set"),
        RuleArg::callback(|shell| shell.raw(&[json!("pwd")])),
    ];

    let res = run(names::ASSERT, &mut ctx, &args).unwrap();

    assert_eq!(res, json!(true));
    assert_eq!(raw_calls(&log), vec![to_values(&["pwd"])]);
}

#[test]
fn assert_and_refute_are_opposites() {
    for returned in [json!(true), json!(false), json!(0), json!("x")] {
        let (mut ctx, _) = context(StubShell::new(), MockFileSystem::new());
        let value = returned.clone();
        let args = vec![
            RuleArg::from("label"),
            RuleArg::callback(move |_| Ok(value.clone())),
        ];
        let asserted = run(names::ASSERT, &mut ctx, &args).unwrap();
        let refuted = run(names::REFUTE, &mut ctx, &args).unwrap();
        assert_ne!(asserted, refuted, "callback returned {returned}");
    }
}

#[test]
fn assert_without_callback_is_invalid() {
    let (mut ctx, _) = context(StubShell::new(), MockFileSystem::new());
    assert!(matches!(
        run(names::ASSERT, &mut ctx, &strs(&["label", "not a callback"])),
        Err(AuditError::InvalidArgument { .. })
    ));
}

#[test]
fn data_rules_reject_callbacks() {
    let (mut ctx, _) = context(StubShell::new(), MockFileSystem::new());
    let args = vec![RuleArg::callback(|_| Ok(json!(true)))];
    assert!(matches!(
        run(names::RAW, &mut ctx, &args),
        Err(AuditError::InvalidArgument { .. })
    ));
}

// =============================================================================
// grep / grepv
// =============================================================================

fn grep_shell(code: i32, output: &str) -> StubShell {
    StubShell::returning(json!({ "code": code, "output": output }))
}

#[test]
fn grep_passes_args_to_exec() {
    let (mut ctx, log) = context(grep_shell(0, "foo\nbar"), MockFileSystem::new());

    let res = run(names::GREP, &mut ctx, &strs(&["needle", "/path/to/haystack"])).unwrap();

    assert_eq!(res, json!(true));
    assert_eq!(
        raw_calls(&log),
        vec![to_values(&["exec", "grep -l \"needle\" /path/to/haystack"])]
    );
}

#[test]
fn grep_no_match_is_false() {
    let (mut ctx, _) = context(grep_shell(1, ""), MockFileSystem::new());
    assert_eq!(
        run(names::GREP, &mut ctx, &strs(&["needle", "f"])).unwrap(),
        json!(false)
    );
}

#[test]
fn grep_error_code_is_false() {
    let (mut ctx, _) = context(grep_shell(2, "foo\nbar"), MockFileSystem::new());
    assert_eq!(
        run(names::GREP, &mut ctx, &strs(&["needle", "f"])).unwrap(),
        json!(false)
    );
}

#[test]
fn grepv_prepends_invert_flag() {
    let (mut ctx, log) = context(grep_shell(0, "foo"), MockFileSystem::new());

    let res = run(names::GREPV, &mut ctx, &strs(&["needle", "/path/to/haystack"])).unwrap();

    assert_eq!(res, json!(true));
    assert_eq!(
        raw_calls(&log),
        vec![to_values(&["exec", "grep -vl \"needle\" /path/to/haystack"])]
    );
}

#[test]
fn grepv_merges_existing_flags() {
    let (mut ctx, log) = context(grep_shell(0, "foo"), MockFileSystem::new());

    run(names::GREPV, &mut ctx, &strs(&["-r", "needle", "/path/to/haystack"])).unwrap();

    assert_eq!(
        raw_calls(&log),
        vec![to_values(&["exec", "grep -rvl \"needle\" /path/to/haystack"])]
    );
}

// =============================================================================
// Size / count / age rules
// =============================================================================

fn options(value: Value) -> Vec<RuleArg> {
    vec![RuleArg::Value(value)]
}

#[test]
fn min_size_boundary_passes() {
    let (mut ctx, _) = context(StubShell::new(), sized_tree());
    let at = options(json!({"filename": "dist", "size": 200}));
    let above = options(json!({"filename": "dist", "size": 201}));

    assert_eq!(run(names::MIN_SIZE, &mut ctx, &at).unwrap(), json!(true));
    assert_eq!(run(names::MIN_SIZE, &mut ctx, &above).unwrap(), json!(false));
}

#[test]
fn max_size_boundary_passes() {
    let (mut ctx, _) = context(StubShell::new(), sized_tree());
    let at = options(json!({"filename": "dist/a.js", "size": 50}));
    let below = options(json!({"filename": "dist/a.js", "size": 49}));

    assert_eq!(run(names::MAX_SIZE, &mut ctx, &at).unwrap(), json!(true));
    assert_eq!(run(names::MAX_SIZE, &mut ctx, &below).unwrap(), json!(false));
}

#[test]
fn size_rules_accept_absolute_filenames() {
    let (mut ctx, _) = context(StubShell::new(), sized_tree());
    let args = options(json!({"filename": "/tmp/x/dist/b.js", "size": 50}));
    assert_eq!(run(names::MIN_SIZE, &mut ctx, &args).unwrap(), json!(true));
}

#[test]
fn missing_size_compares_false() {
    let (mut ctx, _) = context(StubShell::new(), sized_tree());
    let args = options(json!({"filename": "dist"}));
    assert_eq!(run(names::MIN_SIZE, &mut ctx, &args).unwrap(), json!(false));
    assert_eq!(run(names::MAX_SIZE, &mut ctx, &args).unwrap(), json!(false));
}

#[test]
fn missing_filename_is_invalid() {
    let (mut ctx, _) = context(StubShell::new(), sized_tree());
    let args = options(json!({"size": 1}));
    assert!(matches!(
        run(names::MIN_SIZE, &mut ctx, &args),
        Err(AuditError::InvalidArgument { .. })
    ));
}

#[test]
fn missing_path_is_file_access_fault() {
    let (mut ctx, _) = context(StubShell::new(), sized_tree());
    let args = options(json!({"filename": "nope", "size": 1}));
    assert!(matches!(
        run(names::MIN_SIZE, &mut ctx, &args),
        Err(AuditError::FileAccess { .. })
    ));
}

#[test]
fn count_rules_use_shallow_file_count() {
    let (mut ctx, _) = context(StubShell::new(), sized_tree());

    let max_at = options(json!({"filename": "dist", "count": 2}));
    let max_below = options(json!({"filename": "dist", "count": 1}));
    let min_above = options(json!({"filename": "dist", "count": 3}));

    assert_eq!(run(names::MAX_COUNT, &mut ctx, &max_at).unwrap(), json!(true));
    assert_eq!(run(names::MAX_COUNT, &mut ctx, &max_below).unwrap(), json!(false));
    assert_eq!(run(names::MIN_COUNT, &mut ctx, &max_at).unwrap(), json!(true));
    assert_eq!(run(names::MIN_COUNT, &mut ctx, &min_above).unwrap(), json!(false));
}

#[test]
fn age_rules_compare_seconds() {
    let recent = SystemTime::now() - Duration::from_secs(60);
    let fs = MockFileSystem::new()
        .with_file("/tmp/x/new.txt", 1)
        .with_times("/tmp/x/new.txt", recent, recent)
        .with_file("/tmp/x/old.txt", 1)
        .with_times("/tmp/x/old.txt", UNIX_EPOCH, UNIX_EPOCH);
    let (mut ctx, _) = context(StubShell::new(), fs);

    let new_hour = options(json!({"filename": "new.txt", "max": 3600}));
    let new_tight = options(json!({"filename": "new.txt", "max": 10}));
    let old_hour = options(json!({"filename": "old.txt", "max": 3600}));

    assert_eq!(run(names::CREATED, &mut ctx, &new_hour).unwrap(), json!(true));
    assert_eq!(run(names::MODIFIED, &mut ctx, &new_hour).unwrap(), json!(true));
    assert_eq!(run(names::MODIFIED, &mut ctx, &new_tight).unwrap(), json!(false));
    assert_eq!(run(names::CREATED, &mut ctx, &old_hour).unwrap(), json!(false));
}

#[test]
fn age_rules_fault_on_missing_path() {
    let (mut ctx, _) = context(StubShell::new(), MockFileSystem::new());
    let args = options(json!({"filename": "gone.txt", "max": 10}));
    assert!(matches!(
        run(names::MODIFIED, &mut ctx, &args),
        Err(AuditError::FileAccess { .. })
    ));
}
