use std::path::{Path, PathBuf};

use audit_fs::cli::{CheckArgs, Cli, Commands};
use audit_fs::config::{AuditPlan, ConfigLoader, FileConfigLoader};
use audit_fs::output::{AuditReport, JsonFormatter, OutputFormat, OutputFormatter, TextFormatter};
use audit_fs::rules::{self, has_negated_variant};
use audit_fs::{Auditor, EXIT_AUDIT_FAILED, EXIT_CONFIG_ERROR, EXIT_SUCCESS};

fn main() {
    let cli = Cli::parse_ordered();
    audit_fs::logging::init(cli.verbose, cli.quiet);

    let exit_code = match &cli.command {
        Commands::Check(args) => run_check(args, &cli),
        Commands::Rules => run_rules(),
    };

    std::process::exit(exit_code);
}

fn run_check(args: &CheckArgs, cli: &Cli) -> i32 {
    match run_check_impl(args, cli) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(detail) = e.detail() {
                eprintln!("  Caused by: {detail}");
            }
            EXIT_CONFIG_ERROR
        }
    }
}

fn run_check_impl(args: &CheckArgs, cli: &Cli) -> audit_fs::Result<i32> {
    let mut plan = load_plan(args.config.as_deref(), args.no_config)?;
    plan.checks.extend(args.flag_checks());
    if let Some(dir) = &args.dir {
        plan.dir = Some(dir.clone());
    }
    if let Some(dir) = plan.dir.take() {
        plan.dir = Some(absolute_dir(&dir)?);
    }

    let mut auditor = Auditor::new();
    plan.validate(auditor.rules())?;
    if plan.checks.is_empty() {
        tracing::warn!("no checks to run; pass --has-file, --has-dir, --exists, --missing or a plan");
    }
    plan.apply_to(&mut auditor);

    let passed = auditor.evaluate()?;
    let report = AuditReport::from_auditor(&auditor);
    let output = match args.format {
        OutputFormat::Text => {
            TextFormatter::with_verbose(cli.color.into(), cli.verbose).format(&report)?
        }
        OutputFormat::Json => JsonFormatter.format(&report)?,
    };
    print!("{output}");

    Ok(if passed { EXIT_SUCCESS } else { EXIT_AUDIT_FAILED })
}

fn load_plan(path: Option<&Path>, no_config: bool) -> audit_fs::Result<AuditPlan> {
    if no_config {
        return Ok(AuditPlan::default());
    }
    let loader = FileConfigLoader::new();
    let result = match path {
        Some(p) => loader.load_from_path(p)?,
        None => loader.load()?,
    };
    Ok(result.plan)
}

/// Rule paths are joined onto the target directory, so it must not depend on the
/// shell's active directory.
fn absolute_dir(dir: &str) -> audit_fs::Result<String> {
    let path = PathBuf::from(dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::path::absolute(&path)?
    };
    Ok(absolute.to_string_lossy().into_owned())
}

fn run_rules() -> i32 {
    for name in rules::snapshot().names() {
        if has_negated_variant(name) {
            println!("{name}");
        } else {
            println!("{name} (no negated variant)");
        }
    }
    EXIT_SUCCESS
}
