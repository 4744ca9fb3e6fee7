use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::config::CheckSpec;
use crate::output::{ColorMode, OutputFormat};
use crate::rules::names;

/// Color output control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal capability
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorChoice> for ColorMode {
    fn from(choice: ColorChoice) -> Self {
        match choice {
            ColorChoice::Auto => Self::Auto,
            ColorChoice::Always => Self::Always,
            ColorChoice::Never => Self::Never,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "audit-fs")]
#[command(author, version, about = "Assert facts about a directory tree")]
#[command(long_about = "Queue filesystem checks against a target directory and \
    evaluate them in order, stopping at the first failure.\n\n\
    Exit codes:\n  \
    0 - All checks passed\n  \
    1 - A check failed\n  \
    2 - Configuration or runtime error")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Like [`Parser::parse`], but also records where each check flag appeared so
    /// flag checks run in command-line order.
    #[must_use]
    pub fn parse_ordered() -> Self {
        Self::try_parse_ordered_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// # Errors
    /// Returns the clap error for invalid arguments, `--help` and `--version`.
    pub fn try_parse_ordered_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut command = Self::command();
        let matches = command.try_get_matches_from_mut(args)?;
        let mut cli = Self::from_arg_matches(&matches).map_err(|e| e.format(&mut command))?;
        if let Commands::Check(check) = &mut cli.command
            && let Some(sub) = matches.subcommand_matches("check")
        {
            check.positions = FlagPositions::from_matches(sub);
        }
        Ok(cli)
    }
}

/// Argument indices of each check flag occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagPositions {
    has_file: Vec<usize>,
    has_dir: Vec<usize>,
    exists: Vec<usize>,
    missing: Vec<usize>,
}

impl FlagPositions {
    fn from_matches(matches: &ArgMatches) -> Self {
        let indices = |id: &str| -> Vec<usize> {
            matches
                .indices_of(id)
                .map(Iterator::collect)
                .unwrap_or_default()
        };
        Self {
            has_file: indices("has_file"),
            has_dir: indices("has_dir"),
            exists: indices("exists"),
            missing: indices("missing"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate an audit plan plus any checks given as flags
    Check(CheckArgs),

    /// List registered rule names
    Rules,
}

#[derive(Parser, Debug, Default)]
pub struct CheckArgs {
    /// Path to an audit plan (defaults to ./.audit-fs.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip loading an audit plan
    #[arg(long)]
    pub no_config: bool,

    /// Target directory (overrides the plan)
    #[arg(short, long)]
    pub dir: Option<String>,

    /// Require a regular file, relative to the target directory
    #[arg(long, value_name = "PATH")]
    pub has_file: Vec<String>,

    /// Require a directory, relative to the target directory
    #[arg(long, value_name = "PATH")]
    pub has_dir: Vec<String>,

    /// Require a path of any type
    #[arg(long, value_name = "PATH")]
    pub exists: Vec<String>,

    /// Require that a path does not exist
    #[arg(long, value_name = "PATH")]
    pub missing: Vec<String>,

    /// Output format [possible values: text, json]
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    #[arg(skip)]
    pub positions: FlagPositions,
}

impl CheckArgs {
    /// Checks requested by flags, in command-line order.
    ///
    /// Without recorded positions (plain [`Parser::parse`]) they are grouped by flag
    /// in the order declared above.
    #[must_use]
    pub fn flag_checks(&self) -> Vec<CheckSpec> {
        let groups: [(&[String], &[usize], &str, bool); 4] = [
            (&self.has_file, &self.positions.has_file, names::HAS_FILE, false),
            (&self.has_dir, &self.positions.has_dir, names::HAS_DIR, false),
            (&self.exists, &self.positions.exists, names::EXISTS, false),
            (&self.missing, &self.positions.missing, names::EXISTS, true),
        ];

        let mut placed: Vec<(usize, CheckSpec)> = Vec::new();
        for (paths, positions, rule, negate) in groups {
            for (i, path) in paths.iter().enumerate() {
                let mut check = CheckSpec::new(rule, vec![Value::from(path.as_str())]);
                check.negate = negate;
                placed.push((positions.get(i).copied().unwrap_or(usize::MAX), check));
            }
        }
        placed.sort_by_key(|(position, _)| *position);
        placed.into_iter().map(|(_, check)| check).collect()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
