use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to access path: {path}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shell command `{command}` failed: {message}")]
    Shell { command: String, message: String },

    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Invalid argument for rule `{rule}`: {message}")]
    InvalidArgument { rule: String, message: String },

    #[error("Invalid regex pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}

impl AuditError {
    /// Short category name used in reports.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::TomlParse(_) => "Config",
            Self::FileAccess { .. } => "FileAccess",
            Self::Shell { .. } => "Shell",
            Self::UnknownRule(_) | Self::InvalidArgument { .. } => "Rule",
            Self::InvalidPattern { .. } => "Pattern",
            Self::Io(_) => "IO",
            Self::JsonSerialize(_) => "JSON",
        }
    }

    /// The primary message without the category prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Config(msg) | Self::UnknownRule(msg) => msg.clone(),
            Self::FileAccess { path, source } => {
                format!("{} ({:?})", path.display(), source.kind())
            }
            Self::Shell { command, .. } => command.clone(),
            Self::InvalidArgument { rule, message } => format!("{rule}: {message}"),
            Self::InvalidPattern { pattern, .. } => pattern.clone(),
            Self::Io(e) => e.to_string(),
            Self::TomlParse(e) => e.to_string(),
            Self::JsonSerialize(e) => e.to_string(),
        }
    }

    /// Underlying cause, if the error wraps one.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::FileAccess { source, .. } => Some(source.to_string()),
            Self::Shell { message, .. } => Some(message.clone()),
            Self::InvalidPattern { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
