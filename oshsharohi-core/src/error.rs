//! Configuration errors shared by the runtime and the CLI.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Why a site configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text is not valid YAML or does not fit [`SiteConfig`](crate::config::schema::SiteConfig)
    #[error(
        "parse error in {path}{}: {message}",
        .line.map_or_else(String::new, |l| format!(" (line {l})"))
    )]
    ParseError {
        path: PathBuf,
        /// 1-based, when the parser reports one
        line: Option<usize>,
        message: String,
    },

    /// The configuration parsed but breaks at least one rule
    #[error("validation failed for {path}")]
    ValidationError {
        path: String,
        errors: Vec<ValidationIssue>,
    },

    #[error("file not found: {path}")]
    MissingFile { path: PathBuf },

    /// A loader limit or setting was exceeded, e.g. the size cap
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    /// `${VAR:?message}` referenced an unset variable
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet { var: String, location: String },

    /// Summary returned by `config validate` after reporting every file
    #[error("{count} file(s) failed validation")]
    ValidationFailed { count: usize },
}

// ============================================================================
// Validation Types
// ============================================================================

/// One finding of the validator, addressed by dotted field path
/// (`intro.timeline.engulf_ms`).
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {} at {}", self.message, self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The configuration is rejected
    Error,
    /// Reported; the configuration is still loaded
    Warning,
}
