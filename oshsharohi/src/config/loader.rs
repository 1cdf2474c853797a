//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check and BOM strip
//! 2. Environment variable expansion (on raw text)
//! 3. YAML parsing and typed deserialization
//! 4. Validation
//! 5. Freeze with `Arc`

use std::path::Path;
use std::sync::Arc;

use oshsharohi_core::config::schema::SiteConfig;
use oshsharohi_core::error::ConfigError;
use serde_yaml::Value;
use tracing::debug;

use crate::config::validation::Validator;

/// Environment variable overriding the maximum configuration size.
pub const MAX_CONFIG_SIZE_ENV: &str = "OSHSHAROHI_MAX_CONFIG_SIZE";

const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum configuration size in bytes.
    pub max_config_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_config_size: env_or(MAX_CONFIG_SIZE_ENV, DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

/// A loaded and validated configuration.
#[derive(Debug)]
pub struct LoadResult {
    pub config: Arc<SiteConfig>,
    /// Substitution notices and validation warnings.
    pub warnings: Vec<LoadWarning>,
}

/// Non-fatal finding while loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    pub message: String,
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Loads YAML site configuration.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing or deserialization fails
    /// - Validation reports errors
    pub fn load_file(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(size)?;

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_from_str(&raw, path)
    }

    /// Loads and validates configuration text; `source` is used in messages.
    ///
    /// # Errors
    ///
    /// Same as [`load_file`](Self::load_file), minus the file access.
    pub fn load_from_str(&self, raw: &str, source: &Path) -> Result<LoadResult, ConfigError> {
        self.check_size(raw.len())?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw, source)?;
        let mut warnings = env_sub.warnings;

        let root: Value = serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
            path: source.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;

        let config = if root.is_null() {
            warnings.push(LoadWarning {
                message: "configuration is empty, using defaults".to_string(),
                location: Some(source.display().to_string()),
            });
            SiteConfig::default()
        } else {
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.display().to_string(),
                errors: result.errors,
            });
        }
        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        debug!(source = %source.display(), warnings = warnings.len(), "configuration loaded");
        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }

    fn check_size(&self, size: usize) -> Result<(), ConfigError> {
        if size > self.options.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{size} bytes"),
                expected: format!("at most {} bytes", self.options.max_config_size),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Environment substitution
// ============================================================================

type Lookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Expands `${VAR}` references in raw text.
///
/// - `${VAR}`: value, or empty with a warning when unset
/// - `${VAR:-default}`: `default` when unset
/// - `${VAR:?message}`: error when unset
/// - `$$`: literal `$`
struct EnvSubstitution {
    lookup: Lookup,
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    fn new() -> Self {
        Self::with_lookup(process_env)
    }

    fn with_lookup(lookup: Lookup) -> Self {
        Self {
            lookup,
            warnings: Vec::new(),
        }
    }

    fn substitute(&mut self, raw: &str, source: &Path) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    out.push('$');
                }
                Some('{') => {
                    chars.next();
                    let reference = VarRef::parse(&mut chars, source)?;
                    match ((self.lookup)(&reference.name), reference.fallback) {
                        (Some(value), _) => out.push_str(&value),
                        (None, Fallback::Default(default)) => out.push_str(&default),
                        (None, Fallback::Required(message)) => {
                            return Err(ConfigError::EnvVarNotSet {
                                var: reference.name,
                                location: if message.is_empty() {
                                    source.display().to_string()
                                } else {
                                    message
                                },
                            });
                        }
                        (None, Fallback::Empty) => self.warnings.push(LoadWarning {
                            message: format!(
                                "environment variable '{}' is not set, using empty string",
                                reference.name
                            ),
                            location: Some(source.display().to_string()),
                        }),
                    }
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

struct VarRef {
    name: String,
    fallback: Fallback,
}

impl VarRef {
    /// Parses the remainder of `${...}`, the opening brace already consumed.
    fn parse(
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        source: &Path,
    ) -> Result<Self, ConfigError> {
        let mut name = String::new();
        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(Self {
                        name,
                        fallback: Fallback::Empty,
                    });
                }
                ':' if matches!(chars.peek(), Some('-' | '?')) => {
                    let required = chars.next() == Some('?');
                    let rest = read_until_close(chars).ok_or_else(|| unclosed(&name, source))?;
                    let fallback = if required {
                        Fallback::Required(rest)
                    } else {
                        Fallback::Default(rest)
                    };
                    return Ok(Self { name, fallback });
                }
                _ => name.push(c),
            }
        }
        Err(unclosed(&name, source))
    }
}

/// Reads up to the matching `}`, keeping nested braces.
fn read_until_close(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut value = String::new();
    let mut depth = 1usize;
    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(value);
                }
            }
            _ => {}
        }
        value.push(c);
    }
    None
}

fn unclosed(name: &str, source: &Path) -> ConfigError {
    ConfigError::ParseError {
        path: source.to_path_buf(),
        line: None,
        message: format!("unclosed environment variable reference: ${{{name}"),
    }
}

/// Parses an environment variable, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
