//! Error types for `Oshsharohi`
//!
//! Nothing in the page runtime is fatal: effects degrade to "did not play".
//! These types cover the places where a caller still wants to know why,
//! and map CLI failures onto process exit codes.

use thiserror::Error;

pub use oshsharohi_core::error::{ConfigError, Severity, ValidationIssue};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `oshsharohi` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Sequencer error (no runtime to schedule on)
    pub const SEQUENCE_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `Oshsharohi` operations.
#[derive(Debug, Error)]
pub enum OshsharohiError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Timed sequence could not be scheduled
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Session storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OshsharohiError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Sequence(_) => ExitCode::SEQUENCE_ERROR,
            Self::Storage(_) | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
        }
    }
}

// ============================================================================
// Sequencer Errors
// ============================================================================

/// Errors raised when starting a timed sequence.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// `run` was called outside a tokio runtime
    #[error("no async runtime available to schedule sequence '{0}'")]
    NoRuntime(String),
}

// ============================================================================
// Audio Errors
// ============================================================================

/// Playback failures reported by an [`AudioSink`](crate::surface::AudioSink).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    /// The platform refused playback without a user gesture
    #[error("playback blocked by autoplay policy: {0}")]
    Blocked(String),

    /// No audio output is attached
    #[error("audio element unavailable")]
    Unavailable,
}

// ============================================================================
// Storage Errors
// ============================================================================

/// Session storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing file could not be read or written
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not a JSON object of strings
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
