//! Logging initialization for `Oshsharohi`
//!
//! Human or JSON output on stderr. `OSHSHAROHI_LOG_LEVEL` wins over the
//! verbosity flags when it holds a valid filter.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable overriding the log filter.
pub const LOG_LEVEL_ENV: &str = "OSHSHAROHI_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON.
    Json,
}

/// Filter directive for the given flags.
///
/// `quiet` drops everything below `error`; otherwise each `-v` raises the
/// level one step from `warn`, saturating at `trace`.
#[must_use]
pub const fn filter_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn use_ansi(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(format: LogFormat, verbosity: u8, quiet: bool, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity, quiet)));

    // module paths only help once someone is debugging
    let show_target = verbosity >= 2;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(show_target)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Human => {
            let _ = builder.with_ansi(use_ansi(color)).try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
