//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod config;
pub mod gauge;
pub mod intro;
pub mod navigate;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands, ConfigSubcommand, IntroSubcommand};
use crate::config::loader::ConfigLoader;
use crate::config::schema::SiteConfig;
use crate::error::OshsharohiError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), OshsharohiError> {
    match cli.command {
        Commands::Intro(cmd) => match cmd.subcommand {
            IntroSubcommand::Run(args) => intro::run(&args, cancel).await,
            IntroSubcommand::Timeline(args) => intro::timeline(&args),
        },
        Commands::Gauge(args) => gauge::run(&args),
        Commands::Config(cmd) => match cmd.subcommand {
            ConfigSubcommand::Validate(args) => config::validate(&args),
        },
        Commands::Navigate(args) => navigate::run(&args).await,
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads `path`, or the built-in defaults without one. Warnings are logged.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Arc<SiteConfig>, OshsharohiError> {
    let Some(path) = path else {
        return Ok(Arc::new(SiteConfig::default()));
    };
    tracing::info!(config = %path.display(), "loading configuration");
    let result = ConfigLoader::with_defaults().load_file(path)?;
    for warning in &result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    Ok(result.config)
}
