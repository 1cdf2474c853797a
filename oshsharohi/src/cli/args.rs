//! CLI argument definitions
//!
//! All Clap derive structs for `oshsharohi` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::schema::IntroCue;

// ============================================================================
// Root CLI
// ============================================================================

/// Intro, reveal and navigation runtime for the Oshsharohi site.
#[derive(Parser, Debug)]
#[command(name = "oshsharohi", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "OSHSHAROHI_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "OSHSHAROHI_LOG_FORMAT")]
    pub log_format: OutputFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play or inspect the cockpit intro.
    Intro(IntroCommand),

    /// Print the speed gauge readings over the ramp.
    Gauge(GaugeArgs),

    /// Work with site configuration files.
    Config(ConfigCommand),

    /// Simulate a link click and print the resulting transition.
    Navigate(NavigateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Intro Command
// ============================================================================

#[derive(Args, Debug)]
pub struct IntroCommand {
    #[command(subcommand)]
    pub subcommand: IntroSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum IntroSubcommand {
    /// Unlock the gate and play the intro in real time against a recording
    /// surface.
    Run(IntroRunArgs),

    /// Print the intro cue table.
    Timeline(IntroTimelineArgs),
}

#[derive(Args, Debug)]
pub struct IntroRunArgs {
    /// Path to YAML site configuration.
    #[arg(short, long, env = "OSHSHAROHI_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON file holding the session flags; persists the gate across runs.
    #[arg(long, env = "OSHSHAROHI_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Write JSONL events to this file instead of stderr.
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Stop after this cue fires.
    #[arg(long)]
    pub until: Option<IntroCue>,

    /// Behave as if autoplay were blocked.
    #[arg(long)]
    pub block_audio: bool,

    /// Seed for the wind streaks.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print every applied render instruction as JSONL on stdout.
    #[arg(long)]
    pub journal: bool,

    /// Serve Prometheus metrics on this port while running.
    #[arg(long, env = "OSHSHAROHI_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct IntroTimelineArgs {
    /// Path to YAML site configuration.
    #[arg(short, long, env = "OSHSHAROHI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only list cues up to and including this one.
    #[arg(long)]
    pub until: Option<IntroCue>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Gauge / Config / Navigate
// ============================================================================

#[derive(Args, Debug)]
pub struct GaugeArgs {
    /// Path to YAML site configuration.
    #[arg(short, long, env = "OSHSHAROHI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sampling interval in milliseconds.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub step_ms: u64,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub subcommand: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Validate configuration files.
    Validate(ConfigValidateArgs),
}

#[derive(Args, Debug)]
pub struct ConfigValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Link target, as written in the `href` attribute.
    pub href: String,

    /// Path of the page the click happens on.
    #[arg(long, default_value = "/index.html")]
    pub current: String,

    /// Path to YAML site configuration.
    #[arg(short, long, env = "OSHSHAROHI_CONFIG")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Completions / Version
// ============================================================================

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intro_run_defaults() {
        let cli = Cli::try_parse_from(["oshsharohi", "intro", "run"]).unwrap();
        let Commands::Intro(cmd) = cli.command else {
            panic!("expected intro command");
        };
        let IntroSubcommand::Run(args) = cmd.subcommand else {
            panic!("expected intro run");
        };
        assert!(args.until.is_none());
        assert!(!args.block_audio);
        assert!(!args.journal);
    }

    #[test]
    fn test_until_takes_cue_names() {
        let cli =
            Cli::try_parse_from(["oshsharohi", "intro", "run", "--until", "logo-reveal"]).unwrap();
        let Commands::Intro(IntroCommand {
            subcommand: IntroSubcommand::Run(args),
        }) = cli.command
        else {
            panic!("expected intro run");
        };
        assert_eq!(args.until, Some(IntroCue::LogoReveal));
    }

    #[test]
    fn test_gauge_step_must_be_positive() {
        assert!(Cli::try_parse_from(["oshsharohi", "gauge", "--step-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["oshsharohi", "gauge", "--step-ms", "250"]).is_ok());
    }

    #[test]
    fn test_config_validate_requires_files() {
        assert!(Cli::try_parse_from(["oshsharohi", "config", "validate"]).is_err());
        let cli = Cli::try_parse_from([
            "oshsharohi",
            "config",
            "validate",
            "a.yaml",
            "--strict",
        ])
        .unwrap();
        let Commands::Config(ConfigCommand {
            subcommand: ConfigSubcommand::Validate(args),
        }) = cli.command
        else {
            panic!("expected config validate");
        };
        assert!(args.strict);
        assert_eq!(args.files.len(), 1);
    }

    #[test]
    fn test_navigate_default_current() {
        let cli = Cli::try_parse_from(["oshsharohi", "navigate", "team.html"]).unwrap();
        let Commands::Navigate(args) = cli.command else {
            panic!("expected navigate");
        };
        assert_eq!(args.current, "/index.html");
        assert_eq!(args.href, "team.html");
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "oshsharohi",
            "version",
            "-vv",
            "--color",
            "never",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.log_format, OutputFormat::Json);
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["oshsharohi", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
