//! `config validate`.

use oshsharohi_core::error::ConfigError;

use crate::cli::args::{ConfigValidateArgs, OutputFormat};
use crate::config::loader::ConfigLoader;
use crate::error::OshsharohiError;

/// Validates each file, reporting every failure before returning.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationFailed`] if any file is invalid, or has
/// warnings under `--strict`.
pub fn validate(args: &ConfigValidateArgs) -> Result<(), OshsharohiError> {
    let loader = ConfigLoader::with_defaults();
    let mut failed = 0usize;

    for path in &args.files {
        let (ok, report) = match loader.load_file(path) {
            Ok(result) => {
                let warnings: Vec<String> =
                    result.warnings.iter().map(ToString::to_string).collect();
                (!(args.strict && !warnings.is_empty()), warnings)
            }
            Err(ConfigError::ValidationError { errors, .. }) => {
                (false, errors.iter().map(ToString::to_string).collect())
            }
            Err(e) => (false, vec![e.to_string()]),
        };
        if !ok {
            failed += 1;
        }

        match args.format {
            OutputFormat::Human => {
                let status = if ok { "ok" } else { "FAILED" };
                println!("{}: {status}", path.display());
                for line in &report {
                    println!("  {line}");
                }
            }
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "file": path.display().to_string(),
                    "valid": ok,
                    "messages": report,
                })
            ),
        }
    }

    if failed > 0 {
        return Err(ConfigError::ValidationFailed { count: failed }.into());
    }
    Ok(())
}
