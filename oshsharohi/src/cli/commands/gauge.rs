//! `gauge`: readings of the speed ramp.

use crate::cli::args::{GaugeArgs, OutputFormat};
use crate::error::OshsharohiError;
use crate::sequence::gauge::{DialGeometry, GaugeReading};

use super::load_config;

/// Prints a reading every `step_ms`, always including the final frame.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run(args: &GaugeArgs) -> Result<(), OshsharohiError> {
    let config = load_config(args.config.as_deref())?;
    let gauge = config.intro.gauge;
    let geometry = DialGeometry::default();

    let mut samples: Vec<u64> = (0..gauge.duration_ms).step_by(step(args.step_ms)).collect();
    samples.push(gauge.duration_ms);

    for elapsed in samples {
        #[allow(clippy::cast_precision_loss)]
        let reading = GaugeReading::at(elapsed as f64, &gauge, &geometry);
        match args.format {
            OutputFormat::Human => println!(
                "{elapsed:>6} ms  {:>3} km/h  dial {:>5.1}%  offset {:>7.2}",
                reading.displayed,
                reading.dial_ratio * 100.0,
                reading.stroke_offset
            ),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "elapsed_ms": elapsed,
                    "displayed": reading.displayed,
                    "dial_ratio": reading.dial_ratio,
                    "stroke_offset": reading.stroke_offset,
                })
            ),
        }
    }
    Ok(())
}

fn step(step_ms: u64) -> usize {
    usize::try_from(step_ms.max(1)).unwrap_or(usize::MAX)
}
