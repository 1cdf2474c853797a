//! Configuration validation
//!
//! Semantic checks on a deserialized [`SiteConfig`]. All issues are
//! collected rather than stopping at the first.

use oshsharohi_core::config::schema::{
    CounterConfig, IntroConfig, NavigationConfig, RevealConfig, SiteConfig,
};
use oshsharohi_core::error::{Severity, ValidationIssue};

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `config`, collecting every error and warning.
    pub fn validate(&mut self, config: &SiteConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_intro(&config.intro);
        self.validate_reveal(&config.reveal);
        self.validate_counters(&config.counters);
        self.validate_navigation(&config.navigation);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_intro(&mut self, intro: &IntroConfig) {
        if intro.session_key.trim().is_empty() {
            self.add_error("intro.session_key", "session key cannot be empty");
        }
        if !(0.0..=1.0).contains(&intro.audio_volume) {
            self.add_error(
                "intro.audio_volume",
                &format!("volume {} must be within [0, 1]", intro.audio_volume),
            );
        }
        if !(intro.audio_fade_step > 0.0 && intro.audio_fade_step <= 1.0) {
            self.add_error("intro.audio_fade_step", "fade step must be in (0, 1]");
        }
        self.check_positive("intro.audio_fade_interval_ms", intro.audio_fade_interval_ms);

        let offsets = intro.timeline.stage_offsets();
        for pair in offsets.windows(2) {
            let ((prev, prev_ms), (cue, ms)) = (pair[0], pair[1]);
            if ms < prev_ms {
                self.add_error(
                    &format!("intro.timeline.{cue}_ms"),
                    &format!("{cue} at {ms} ms precedes {prev} at {prev_ms} ms"),
                );
            }
        }
        let timeline = &intro.timeline;
        if timeline.remove_gate_ms < timeline.launch_ms {
            self.add_error(
                "intro.timeline.remove_gate_ms",
                "gate removal precedes launch",
            );
        }
        if timeline.remove_gate_ms > timeline.engulf_ms {
            self.add_warning(
                "intro.timeline.remove_gate_ms",
                "cockpit is still attached when the stripes engulf",
            );
        }
        if timeline.engulf_ms.saturating_add(timeline.shake_ms) > timeline.logo_reveal_ms {
            self.add_warning(
                "intro.timeline.shake_ms",
                "first shake overlaps the logo reveal",
            );
        }

        let gauge = &intro.gauge;
        self.check_positive("intro.gauge.duration_ms", gauge.duration_ms);
        if gauge.dial_max == 0 {
            self.add_error("intro.gauge.dial_max", "dial maximum must be positive");
        } else if gauge.target > gauge.dial_max {
            self.add_warning(
                "intro.gauge.target",
                &format!(
                    "target {} exceeds dial maximum {}; the arc will stay full",
                    gauge.target, gauge.dial_max
                ),
            );
        }
        if gauge.duration_ms > timeline.engulf_ms.saturating_sub(timeline.launch_ms) {
            self.add_warning(
                "intro.gauge.duration_ms",
                "gauge is still ramping when the loader is hidden",
            );
        }

        let wind = &intro.wind;
        self.check_positive("intro.wind.interval_ms", wind.interval_ms);
        let widths = [
            self.check_finite("intro.wind.min_width_px", wind.min_width_px),
            self.check_finite("intro.wind.max_width_px", wind.max_width_px),
        ];
        if widths.iter().all(|ok| *ok)
            && (wind.min_width_px < 0.0 || wind.min_width_px > wind.max_width_px)
        {
            self.add_error(
                "intro.wind.min_width_px",
                "width range must satisfy 0 <= min <= max",
            );
        }
        let durations = [
            self.check_finite("intro.wind.min_duration_s", wind.min_duration_s),
            self.check_finite("intro.wind.max_duration_s", wind.max_duration_s),
        ];
        if durations.iter().all(|ok| *ok)
            && (wind.min_duration_s <= 0.0 || wind.min_duration_s > wind.max_duration_s)
        {
            self.add_error(
                "intro.wind.min_duration_s",
                "duration range must satisfy 0 < min <= max",
            );
        }
    }

    fn validate_reveal(&mut self, reveal: &RevealConfig) {
        self.check_threshold("reveal.threshold", reveal.threshold);
        self.check_positive("reveal.transition_ms", reveal.transition_ms);
        if self.check_finite("reveal.offset_px", reveal.offset_px) && reveal.offset_px < 0.0 {
            self.add_error("reveal.offset_px", "offset cannot be negative");
        }
    }

    fn validate_counters(&mut self, counters: &CounterConfig) {
        self.check_threshold("counters.threshold", counters.threshold);
        self.check_positive("counters.duration_ms", counters.duration_ms);
        if counters.spec_frames == 0 {
            self.add_error("counters.spec_frames", "frame count must be positive");
        }
    }

    fn validate_navigation(&mut self, nav: &NavigationConfig) {
        if nav.pulse_ms > nav.flash_hold_ms.saturating_add(nav.flash_fade_ms) {
            self.add_warning(
                "navigation.pulse_ms",
                "pulse outlasts the flash overlay",
            );
        }
        if nav.exit_delay_ms > 2000 {
            self.add_warning(
                "navigation.exit_delay_ms",
                "navigation is delayed by more than two seconds",
            );
        }
    }

    fn check_threshold(&mut self, path: &str, value: f64) {
        if !(value > 0.0 && value <= 1.0) {
            self.add_error(path, &format!("threshold {value} must be in (0, 1]"));
        }
    }

    /// Records an error and returns `false` for NaN or infinite values.
    fn check_finite(&mut self, path: &str, value: f64) -> bool {
        if value.is_finite() {
            return true;
        }
        self.add_error(path, &format!("{value} is not a finite number"));
        false
    }

    fn check_positive(&mut self, path: &str, value: u64) {
        if value == 0 {
            self.add_error(path, "duration must be positive");
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(config: &SiteConfig) -> ValidationResult {
        Validator::new().validate(config)
    }

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_defaults_are_clean() {
        let result = validate(&SiteConfig::default());
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_thresholds() {
        let mut config = SiteConfig::default();
        config.reveal.threshold = 0.0;
        config.counters.threshold = 1.5;
        let result = validate(&config);
        assert_eq!(paths(&result.errors), ["reveal.threshold", "counters.threshold"]);

        config.reveal.threshold = 1.0;
        config.counters.threshold = f64::NAN;
        assert_eq!(paths(&validate(&config).errors), ["counters.threshold"]);
    }

    #[test]
    fn test_stage_order() {
        let mut config = SiteConfig::default();
        config.intro.timeline.line_reveal_ms = 6500;
        let result = validate(&config);
        assert_eq!(paths(&result.errors), ["intro.timeline.line_reveal_ms"]);
        assert!(result.errors[0].message.contains("logo_reveal"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SiteConfig::default();
        config.intro.gauge.duration_ms = 0;
        config.intro.wind.interval_ms = 0;
        config.counters.spec_frames = 0;
        config.intro.wind.min_width_px = 300.0;
        assert_eq!(validate(&config).errors.len(), 4);
    }

    #[test]
    fn test_target_above_dial_max_warns() {
        let mut config = SiteConfig::default();
        config.intro.gauge.target = 200;
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(paths(&result.warnings), ["intro.gauge.target"]);
    }

    #[test]
    fn test_audio_volume_bounds() {
        let mut config = SiteConfig::default();
        config.intro.audio_volume = 0.0;
        assert!(validate(&config).is_valid());
        config.intro.audio_volume = 1.2;
        assert_eq!(paths(&validate(&config).errors), ["intro.audio_volume"]);
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        let mut config = SiteConfig::default();
        config.intro.wind.min_width_px = f64::NAN;
        config.intro.wind.max_duration_s = f64::INFINITY;
        config.intro.audio_volume = f64::NAN;
        config.intro.audio_fade_step = f64::NAN;
        config.reveal.offset_px = f64::NAN;
        config.reveal.threshold = f64::NAN;
        config.counters.threshold = f64::INFINITY;

        let result = validate(&config);
        let mut errors = paths(&result.errors);
        errors.sort_unstable();
        assert_eq!(
            errors,
            [
                "counters.threshold",
                "intro.audio_fade_step",
                "intro.audio_volume",
                "intro.wind.max_duration_s",
                "intro.wind.min_width_px",
                "reveal.offset_px",
                "reveal.threshold",
            ]
        );
    }

    #[test]
    fn test_nan_wind_range_from_yaml_rejected() {
        let config: SiteConfig =
            serde_yaml::from_str("intro:\n  wind:\n    max_width_px: .nan\n").unwrap();
        assert!(config.intro.wind.max_width_px.is_nan());
        assert_eq!(
            paths(&validate(&config).errors),
            ["intro.wind.max_width_px"]
        );
    }
}
