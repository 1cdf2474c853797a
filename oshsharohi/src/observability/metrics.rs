//! Metrics for `Oshsharohi`
//!
//! Counters are recorded through the `metrics` facade; without an installed
//! recorder every call is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::OshsharohiError;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Sequence labels the runtime itself uses. Anything else is reported as
/// `"other"` so host-supplied labels cannot grow the label set.
const KNOWN_SEQUENCES: [&str; 6] = [
    "intro",
    "same-page-flash",
    "page-exit",
    "page-enter",
    "reveal",
    "counters",
];

/// Navigation kinds used as the `kind` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    SamePage,
    CrossPage,
    Immediate,
    Fragment,
}

impl NavigationKind {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SamePage => "same_page",
            Self::CrossPage => "cross_page",
            Self::Immediate => "immediate",
            Self::Fragment => "fragment",
        }
    }
}

/// Maps a sequence label onto the bounded label set.
#[must_use]
pub fn sanitize_sequence_label(label: &str) -> &str {
    if KNOWN_SEQUENCES.contains(&label) {
        label
    } else {
        "other"
    }
}

/// Installs the global recorder, with a Prometheus listener on
/// `127.0.0.1:<port>` when `port` is given.
///
/// # Errors
///
/// Returns `OshsharohiError::Io` if the recorder or listener cannot be
/// installed.
pub fn init_metrics(port: Option<u16>) -> Result<(), OshsharohiError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    let installed = match port {
        Some(p) => PrometheusBuilder::new()
            .with_http_listener(([127, 0, 0, 1], p))
            .install(),
        None => PrometheusBuilder::new().install_recorder().map(|_| ()),
    };
    installed.map_err(|e| OshsharohiError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "oshsharohi_intro_unlocks_total",
        "Intro runs started by a user gesture"
    );
    describe_counter!(
        "oshsharohi_intro_skips_total",
        "Page loads where the intro had already been seen"
    );
    describe_counter!(
        "oshsharohi_sequence_steps_total",
        "Timed sequence steps executed, by sequence"
    );
    describe_counter!(
        "oshsharohi_sequence_cancellations_total",
        "Timed sequences cancelled before their last step"
    );
    describe_counter!("oshsharohi_reveals_total", "Elements revealed on scroll");
    describe_counter!(
        "oshsharohi_navigations_total",
        "Intercepted link navigations, by kind"
    );
    describe_counter!(
        "oshsharohi_audio_failures_total",
        "Intro audio playback attempts that were refused"
    );
    describe_gauge!(
        "oshsharohi_intro_active",
        "Whether an intro run is in progress (1 = running)"
    );
}

pub fn record_intro_unlock() {
    counter!("oshsharohi_intro_unlocks_total").increment(1);
    gauge!("oshsharohi_intro_active").set(1.0);
}

pub fn record_intro_skip() {
    counter!("oshsharohi_intro_skips_total").increment(1);
}

pub fn record_intro_finished() {
    gauge!("oshsharohi_intro_active").set(0.0);
}

pub fn record_sequence_step(sequence: &str) {
    let label = sanitize_sequence_label(sequence).to_owned();
    counter!("oshsharohi_sequence_steps_total", "sequence" => label).increment(1);
}

pub fn record_sequence_cancelled(sequence: &str) {
    let label = sanitize_sequence_label(sequence).to_owned();
    counter!("oshsharohi_sequence_cancellations_total", "sequence" => label).increment(1);
}

/// Records `count` elements revealed in one visibility batch.
pub fn record_reveals(count: usize) {
    counter!("oshsharohi_reveals_total").increment(u64::try_from(count).unwrap_or(u64::MAX));
}

pub fn record_navigation(kind: NavigationKind) {
    counter!("oshsharohi_navigations_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_audio_failure() {
    counter!("oshsharohi_audio_failures_total").increment(1);
}
