//! `intro run` and `intro timeline`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::args::{IntroRunArgs, IntroTimelineArgs, OutputFormat};
use crate::error::OshsharohiError;
use crate::intro::{
    FileSessionStore, GateState, IntroController, IntroOptions, IntroTimeline,
    MemorySessionStore, SessionStore,
};
use crate::observability::EventEmitter;
use crate::surface::{AudioSink, RecordingAudio, RecordingSurface};

use super::load_config;

/// Plays the intro in real time.
///
/// # Errors
///
/// Returns an error if the configuration, session file or events file
/// cannot be loaded, or the sequence cannot be scheduled.
pub async fn run(args: &IntroRunArgs, cancel: CancellationToken) -> Result<(), OshsharohiError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }
    let config = load_config(args.config.as_deref())?;

    let store: Arc<dyn SessionStore> = match &args.session_file {
        Some(path) => Arc::new(FileSessionStore::open(path)?),
        None => Arc::new(MemorySessionStore::new()),
    };
    let gate = GateState::load(store, &config.intro.session_key);

    let events = Arc::new(match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::stderr(),
    });
    let audio: Arc<dyn AudioSink> = Arc::new(if args.block_audio {
        RecordingAudio::blocked()
    } else {
        RecordingAudio::new()
    });

    let mut timeline = IntroTimeline::from_config(&config.intro.timeline);
    if let Some(cue) = args.until {
        timeline = timeline.until(cue);
    }

    let surface = Arc::new(RecordingSurface::permissive());
    let start = tokio::time::Instant::now();
    let controller = IntroController::new(
        config.intro.clone(),
        gate,
        surface.clone(),
        IntroOptions {
            audio: Some(audio),
            events: Some(events),
            timeline: Some(timeline),
            wind_seed: args.seed,
        },
    );

    if controller.was_skipped() {
        info!("intro already seen; remove the session file to play it again");
    } else {
        controller.attempt_unlock()?;
        tokio::select! {
            () = controller.completed() => {}
            () = cancel.cancelled() => {
                controller.cancel();
                controller.completed().await;
            }
        }
        info!(stage = %controller.stage(), "intro finished");
    }

    if args.journal {
        for (at, instruction) in surface.journal() {
            let line = serde_json::json!({
                "at_ms": at.saturating_duration_since(start).as_millis(),
                "instruction": instruction,
            });
            println!("{line}");
        }
    }
    Ok(())
}

/// Prints the cue table.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn timeline(args: &IntroTimelineArgs) -> Result<(), OshsharohiError> {
    let config = load_config(args.config.as_deref())?;
    let mut timeline = IntroTimeline::from_config(&config.intro.timeline);
    if let Some(cue) = args.until {
        timeline = timeline.until(cue);
    }

    match args.format {
        OutputFormat::Human => {
            for entry in timeline.entries() {
                let stage = timeline.stage_at(entry.offset_ms);
                println!("{:>7} ms  {:<15} {stage}", entry.offset_ms, entry.cue.as_str());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        }
    }
    Ok(())
}
