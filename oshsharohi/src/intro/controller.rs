//! Cockpit gate and intro orchestration
//!
//! The controller shows the gate on the first page load of a session and
//! plays the intro timeline once a user gesture unlocks it. Every DOM
//! mutation goes through the [`Surface`]; missing elements are skipped.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use oshsharohi_core::config::schema::{IntroConfig, IntroCue};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SequenceError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;
use crate::sequence::gauge::{DialGeometry, GAUGE_SVG, GaugeReading, SPEED_ELEMENT};
use crate::sequence::{
    FRAME_INTERVAL, RunContext, SequenceHandle, SequenceStep, Ticker, TimedSequencer,
};
use crate::surface::{AudioSink, ElementId, RenderInstruction, Surface};

use super::gate::GateState;
use super::timeline::{IntroStage, IntroTimeline, TimelineEntry};
use super::wind::spawn_wind;

pub const INTRO_OVERLAY: &str = "intro-overlay";
pub const COCKPIT_OVERLAY: &str = "cockpit-overlay";
pub const BODY: &str = "body";
pub const LOADER: &str = "intro-loader";
pub const STRIPES: &str = ".intro-stripes";
pub const STRIPE: &str = ".stripe";
pub const LOGO: &str = ".intro-logo";
pub const LOGO_WHITE: &str = ".intro-logo-white";
pub const PRESENTER: &str = ".intro-bracu";
pub const LINE: &str = ".intro-line";

/// Optional collaborators of an [`IntroController`].
#[derive(Default)]
pub struct IntroOptions {
    /// The soundtrack; `None` when the page has no audio element
    pub audio: Option<Arc<dyn AudioSink>>,
    /// Event sink; defaults to discarding
    pub events: Option<Arc<EventEmitter>>,
    /// Replaces the table derived from the configuration
    pub timeline: Option<IntroTimeline>,
    /// Fixed seed for wind streaks
    pub wind_seed: Option<u64>,
}

/// State shared with the step actions of a run.
struct IntroShared {
    config: IntroConfig,
    timeline: IntroTimeline,
    surface: Arc<dyn Surface>,
    audio: Option<Arc<dyn AudioSink>>,
    events: Arc<EventEmitter>,
    stage: Mutex<IntroStage>,
    wind: Mutex<Option<Ticker>>,
    /// Runs past the end of the run; stopped only by [`IntroController::cancel`]
    fade: Mutex<Option<Ticker>>,
    fade_cancel: CancellationToken,
    wind_seed: Option<u64>,
}

impl IntroShared {
    fn set_stage(&self, stage: IntroStage) {
        let mut current = self.stage.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = %*current, to = %stage, "intro stage");
        *current = stage;
    }

    fn stage(&self) -> IntroStage {
        *self.stage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies what is present and reports it as one `Rendered` event.
    fn render(&self, instructions: Vec<RenderInstruction>) {
        let applied: Vec<RenderInstruction> = instructions
            .into_iter()
            .filter(|i| self.surface.apply_if_present(i.clone()))
            .collect();
        if !applied.is_empty() {
            self.events.emit(Event::Rendered {
                timestamp: Utc::now(),
                instructions: applied,
            });
        }
    }

    fn start_audio(&self) -> bool {
        let Some(audio) = &self.audio else {
            debug!("no intro audio, continuing silently");
            return false;
        };
        audio.set_volume(self.config.audio_volume);
        audio.rewind();
        match audio.play() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "intro audio did not start");
                metrics::record_audio_failure();
                false
            }
        }
    }

    fn stop_wind(&self) {
        if let Some(ticker) = self
            .wind
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            ticker.stop();
        }
    }

    fn fire(&self, entry: TimelineEntry, ctx: &RunContext) {
        let overlay = INTRO_OVERLAY;
        match entry.cue {
            IntroCue::Launch => {
                let ticker = spawn_wind(
                    ctx,
                    Arc::clone(&self.surface),
                    self.config.wind,
                    self.wind_seed,
                );
                *self.wind.lock().unwrap_or_else(PoisonError::into_inner) = Some(ticker);
                self.start_gauge(ctx);
            }
            IntroCue::RemoveGate => {
                self.render(vec![RenderInstruction::remove(COCKPIT_OVERLAY)]);
            }
            IntroCue::Engulf => {
                self.stop_wind();
                self.render(vec![
                    RenderInstruction::add_class(LOADER, "hidden"),
                    RenderInstruction::add_class(STRIPES, "engulf"),
                    RenderInstruction::add_class(STRIPE, "engulf"),
                    RenderInstruction::add_class(overlay, "dark-bg"),
                    RenderInstruction::add_class(overlay, "shake"),
                ]);
            }
            IntroCue::SettleShake => {
                self.render(vec![RenderInstruction::remove_class(overlay, "shake")]);
            }
            IntroCue::LogoReveal => {
                self.render(vec![
                    RenderInstruction::add_class(LOGO, "visible"),
                    RenderInstruction::add_class(PRESENTER, "inverted"),
                    RenderInstruction::add_class(LOGO_WHITE, "inverted"),
                    RenderInstruction::add_class(overlay, "shake"),
                ]);
            }
            IntroCue::LineReveal => {
                self.render(vec![RenderInstruction::add_class(LINE, "visible")]);
            }
            IntroCue::FadeOut => {
                self.fade_audio();
                self.render(vec![RenderInstruction::add_class(overlay, "fade-out")]);
            }
            IntroCue::Remove => {
                self.stop_wind();
                self.render(vec![RenderInstruction::remove(overlay)]);
                metrics::record_intro_finished();
            }
            IntroCue::ReleaseScroll => {
                self.render(vec![
                    RenderInstruction::ScrollTo {
                        top: 0.0,
                        smooth: false,
                    },
                    RenderInstruction::set_style(BODY, "overflow", ""),
                ]);
            }
        }

        let stage = IntroStage::entered_by(entry.cue);
        if let Some(stage) = stage {
            self.set_stage(stage);
        }
        self.events
            .emit(Event::cue_fired(entry.cue, entry.offset_ms, stage));
    }

    fn start_gauge(&self, ctx: &RunContext) {
        if !self.surface.contains(&ElementId::new(SPEED_ELEMENT)) {
            debug!("no speed readout, gauge skipped");
            return;
        }
        let config = self.config.gauge;
        let geometry = DialGeometry::default();
        if self.surface.contains(&ElementId::new(GAUGE_SVG)) {
            self.surface.apply_all(geometry.face(config.dial_max));
        }

        let surface = Arc::clone(&self.surface);
        ctx.spawn_ticker(FRAME_INTERVAL, move |elapsed| {
            let reading = GaugeReading::at(elapsed.as_secs_f64() * 1000.0, &config, &geometry);
            surface.apply_present(reading.render());
            if reading.is_finished() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
    }

    /// Steps the volume down each interval, then pauses at silence. The
    /// fade keeps going after the last cue.
    fn fade_audio(&self) {
        let Some(audio) = self.audio.clone() else {
            return;
        };
        let step = self.config.audio_fade_step;
        let interval = Duration::from_millis(self.config.audio_fade_interval_ms.max(1));
        let ticker = Ticker::spawn(
            Arc::from("intro-audio-fade"),
            interval,
            self.fade_cancel.child_token(),
            move |_| {
                let volume = audio.volume();
                if volume > step {
                    audio.set_volume(volume - step);
                    ControlFlow::Continue(())
                } else {
                    audio.set_volume(0.0);
                    audio.pause();
                    ControlFlow::Break(())
                }
            },
        );
        *self.fade.lock().unwrap_or_else(PoisonError::into_inner) = Some(ticker);
    }

    fn fade_ticker(&self) -> Option<Ticker> {
        self.fade
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Plays the intro at most once per session.
pub struct IntroController {
    shared: Arc<IntroShared>,
    gate: GateState,
    sequencer: TimedSequencer,
    skipped: bool,
    unlocked: AtomicBool,
    run: Mutex<Option<SequenceHandle>>,
}

impl std::fmt::Debug for IntroController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntroController")
            .field("stage", &self.stage())
            .field("gate", &self.gate)
            .field("unlocked", &self.is_unlocked())
            .finish_non_exhaustive()
    }
}

impl IntroController {
    /// Sets up the page for the intro.
    ///
    /// When the gate flag is already set, the gate and intro UI are hidden
    /// and removed immediately and nothing else happens: no sequence, no
    /// audio. Otherwise the gate stays up with page scrolling locked until
    /// [`attempt_unlock`](Self::attempt_unlock).
    #[must_use]
    pub fn new(
        config: IntroConfig,
        gate: GateState,
        surface: Arc<dyn Surface>,
        options: IntroOptions,
    ) -> Self {
        let timeline = options
            .timeline
            .unwrap_or_else(|| IntroTimeline::from_config(&config.timeline));
        let events = options
            .events
            .unwrap_or_else(|| Arc::new(EventEmitter::noop()));
        let skipped = gate.is_seen();

        let shared = Arc::new(IntroShared {
            timeline,
            surface,
            audio: options.audio,
            events,
            stage: Mutex::new(IntroStage::Idle),
            wind: Mutex::new(None),
            fade: Mutex::new(None),
            fade_cancel: CancellationToken::new(),
            wind_seed: options.wind_seed,
            config,
        });

        let top = RenderInstruction::ScrollTo {
            top: 0.0,
            smooth: false,
        };
        if skipped {
            shared.surface.apply_present(vec![
                top,
                RenderInstruction::set_style(COCKPIT_OVERLAY, "display", "none"),
                RenderInstruction::set_style(INTRO_OVERLAY, "display", "none"),
                RenderInstruction::remove(INTRO_OVERLAY),
                RenderInstruction::set_style(BODY, "overflow", ""),
            ]);
            shared.set_stage(IntroStage::Skipped);
            metrics::record_intro_skip();
            shared.events.emit(Event::IntroSkipped {
                timestamp: Utc::now(),
            });
            info!("intro already seen this session, skipped");
        } else {
            shared.surface.apply_present(vec![
                top,
                RenderInstruction::set_style(BODY, "overflow", "hidden"),
            ]);
            shared.set_stage(IntroStage::GateShown);
            shared.events.emit(Event::GateShown {
                timestamp: Utc::now(),
                session_key: shared.config.session_key.clone(),
            });
            info!("cockpit gate shown");
        }

        Self {
            shared,
            gate,
            sequencer: TimedSequencer::new("intro"),
            skipped,
            unlocked: AtomicBool::new(false),
            run: Mutex::new(None),
        }
    }

    /// Starts the intro in response to a user gesture.
    ///
    /// Only the first call on a page whose gate is up does anything; it
    /// tries the audio, stores the session flag, hides the gate and starts
    /// the timeline. Returns whether this call started the run.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoRuntime`] when called outside a tokio
    /// runtime. The gate flag has been written by then.
    pub fn attempt_unlock(&self) -> Result<bool, SequenceError> {
        if self.skipped {
            debug!("unlock ignored, intro already seen");
            return Ok(false);
        }
        if self.unlocked.swap(true, Ordering::SeqCst) {
            debug!("unlock ignored, intro already started");
            return Ok(false);
        }

        let shared = &self.shared;
        let audio_started = shared.start_audio();
        shared.set_stage(IntroStage::AudioStarted);

        if let Err(e) = self.gate.mark_seen() {
            warn!(error = %e, "failed to persist intro flag");
        }

        shared.render(vec![
            RenderInstruction::add_class(COCKPIT_OVERLAY, "hidden"),
            RenderInstruction::set_style(BODY, "overflow", "hidden"),
            RenderInstruction::ScrollTo {
                top: 0.0,
                smooth: false,
            },
        ]);

        let steps = shared
            .timeline
            .entries()
            .iter()
            .map(|&entry| {
                let shared = Arc::clone(shared);
                SequenceStep::new(entry.offset_ms, entry.cue.as_str(), move |ctx| {
                    shared.fire(entry, ctx);
                })
            })
            .collect();
        let handle = self.sequencer.run(steps)?;
        *self.run.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        metrics::record_intro_unlock();
        shared.events.emit(Event::IntroUnlocked {
            timestamp: Utc::now(),
            audio_started,
        });
        info!(audio_started, "intro unlocked");
        Ok(true)
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> IntroStage {
        self.shared.stage()
    }

    /// Whether an unlock has been accepted.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    /// Whether the gate flag was already set when the page loaded.
    #[must_use]
    pub const fn was_skipped(&self) -> bool {
        self.skipped
    }

    #[must_use]
    pub fn timeline(&self) -> &IntroTimeline {
        &self.shared.timeline
    }

    /// Handle of the running (or finished) intro, once unlocked.
    #[must_use]
    pub fn handle(&self) -> Option<SequenceHandle> {
        self.run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stops the intro where it is. Applied effects stay; pending cues,
    /// wind, gauge and audio fade stop.
    pub fn cancel(&self) {
        let Some(handle) = self.handle() else {
            return;
        };
        self.shared.fade_cancel.cancel();
        if handle.is_finished() || handle.is_cancelled() {
            return;
        }
        handle.cancel();
        self.shared.stop_wind();
        self.shared.events.emit(Event::SequenceCancelled {
            timestamp: Utc::now(),
            sequence: self.sequencer.label().to_owned(),
            fired: handle.fired(),
            total: handle.total(),
        });
    }

    /// Waits for the intro run and the audio fade to end. Returns at once
    /// if it never started.
    pub async fn completed(&self) {
        if let Some(handle) = self.handle() {
            handle.completed().await;
        }
        if let Some(fade) = self.shared.fade_ticker() {
            fade.stopped().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::intro::gate::{MemorySessionStore, SessionStore};
    use crate::surface::{RecordingAudio, RecordingSurface};
    use oshsharohi_core::config::schema::INTRO_SEEN_KEY;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingStore {
        inner: MemorySessionStore,
        writes: AtomicUsize,
    }

    impl SessionStore for CountingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }
    }

    fn build(
        config: IntroConfig,
        store: Arc<dyn SessionStore>,
    ) -> (IntroController, Arc<RecordingSurface>, Arc<RecordingAudio>) {
        let surface = Arc::new(RecordingSurface::permissive());
        let audio = Arc::new(RecordingAudio::new());
        let controller = IntroController::new(
            config,
            GateState::load(store, INTRO_SEEN_KEY),
            surface.clone(),
            IntroOptions {
                audio: Some(audio.clone()),
                wind_seed: Some(3),
                ..IntroOptions::default()
            },
        );
        (controller, surface, audio)
    }

    fn setup(seen: bool) -> (IntroController, Arc<RecordingSurface>, Arc<RecordingAudio>) {
        let store = Arc::new(MemorySessionStore::new());
        if seen {
            store.set(INTRO_SEEN_KEY, "true").unwrap();
        }
        build(IntroConfig::default(), store)
    }

    #[test]
    fn test_fresh_session_shows_gate() {
        let (controller, surface, audio) = setup(false);
        assert_eq!(controller.stage(), IntroStage::GateShown);
        assert_eq!(surface.style(BODY, "overflow").as_deref(), Some("hidden"));
        assert!(controller.handle().is_none());
        assert_eq!(audio.play_attempts(), 0);
    }

    #[test]
    fn test_seen_session_skips_everything() {
        let (controller, surface, audio) = setup(true);
        assert_eq!(controller.stage(), IntroStage::Skipped);
        assert!(controller.was_skipped());
        assert!(surface.was_removed(INTRO_OVERLAY));
        assert_eq!(
            surface.style(COCKPIT_OVERLAY, "display").as_deref(),
            Some("none")
        );
        assert!(!controller.attempt_unlock().unwrap());
        assert_eq!(audio.play_attempts(), 0);
        assert!(controller.handle().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_runs_full_timeline() {
        let (controller, surface, audio) = setup(false);
        assert!(controller.attempt_unlock().unwrap());
        assert!(!controller.attempt_unlock().unwrap());
        assert_eq!(controller.stage(), IntroStage::AudioStarted);
        assert!(surface.has_class(COCKPIT_OVERLAY, "hidden"));

        controller.completed().await;

        assert_eq!(controller.stage(), IntroStage::Removed);
        assert!(surface.was_removed(INTRO_OVERLAY));
        assert!(surface.was_removed(COCKPIT_OVERLAY));
        assert!(surface.has_class(LOGO, "visible"));
        assert!(surface.has_class(LINE, "visible"));
        assert!(!surface.has_class(INTRO_OVERLAY, "shake"));
        assert_eq!(surface.text(SPEED_ELEMENT).as_deref(), Some("120"));
        assert_eq!(surface.style(BODY, "overflow").as_deref(), Some(""));
        assert!(audio.volume().abs() < f64::EPSILON);
        assert_eq!(audio.pauses(), 1);
        assert_eq!(audio.play_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_pending_cues() {
        let (controller, surface, _audio) = setup(false);
        controller.attempt_unlock().unwrap();
        tokio::time::sleep(Duration::from_millis(6200)).await;
        controller.cancel();
        controller.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(controller.stage(), IntroStage::Engulf);
        assert!(!surface.has_class(LOGO, "visible"));
        assert!(!surface.was_removed(INTRO_OVERLAY));
        assert!(controller.handle().unwrap().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_unlock_writes_nothing_and_keeps_run() {
        let store = Arc::new(CountingStore::default());
        let (controller, _surface, audio) = build(IntroConfig::default(), store.clone());

        assert!(controller.attempt_unlock().unwrap());
        let first = controller.handle().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!controller.attempt_unlock().unwrap());

        let second = controller.handle().unwrap();
        assert_eq!(second.started_at(), first.started_at());
        assert!(tokio::time::Instant::now() > first.started_at());
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(audio.play_attempts(), 1);
        controller.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_volume_fade_finishes_after_last_cue() {
        // twenty 200 ms steps from 9800 ms outlast the last cue at 11800 ms
        let config = IntroConfig {
            audio_volume: 1.0,
            audio_fade_interval_ms: 200,
            ..IntroConfig::default()
        };
        let (controller, _surface, audio) = build(config, Arc::new(MemorySessionStore::new()));
        controller.attempt_unlock().unwrap();

        controller.handle().unwrap().completed().await;
        assert!(audio.is_playing());
        assert!(audio.volume() > 0.0);

        controller.completed().await;
        assert_eq!(audio.pauses(), 1);
        assert!(!audio.is_playing());
        assert!(audio.volume().abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_fade_left_running() {
        let config = IntroConfig {
            audio_volume: 1.0,
            audio_fade_interval_ms: 200,
            ..IntroConfig::default()
        };
        let (controller, _surface, audio) = build(config, Arc::new(MemorySessionStore::new()));
        controller.attempt_unlock().unwrap();
        controller.handle().unwrap().completed().await;

        controller.cancel();
        controller.completed().await;
        let volume = audio.volume();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!((audio.volume() - volume).abs() < f64::EPSILON);
        assert_eq!(audio.pauses(), 0);
    }
}
