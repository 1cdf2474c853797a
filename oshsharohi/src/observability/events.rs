//! Structured event stream for `Oshsharohi`
//!
//! Discrete, typed events emitted while the runtime plays sequences.
//! Events are written as newline-delimited JSON with a monotonically
//! increasing sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::intro::IntroStage;
use crate::observability::metrics::NavigationKind;
use crate::surface::RenderInstruction;

/// A discrete runtime event, tagged with `"type"` in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The cockpit gate is waiting for a user gesture.
    GateShown {
        timestamp: DateTime<Utc>,
        session_key: String,
    },

    /// The intro was already seen this session and was torn down.
    IntroSkipped { timestamp: DateTime<Utc> },

    /// A user gesture unlocked the intro.
    IntroUnlocked {
        timestamp: DateTime<Utc>,
        /// Whether the soundtrack started
        audio_started: bool,
    },

    /// An intro cue ran.
    CueFired {
        timestamp: DateTime<Utc>,
        cue: String,
        offset_ms: u64,
        /// Stage entered by this cue, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<IntroStage>,
    },

    /// A timed sequence was cancelled before its last step.
    SequenceCancelled {
        timestamp: DateTime<Utc>,
        sequence: String,
        fired: usize,
        total: usize,
    },

    /// A batch of render instructions reached the surface.
    Rendered {
        timestamp: DateTime<Utc>,
        instructions: Vec<RenderInstruction>,
    },

    /// An element was scheduled to reveal.
    RevealFired {
        timestamp: DateTime<Utc>,
        element: String,
        index: usize,
        delay_ms: u64,
    },

    /// A link click was intercepted.
    NavigationStarted {
        timestamp: DateTime<Utc>,
        href: String,
        kind: String,
    },
}

impl Event {
    /// `CueFired` stamped now.
    #[must_use]
    pub fn cue_fired(cue: impl ToString, offset_ms: u64, stage: Option<IntroStage>) -> Self {
        Self::CueFired {
            timestamp: Utc::now(),
            cue: cue.to_string(),
            offset_ms,
            stage,
        }
    }

    /// `NavigationStarted` stamped now.
    #[must_use]
    pub fn navigation_started(href: &str, kind: NavigationKind) -> Self {
        Self::NavigationStarted {
            timestamp: Utc::now(),
            href: href.to_owned(),
            kind: kind.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

/// Thread-safe, buffered JSONL event writer.
///
/// Each [`emit`](Self::emit) takes the next sequence number, writes one
/// line and flushes. Serialization and I/O failures are dropped.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter on stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter on stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates (or truncates) `path` and writes events to it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Writes `event` as one JSONL line.
    pub fn emit(&self, event: Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence, event };

        let Ok(line) = serde_json::to_string(&envelope) else {
            return;
        };
        if let Ok(mut w) = self.writer.lock() {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn lines(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cue_event_shape() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(Event::cue_fired("engulf", 6000, Some(IntroStage::Engulf)));
        emitter.emit(Event::cue_fired("settle_shake", 6500, None));

        let lines = tw.lines();
        assert_eq!(lines[0]["type"], "CueFired");
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[0]["cue"], "engulf");
        assert_eq!(lines[0]["offset_ms"], 6000);
        assert_eq!(lines[0]["stage"], "engulf");
        assert!(lines[1].get("stage").is_none());
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(emitter.event_count(), 2);
    }

    #[test]
    fn test_rendered_embeds_instructions() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(Event::Rendered {
            timestamp: Utc::now(),
            instructions: vec![RenderInstruction::add_class("intro-overlay", "shake")],
        });
        let lines = tw.lines();
        assert_eq!(lines[0]["instructions"][0]["op"], "add_class");
        assert_eq!(lines[0]["instructions"][0]["class"], "shake");
    }

    #[test]
    fn test_navigation_event_kind() {
        let event = Event::navigation_started("team.html", NavigationKind::CrossPage);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NavigationStarted");
        assert_eq!(json["kind"], "cross_page");
        assert_eq!(json["href"], "team.html");
    }

    #[test]
    fn test_noop_emitter_counts() {
        let emitter = EventEmitter::noop();
        emitter.emit(Event::IntroSkipped {
            timestamp: Utc::now(),
        });
        assert_eq!(emitter.event_count(), 1);
    }
}
