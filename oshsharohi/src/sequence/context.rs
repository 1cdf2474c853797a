//! Per-run context handed to step actions.
//!
//! Repeating work (animation frames, particle spawners, volume ramps) and
//! one-off follow-ups started from a step are children of the run's
//! cancellation token, so cancelling or finishing the run stops them.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Cadence of animation-frame loops.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Context shared by every step of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    label: Arc<str>,
    started_at: Instant,
    cancel: CancellationToken,
}

impl RunContext {
    pub(crate) const fn new(
        label: Arc<str>,
        started_at: Instant,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            label,
            started_at,
            cancel,
        }
    }

    /// Name of the owning sequence.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The run's start instant (`t0`).
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since `t0`.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether the run has been cancelled or has finished.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Calls `tick` every `period` until it breaks, the ticker is stopped,
    /// or the run ends.
    ///
    /// The first call happens one period after spawning. `tick` receives
    /// the time elapsed since the ticker was spawned.
    pub fn spawn_ticker<F>(&self, period: Duration, tick: F) -> Ticker
    where
        F: FnMut(Duration) -> ControlFlow<()> + Send + 'static,
    {
        Ticker::spawn(Arc::clone(&self.label), period, self.cancel.child_token(), tick)
    }

    /// Runs `f` once after `delay` unless the run ends first.
    pub fn spawn_after<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.cancel.child_token();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => f(),
            }
        });
    }
}

/// Handle to a repeating task started with [`RunContext::spawn_ticker`].
#[derive(Debug, Clone)]
pub struct Ticker {
    token: CancellationToken,
}

impl Ticker {
    /// Starts a ticker stopped only by `token`, by [`stop`](Self::stop) or
    /// by `tick` breaking. Unlike [`RunContext::spawn_ticker`] it outlives
    /// the run that started it.
    pub fn spawn<F>(
        label: Arc<str>,
        period: Duration,
        token: CancellationToken,
        mut tick: F,
    ) -> Self
    where
        F: FnMut(Duration) -> ControlFlow<()> + Send + 'static,
    {
        let task_token = token.clone();

        tokio::spawn(async move {
            let start = Instant::now();
            let mut interval = tokio::time::interval_at(start + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    () = task_token.cancelled() => {
                        trace!(sequence = %label, "ticker cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        if tick(start.elapsed()).is_break() {
                            break;
                        }
                    }
                }
            }
            task_token.cancel();
        });

        Self { token }
    }

    /// Stops the ticker. Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether the ticker has stopped for any reason.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the ticker has stopped.
    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }
}
