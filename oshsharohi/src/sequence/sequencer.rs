//! Timed sequencer orchestration
//!
//! A run captures one start instant `t0` and fires every step at
//! `t0 + offset`. A single driver task executes the steps, so a step body
//! is never interleaved with another step or with cancellation: each step
//! either runs to completion or does not run at all.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SequenceError;
use crate::observability::metrics;

use super::context::RunContext;
use super::step::SequenceStep;

/// Launches runs of a step table.
#[derive(Debug, Clone)]
pub struct TimedSequencer {
    label: Arc<str>,
}

impl TimedSequencer {
    /// Creates a sequencer whose runs are reported under `label`.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: Arc::from(label),
        }
    }

    /// Name used in logs and metrics.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Starts a run of `steps`.
    ///
    /// Steps are ordered by offset; steps sharing an offset keep their
    /// table order. The start instant is captured here, before any step
    /// is scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn run(&self, mut steps: Vec<SequenceStep>) -> Result<SequenceHandle, SequenceError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| SequenceError::NoRuntime(self.label.to_string()))?;

        steps.sort_by_key(|step| step.offset);

        let shared = Arc::new(RunShared {
            label: Arc::clone(&self.label),
            started_at: Instant::now(),
            scope: CancellationToken::new(),
            done: CancellationToken::new(),
            cancelled: AtomicBool::new(false),
            fired: AtomicUsize::new(0),
            total: steps.len(),
        });

        debug!(sequence = %self.label, steps = steps.len(), "sequence started");

        let driver = Arc::clone(&shared);
        runtime.spawn(async move {
            drive(driver, steps).await;
        });

        Ok(SequenceHandle { shared })
    }
}

/// State shared between a handle and its driver task.
#[derive(Debug)]
struct RunShared {
    label: Arc<str>,
    started_at: Instant,
    /// Cancelled on caller cancel or when the last step has run; parent
    /// of every ticker and follow-up spawned by the run's steps.
    scope: CancellationToken,
    /// Cancelled once the driver has exited.
    done: CancellationToken,
    /// Set only by an explicit `cancel()` before completion.
    cancelled: AtomicBool,
    fired: AtomicUsize,
    total: usize,
}

async fn drive(shared: Arc<RunShared>, steps: Vec<SequenceStep>) {
    let ctx = RunContext::new(
        Arc::clone(&shared.label),
        shared.started_at,
        shared.scope.clone(),
    );

    for step in steps {
        let deadline = shared.started_at + step.offset;
        tokio::select! {
            biased;
            () = shared.scope.cancelled() => break,
            () = tokio::time::sleep_until(deadline) => {}
        }

        let offset_ms = step.offset_ms();
        let SequenceStep { label, action, .. } = step;
        debug!(sequence = %shared.label, step = %label, offset_ms, "step fired");
        action(&ctx);
        shared.fired.fetch_add(1, Ordering::SeqCst);
        metrics::record_sequence_step(&shared.label);
    }

    if shared.cancelled.load(Ordering::SeqCst) {
        metrics::record_sequence_cancelled(&shared.label);
        info!(
            sequence = %shared.label,
            fired = shared.fired.load(Ordering::SeqCst),
            total = shared.total,
            "sequence cancelled"
        );
    } else {
        debug!(sequence = %shared.label, "sequence completed");
    }

    shared.scope.cancel();
    shared.done.cancel();
}

/// Handle to a running (or finished) sequence.
///
/// Cloning the handle shares the same run.
#[derive(Debug, Clone)]
pub struct SequenceHandle {
    shared: Arc<RunShared>,
}

impl SequenceHandle {
    /// Prevents every step that has not fired yet from firing, and stops
    /// tickers spawned by the run. Already-applied effects stay applied.
    ///
    /// Safe to call any number of times, including after completion.
    pub fn cancel(&self) {
        if self.shared.done.is_cancelled() || self.shared.scope.is_cancelled() {
            return;
        }
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.scope.cancel();
    }

    /// Whether `cancel` stopped the run before its last step.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the driver has exited (completed or cancelled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.done.is_cancelled()
    }

    /// Number of steps that have run.
    #[must_use]
    pub fn fired(&self) -> usize {
        self.shared.fired.load(Ordering::SeqCst)
    }

    /// Number of steps in the table.
    #[must_use]
    pub fn total(&self) -> usize {
        self.shared.total
    }

    /// The run's start instant (`t0`).
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.shared.started_at
    }

    /// Waits until the driver has exited.
    pub async fn completed(&self) {
        self.shared.done.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<(String, Duration)>>>;

    fn recorder(log: &Log, name: &str, offset_ms: u64) -> SequenceStep {
        let log = Arc::clone(log);
        let name = name.to_string();
        SequenceStep::new(offset_ms, name.clone(), move |ctx| {
            log.lock().unwrap().push((name, ctx.elapsed()));
        })
    }

    #[test]
    fn test_run_without_runtime_fails() {
        let sequencer = TimedSequencer::new("orphan");
        let result = sequencer.run(vec![SequenceStep::new(0, "noop", |_| {})]);
        assert!(matches!(result, Err(SequenceError::NoRuntime(label)) if label == "orphan"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_fire_at_offsets_from_t0() {
        let log: Log = Arc::default();
        let handle = TimedSequencer::new("test")
            .run(vec![
                recorder(&log, "b", 300),
                recorder(&log, "a", 100),
                recorder(&log, "c", 300),
            ])
            .unwrap();

        handle.completed().await;

        let log = log.lock().unwrap();
        let names: Vec<&str> = log.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(log[0].1, Duration::from_millis(100));
        assert_eq!(log[1].1, Duration::from_millis(300));
        assert_eq!(log[2].1, Duration::from_millis(300));
        assert_eq!(handle.fired(), 3);
        assert!(handle.is_finished());
        assert!(!handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_step_does_not_shift_later_deadlines() {
        let log: Log = Arc::default();
        let handle = TimedSequencer::new("test")
            .run(vec![
                SequenceStep::new(0, "spawn-late", |ctx| {
                    // a step spawning work does not push back the next deadline
                    ctx.spawn_after(Duration::from_millis(900), || {});
                }),
                recorder(&log, "second", 500),
            ])
            .unwrap();
        handle.completed().await;
        assert_eq!(log.lock().unwrap()[0].1, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_offset_runs_nothing() {
        let log: Log = Arc::default();
        let handle = TimedSequencer::new("test")
            .run(vec![recorder(&log, "a", 100), recorder(&log, "b", 200)])
            .unwrap();

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(handle.fired(), 0);
        assert!(handle.is_cancelled());
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_midway_keeps_applied_steps() {
        let log: Log = Arc::default();
        let handle = TimedSequencer::new("test")
            .run(vec![recorder(&log, "a", 100), recorder(&log, "b", 1000)])
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.cancel();
        handle.cancel();
        handle.completed().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_completion_is_noop() {
        let handle = TimedSequencer::new("test")
            .run(vec![SequenceStep::new(10, "only", |_| {})])
            .unwrap();
        handle.completed().await;
        handle.cancel();
        assert!(!handle.is_cancelled());
        assert_eq!(handle.fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_offset_step_never_runs_before_t0() {
        let log: Log = Arc::default();
        let handle = TimedSequencer::new("test")
            .run(vec![recorder(&log, "now", 0)])
            .unwrap();
        handle.completed().await;
        let log = log.lock().unwrap();
        assert_eq!(log[0].1, Duration::ZERO);
        assert_eq!(handle.total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_table_completes() {
        let handle = TimedSequencer::new("empty").run(Vec::new()).unwrap();
        handle.completed().await;
        assert_eq!(handle.fired(), 0);
        assert!(handle.is_finished());
    }
}
