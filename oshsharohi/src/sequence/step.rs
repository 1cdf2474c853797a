//! Step table rows.

use std::time::Duration;

use super::context::RunContext;

/// Boxed step body. Runs exactly once, synchronously, on the driver task.
pub type StepAction = Box<dyn FnOnce(&RunContext) + Send + 'static>;

/// One entry of a step table.
///
/// `offset` is measured from the run's start instant, never from the
/// previous step.
pub struct SequenceStep {
    /// Delay from the start of the run
    pub offset: Duration,
    /// Name used in logs and metrics
    pub label: String,
    pub(crate) action: StepAction,
}

impl SequenceStep {
    /// Creates a step firing `offset_ms` milliseconds after the run starts.
    #[must_use]
    pub fn new<F>(offset_ms: u64, label: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&RunContext) + Send + 'static,
    {
        Self::at(Duration::from_millis(offset_ms), label, action)
    }

    /// Creates a step firing after `offset`.
    #[must_use]
    pub fn at<F>(offset: Duration, label: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&RunContext) + Send + 'static,
    {
        Self {
            offset,
            label: label.into(),
            action: Box::new(action),
        }
    }

    /// Offset in whole milliseconds.
    #[must_use]
    pub fn offset_ms(&self) -> u64 {
        u64::try_from(self.offset.as_millis()).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Debug for SequenceStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceStep")
            .field("offset", &self.offset)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
