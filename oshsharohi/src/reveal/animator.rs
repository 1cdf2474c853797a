//! Staggered scroll reveal of content blocks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use oshsharohi_core::config::schema::RevealConfig;
use tracing::debug;

use crate::error::SequenceError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;
use crate::sequence::{SequenceHandle, SequenceStep, TimedSequencer};
use crate::surface::{ElementId, RenderInstruction, Surface};

use super::trigger::{IntersectionEntry, VisibilityEvent, VisibilityTrigger};

/// Easing shared by every reveal-style transition.
pub const REVEAL_EASING: &str = "cubic-bezier(0.16, 1, 0.3, 1)";

/// A planned hidden-to-shown transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealStep {
    pub element: ElementId,
    /// Delay from the moment the batch fired
    pub delay: Duration,
}

/// Styles putting `element` in its hidden starting state.
#[must_use]
pub fn hidden_style(element: &ElementId, config: &RevealConfig) -> Vec<RenderInstruction> {
    #[allow(clippy::cast_precision_loss)]
    let seconds = config.transition_ms as f64 / 1000.0;
    vec![
        RenderInstruction::set_style(element, "opacity", "0"),
        RenderInstruction::set_style(
            element,
            "transform",
            format!("translateY({}px)", config.offset_px),
        ),
        RenderInstruction::set_style(
            element,
            "transition",
            format!("opacity {seconds}s {REVEAL_EASING}, transform {seconds}s {REVEAL_EASING}"),
        ),
    ]
}

/// Styles of the shown state.
#[must_use]
pub fn shown_style(element: &ElementId) -> Vec<RenderInstruction> {
    vec![
        RenderInstruction::set_style(element, "opacity", "1"),
        RenderInstruction::set_style(element, "transform", "translateY(0)"),
    ]
}

/// Reveals registered elements once each, staggered within a batch.
pub struct RevealAnimator {
    config: RevealConfig,
    surface: Arc<dyn Surface>,
    trigger: VisibilityTrigger,
    sequencer: TimedSequencer,
    events: Arc<EventEmitter>,
}

impl std::fmt::Debug for RevealAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealAnimator")
            .field("config", &self.config)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl RevealAnimator {
    #[must_use]
    pub fn new(config: RevealConfig, surface: Arc<dyn Surface>) -> Self {
        Self {
            trigger: VisibilityTrigger::new(config.threshold),
            config,
            surface,
            sequencer: TimedSequencer::new("reveal"),
            events: Arc::new(EventEmitter::noop()),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    /// Hides each present element and starts watching it. Returns the
    /// number of newly registered elements.
    pub fn reveal<I, E>(&self, elements: I) -> usize
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        let mut registered = 0;
        for element in elements {
            let element = element.into();
            if !self.surface.contains(&element) {
                continue;
            }
            if self.trigger.register(element.clone()) {
                self.surface.apply_all(hidden_style(&element, &self.config));
                registered += 1;
            }
        }
        debug!(registered, "reveal registered");
        registered
    }

    /// Delays for a batch of fired elements: `index * stagger`.
    #[must_use]
    pub fn plan(&self, fired: &[VisibilityEvent]) -> Vec<RevealStep> {
        let stagger = Duration::from_millis(self.config.stagger_ms);
        fired
            .iter()
            .map(|event| RevealStep {
                element: event.element.clone(),
                delay: stagger * u32::try_from(event.index).unwrap_or(u32::MAX),
            })
            .collect()
    }

    /// Feeds one intersection batch and schedules the shown state for
    /// every element that fired.
    ///
    /// Returns the plan and the handle of the scheduled run, if any fired.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoRuntime`] outside a tokio runtime.
    pub fn notify(
        &self,
        entries: &[IntersectionEntry],
    ) -> Result<(Vec<RevealStep>, Option<SequenceHandle>), SequenceError> {
        let plan = self.plan(&self.trigger.notify(entries));
        if plan.is_empty() {
            return Ok((plan, None));
        }

        let steps = plan
            .iter()
            .map(|step| {
                let surface = Arc::clone(&self.surface);
                let element = step.element.clone();
                SequenceStep::at(step.delay, format!("show {element}"), move |_| {
                    surface.apply_all(shown_style(&element));
                })
            })
            .collect();
        let handle = self.sequencer.run(steps)?;

        for (index, step) in plan.iter().enumerate() {
            self.events.emit(Event::RevealFired {
                timestamp: Utc::now(),
                element: step.element.to_string(),
                index,
                delay_ms: u64::try_from(step.delay.as_millis()).unwrap_or(u64::MAX),
            });
        }
        metrics::record_reveals(plan.len());
        Ok((plan, Some(handle)))
    }

    /// Elements not revealed yet.
    #[must_use]
    pub fn pending(&self) -> Vec<ElementId> {
        self.trigger.observed()
    }

    /// Stops watching everything.
    pub fn disconnect(&self) {
        self.trigger.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn animator(surface: &Arc<RecordingSurface>) -> RevealAnimator {
        RevealAnimator::new(RevealConfig::default(), surface.clone())
    }

    #[test]
    fn test_hidden_style_matches_defaults() {
        let styles = hidden_style(&ElementId::new("card"), &RevealConfig::default());
        assert_eq!(
            styles[1],
            RenderInstruction::set_style("card", "transform", "translateY(40px)")
        );
        assert_eq!(
            styles[2],
            RenderInstruction::set_style(
                "card",
                "transition",
                concat!(
                    "opacity 0.8s cubic-bezier(0.16, 1, 0.3, 1), ",
                    "transform 0.8s cubic-bezier(0.16, 1, 0.3, 1)",
                ),
            )
        );
    }

    #[test]
    fn test_empty_reveal_is_noop() {
        let surface = Arc::new(RecordingSurface::permissive());
        let animator = animator(&surface);
        assert_eq!(animator.reveal(Vec::<&str>::new()), 0);
        assert!(surface.instructions().is_empty());
        assert!(animator.pending().is_empty());
    }

    #[test]
    fn test_missing_elements_skipped() {
        let surface = Arc::new(RecordingSurface::with_elements(["a"]));
        let animator = animator(&surface);
        assert_eq!(animator.reveal(["a", "ghost"]), 1);
        assert_eq!(surface.style("a", "opacity").as_deref(), Some("0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_of_three_staggers_by_firing_order() {
        let surface = Arc::new(RecordingSurface::permissive());
        let animator = animator(&surface);
        animator.reveal(["a", "b", "c"]);

        let start = tokio::time::Instant::now();
        let (plan, handle) = animator
            .notify(&[
                IntersectionEntry::visible("b", 1.0),
                IntersectionEntry::visible("a", 1.0),
                IntersectionEntry::visible("c", 1.0),
            ])
            .unwrap();
        let delays: Vec<(&str, u64)> = plan
            .iter()
            .map(|s| (s.element.as_str(), u64::try_from(s.delay.as_millis()).unwrap()))
            .collect();
        assert_eq!(delays, [("b", 0), ("a", 100), ("c", 200)]);

        handle.unwrap().completed().await;
        let shown: Vec<(String, u64)> = surface
            .journal()
            .into_iter()
            .filter_map(|(at, i)| match i {
                RenderInstruction::SetStyle { target, property, value }
                    if property == "opacity" && value == "1" =>
                {
                    Some((target.0, u64::try_from((at - start).as_millis()).unwrap()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            shown,
            [("b".to_string(), 0), ("a".to_string(), 100), ("c".to_string(), 200)]
        );

        // a second notification does not re-trigger
        let (again, none) = animator
            .notify(&[IntersectionEntry::visible("a", 1.0)])
            .unwrap();
        assert!(again.is_empty());
        assert!(none.is_none());
    }
}
