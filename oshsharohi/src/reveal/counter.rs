//! Number counters and title slides that start when scrolled into view.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use oshsharohi_core::config::schema::CounterConfig;
use tracing::debug;

use crate::error::SequenceError;
use crate::sequence::{FRAME_INTERVAL, SequenceHandle, SequenceStep, TimedSequencer};
use crate::surface::{ElementId, RenderInstruction, Surface};

use super::animator::REVEAL_EASING;
use super::trigger::{IntersectionEntry, VisibilityTrigger};

/// `1 - (1 - t)^4`
#[must_use]
pub fn ease_out_quart(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(4)
}

/// Leading integer of `raw`, the way a `data-target` attribute is read.
/// Zero, negative and unparsable targets yield `None`.
#[must_use]
pub fn parse_target(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let digits: &str = {
        let end = trimmed
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '+')))
            .map_or(trimmed.len(), |(i, _)| i);
        &trimmed[..end]
    };
    digits
        .trim_start_matches('+')
        .parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
}

/// Leading decimal number of `text` (`"4.5s"` is 4.5, `"abc"` is `None`).
#[must_use]
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    trimmed[..end].trim_end_matches('.').parse().ok()
}

/// A stat figure counting from zero to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCounter {
    pub element: ElementId,
    pub target: u64,
}

impl StatCounter {
    /// Reads a stat from its `data-target` attribute.
    #[must_use]
    pub fn parse(element: impl Into<ElementId>, data_target: &str) -> Option<Self> {
        parse_target(data_target).map(|target| Self {
            element: element.into(),
            target,
        })
    }

    /// Displayed value `elapsed_ms` into a ramp of `duration_ms`.
    #[must_use]
    pub fn value_at(&self, elapsed_ms: f64, duration_ms: f64) -> u64 {
        let progress = if duration_ms <= 0.0 {
            1.0
        } else {
            (elapsed_ms / duration_ms).clamp(0.0, 1.0)
        };
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let value = (ease_out_quart(progress) * self.target as f64).floor() as u64;
        value
    }
}

/// A spec value that counts up and then restores its original text.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCounter {
    pub element: ElementId,
    pub original: String,
    pub value: f64,
    /// One decimal place while counting when the original had a `.`
    pub decimal: bool,
}

impl SpecCounter {
    #[must_use]
    pub fn parse(element: impl Into<ElementId>, text: &str) -> Option<Self> {
        parse_leading_float(text).map(|value| Self {
            element: element.into(),
            original: text.to_owned(),
            value,
            decimal: text.contains('.'),
        })
    }

    /// Text of every frame: `value / frames` added per frame, the last
    /// frame being the original text.
    #[must_use]
    pub fn frames(&self, frames: u32) -> Vec<String> {
        let increment = self.value / f64::from(frames.max(1));
        let mut out = Vec::new();
        let mut current = 0.0;
        // float steps can overshoot the frame count by one
        for _ in 0..=frames.saturating_add(1) {
            current += increment;
            if current < self.value {
                out.push(if self.decimal {
                    format!("{current:.1}")
                } else {
                    format!("{}", current.floor())
                });
            } else {
                break;
            }
        }
        out.push(self.original.clone());
        out
    }
}

/// Style of a section title before it slides in.
#[must_use]
pub fn title_hidden_style(element: &ElementId) -> Vec<RenderInstruction> {
    vec![
        RenderInstruction::set_style(element, "opacity", "0"),
        RenderInstruction::set_style(element, "transform", "translateX(-30px)"),
    ]
}

/// Starts the slide-in of a section title.
#[must_use]
pub fn title_slide(element: &ElementId) -> RenderInstruction {
    RenderInstruction::set_style(
        element,
        "animation",
        format!("titleSlide 0.8s {REVEAL_EASING} forwards"),
    )
}

/// What happens when a watched element becomes visible.
#[derive(Debug, Clone)]
enum CounterTarget {
    Stats(Vec<StatCounter>),
    Spec(SpecCounter),
    Title,
    Heading,
}

/// Visibility-driven counters, title slides and the hero heading.
pub struct CounterAnimator {
    config: CounterConfig,
    surface: Arc<dyn Surface>,
    trigger: VisibilityTrigger,
    targets: Mutex<HashMap<ElementId, CounterTarget>>,
    sequencer: TimedSequencer,
}

impl std::fmt::Debug for CounterAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterAnimator")
            .field("config", &self.config)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl CounterAnimator {
    #[must_use]
    pub fn new(config: CounterConfig, surface: Arc<dyn Surface>) -> Self {
        Self {
            trigger: VisibilityTrigger::new(config.threshold),
            config,
            surface,
            targets: Mutex::new(HashMap::new()),
            sequencer: TimedSequencer::new("counters"),
        }
    }

    fn watch(&self, element: ElementId, target: CounterTarget) -> bool {
        if !self.surface.contains(&element) || !self.trigger.register(element.clone()) {
            return false;
        }
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(element, target);
        true
    }

    /// Watches a stats container whose figures animate together.
    pub fn watch_stats(&self, container: impl Into<ElementId>, stats: Vec<StatCounter>) -> bool {
        self.watch(container.into(), CounterTarget::Stats(stats))
    }

    /// Watches a spec item.
    pub fn watch_spec(&self, item: impl Into<ElementId>, counter: SpecCounter) -> bool {
        self.watch(item.into(), CounterTarget::Spec(counter))
    }

    /// Hides a section title until it slides in.
    pub fn watch_title(&self, title: impl Into<ElementId>) -> bool {
        let title = title.into();
        let watched = self.watch(title.clone(), CounterTarget::Title);
        if watched {
            self.surface.apply_all(title_hidden_style(&title));
        }
        watched
    }

    /// Watches the hero heading.
    pub fn watch_heading(&self, heading: impl Into<ElementId>) -> bool {
        self.watch(heading.into(), CounterTarget::Heading)
    }

    /// Feeds one intersection batch and starts whatever fired.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoRuntime`] outside a tokio runtime.
    pub fn notify(
        &self,
        entries: &[IntersectionEntry],
    ) -> Result<Vec<SequenceHandle>, SequenceError> {
        let fired = self.trigger.notify(entries);
        let mut handles = Vec::new();
        for event in fired {
            let target = self
                .targets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&event.element);
            match target {
                Some(CounterTarget::Stats(stats)) => {
                    if let Some(handle) = self.run_stats(stats)? {
                        handles.push(handle);
                    }
                }
                Some(CounterTarget::Spec(counter)) => handles.push(self.run_spec(counter)?),
                Some(CounterTarget::Title) => self.surface.apply(title_slide(&event.element)),
                Some(CounterTarget::Heading) => self
                    .surface
                    .apply(RenderInstruction::add_class(event.element, "visible")),
                None => {}
            }
        }
        Ok(handles)
    }

    /// One step per stat at `index * stagger`, each driving a frame ticker,
    /// plus a closing step when the last ramp ends.
    fn run_stats(&self, stats: Vec<StatCounter>) -> Result<Option<SequenceHandle>, SequenceError> {
        if stats.is_empty() {
            return Ok(None);
        }
        let duration = Duration::from_millis(self.config.duration_ms);
        let stagger = Duration::from_millis(self.config.stagger_ms);
        let mut last = Duration::ZERO;
        let mut steps = Vec::with_capacity(stats.len() + 1);
        let mut finals = Vec::with_capacity(stats.len());

        for (index, stat) in stats.into_iter().enumerate() {
            let offset = stagger * u32::try_from(index).unwrap_or(u32::MAX);
            last = offset;
            finals.push(RenderInstruction::set_text(&stat.element, stat.target));
            let surface = Arc::clone(&self.surface);
            steps.push(SequenceStep::at(offset, format!("count {}", stat.element), move |ctx| {
                let total_ms = duration.as_secs_f64() * 1000.0;
                ctx.spawn_ticker(FRAME_INTERVAL, move |elapsed| {
                    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
                    surface.apply(RenderInstruction::set_text(
                        &stat.element,
                        stat.value_at(elapsed_ms, total_ms),
                    ));
                    if elapsed_ms >= total_ms {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                });
            }));
        }

        let surface = Arc::clone(&self.surface);
        steps.push(SequenceStep::at(last + duration, "settle", move |_| {
            surface.apply_all(finals);
        }));
        debug!(stats = steps.len() - 1, "stat counters started");
        self.sequencer.run(steps).map(Some)
    }

    /// Counts a spec value up one frame at a time.
    fn run_spec(&self, counter: SpecCounter) -> Result<SequenceHandle, SequenceError> {
        let frames = counter.frames(self.config.spec_frames);
        let span = FRAME_INTERVAL * u32::try_from(frames.len()).unwrap_or(u32::MAX);
        let element = counter.element;
        let surface = Arc::clone(&self.surface);
        let closing = Arc::clone(&self.surface);
        let original = counter.original;
        let closing_element = element.clone();

        self.sequencer.run(vec![
            SequenceStep::new(0, "spec count", move |ctx| {
                let mut frames = frames.into_iter();
                if let Some(first) = frames.next() {
                    surface.apply(RenderInstruction::set_text(&element, first));
                }
                ctx.spawn_ticker(FRAME_INTERVAL, move |_| match frames.next() {
                    Some(text) => {
                        surface.apply(RenderInstruction::set_text(&element, text));
                        ControlFlow::Continue(())
                    }
                    None => ControlFlow::Break(()),
                });
            }),
            SequenceStep::at(span, "spec restore", move |_| {
                closing.apply(RenderInstruction::set_text(&closing_element, original));
            }),
        ])
    }

    /// Elements still waiting to become visible.
    #[must_use]
    pub fn pending(&self) -> Vec<ElementId> {
        self.trigger.observed()
    }
}
