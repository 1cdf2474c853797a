//! Host abstraction for the page runtime.
//!
//! Effects never touch a document directly. They compute
//! [`RenderInstruction`]s and hand them to a [`Surface`], which a host
//! (browser binding, CLI journal, test recorder) applies to real nodes.
//! Audio playback and location changes go through [`AudioSink`] and
//! [`Navigator`] the same way.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::error::AudioError;

/// Selector-like handle for one or more nodes (`"intro-overlay"`, `".stripe"`).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    /// Creates a new `ElementId` from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the underlying selector.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A node to be created and appended by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSpec {
    /// Handle the node can later be addressed by
    pub id: ElementId,
    /// Tag name (`div`, `path`, `line`, `text`)
    pub tag: String,
    /// Class attribute
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    /// Plain attributes, in insertion order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    /// Inline style properties, in insertion order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub style: Vec<(String, String)>,
    /// Text content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Child nodes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Starts a node description with the given handle and tag.
    #[must_use]
    pub fn new(id: impl Into<ElementId>, tag: &str) -> Self {
        Self {
            id: id.into(),
            tag: tag.to_string(),
            class: String::new(),
            attributes: Vec::new(),
            style: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Sets the class attribute.
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Adds an inline style property.
    #[must_use]
    pub fn style(mut self, property: &str, value: impl ToString) -> Self {
        self.style.push((property.to_string(), value.to_string()));
        self
    }

    /// Sets the text content.
    #[must_use]
    pub fn text(mut self, text: impl ToString) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Self> for ElementId {
    fn from(id: &Self) -> Self {
        id.clone()
    }
}

/// A single mutation for the host to apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderInstruction {
    /// Add a class to every matched node
    AddClass { target: ElementId, class: String },
    /// Remove a class from every matched node
    RemoveClass { target: ElementId, class: String },
    /// Replace text content
    SetText { target: ElementId, text: String },
    /// Set (or clear, with an empty value) an inline style property
    SetStyle {
        target: ElementId,
        property: String,
        value: String,
    },
    /// Set an attribute
    SetAttribute {
        target: ElementId,
        name: String,
        value: String,
    },
    /// Create a node under `parent`
    Append { parent: ElementId, node: NodeSpec },
    /// Detach matched nodes
    Remove { target: ElementId },
    /// Scroll the window
    ScrollTo { top: f64, smooth: bool },
    /// Scroll the window until `target` is in view
    ScrollIntoView { target: ElementId, smooth: bool },
}

impl RenderInstruction {
    /// Shorthand for [`RenderInstruction::AddClass`].
    #[must_use]
    pub fn add_class(target: impl Into<ElementId>, class: &str) -> Self {
        Self::AddClass {
            target: target.into(),
            class: class.to_string(),
        }
    }

    /// Shorthand for [`RenderInstruction::RemoveClass`].
    #[must_use]
    pub fn remove_class(target: impl Into<ElementId>, class: &str) -> Self {
        Self::RemoveClass {
            target: target.into(),
            class: class.to_string(),
        }
    }

    /// Shorthand for [`RenderInstruction::SetText`].
    #[must_use]
    pub fn set_text(target: impl Into<ElementId>, text: impl ToString) -> Self {
        Self::SetText {
            target: target.into(),
            text: text.to_string(),
        }
    }

    /// Shorthand for [`RenderInstruction::SetStyle`].
    #[must_use]
    pub fn set_style(target: impl Into<ElementId>, property: &str, value: impl ToString) -> Self {
        Self::SetStyle {
            target: target.into(),
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    /// Shorthand for [`RenderInstruction::Remove`].
    #[must_use]
    pub fn remove(target: impl Into<ElementId>) -> Self {
        Self::Remove {
            target: target.into(),
        }
    }

    /// The node this instruction acts on, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&ElementId> {
        match self {
            Self::AddClass { target, .. }
            | Self::RemoveClass { target, .. }
            | Self::SetText { target, .. }
            | Self::SetStyle { target, .. }
            | Self::SetAttribute { target, .. }
            | Self::Remove { target }
            | Self::ScrollIntoView { target, .. } => Some(target),
            Self::Append { parent, .. } => Some(parent),
            Self::ScrollTo { .. } => None,
        }
    }
}

/// The document as seen by the runtime.
pub trait Surface: Send + Sync {
    /// Whether `element` currently resolves to at least one node.
    fn contains(&self, element: &ElementId) -> bool;

    /// Applies one instruction.
    fn apply(&self, instruction: RenderInstruction);

    /// Applies instructions in order.
    fn apply_all(&self, instructions: Vec<RenderInstruction>) {
        for instruction in instructions {
            self.apply(instruction);
        }
    }

    /// Applies `instruction` unless its target is missing. Returns whether
    /// it was applied.
    fn apply_if_present(&self, instruction: RenderInstruction) -> bool {
        let present = instruction.target().is_none_or(|t| self.contains(t));
        if present {
            self.apply(instruction);
        } else if let Some(target) = instruction.target() {
            debug!(element = %target, "element missing, skipping");
        }
        present
    }

    /// [`apply_if_present`](Self::apply_if_present) for each instruction.
    fn apply_present(&self, instructions: Vec<RenderInstruction>) {
        for instruction in instructions {
            self.apply_if_present(instruction);
        }
    }
}

/// The intro soundtrack.
pub trait AudioSink: Send + Sync {
    /// Sets playback volume (0.0 - 1.0).
    fn set_volume(&self, volume: f64);

    /// Current playback volume.
    fn volume(&self) -> f64;

    /// Seeks to the beginning.
    fn rewind(&self);

    /// Starts playback.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Blocked`] when the platform's autoplay policy
    /// rejects playback.
    fn play(&self) -> Result<(), AudioError>;

    /// Pauses playback.
    fn pause(&self);
}

/// Window location.
pub trait Navigator: Send + Sync {
    /// Path of the current document (`/team.html`, `/`).
    fn current_path(&self) -> String;

    /// Commits navigation to `href`.
    fn navigate(&self, href: &str);
}

// ============================================================================
// Recording implementations
// ============================================================================

/// In-memory surface that records every applied instruction.
///
/// Tracks enough state (presence, classes, text, styles) to answer the
/// questions a caller asks after a run. `Append` makes the appended node
/// present; `Remove` makes it absent.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    all_present: bool,
    state: Mutex<RecordedState>,
}

#[derive(Debug, Default)]
struct RecordedState {
    present: HashSet<ElementId>,
    removed: HashSet<ElementId>,
    classes: HashMap<ElementId, HashSet<String>>,
    text: HashMap<ElementId, String>,
    styles: HashMap<(ElementId, String), String>,
    journal: Vec<(Instant, RenderInstruction)>,
}

impl RecordingSurface {
    /// A surface on which every element exists until removed.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            all_present: true,
            state: Mutex::default(),
        }
    }

    /// A surface containing exactly the given elements.
    #[must_use]
    pub fn with_elements<I, E>(elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        let state = RecordedState {
            present: elements.into_iter().map(Into::into).collect(),
            ..RecordedState::default()
        };
        Self {
            all_present: false,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordedState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Every instruction applied so far, with the instant it was applied.
    #[must_use]
    pub fn journal(&self) -> Vec<(Instant, RenderInstruction)> {
        self.lock().journal.clone()
    }

    /// Applied instructions without timestamps.
    #[must_use]
    pub fn instructions(&self) -> Vec<RenderInstruction> {
        self.lock().journal.iter().map(|(_, i)| i.clone()).collect()
    }

    /// Whether `element` currently carries `class`.
    #[must_use]
    pub fn has_class(&self, element: &str, class: &str) -> bool {
        self.lock()
            .classes
            .get(&ElementId::new(element))
            .is_some_and(|set| set.contains(class))
    }

    /// Last text written to `element`.
    #[must_use]
    pub fn text(&self, element: &str) -> Option<String> {
        self.lock().text.get(&ElementId::new(element)).cloned()
    }

    /// Last value written to a style property of `element`.
    #[must_use]
    pub fn style(&self, element: &str, property: &str) -> Option<String> {
        self.lock()
            .styles
            .get(&(ElementId::new(element), property.to_string()))
            .cloned()
    }

    /// Whether `element` has been removed.
    #[must_use]
    pub fn was_removed(&self, element: &str) -> bool {
        self.lock().removed.contains(&ElementId::new(element))
    }
}

impl Surface for RecordingSurface {
    fn contains(&self, element: &ElementId) -> bool {
        let state = self.lock();
        if state.removed.contains(element) {
            return false;
        }
        self.all_present || state.present.contains(element)
    }

    fn apply(&self, instruction: RenderInstruction) {
        let mut state = self.lock();
        match &instruction {
            RenderInstruction::AddClass { target, class } => {
                state
                    .classes
                    .entry(target.clone())
                    .or_default()
                    .insert(class.clone());
            }
            RenderInstruction::RemoveClass { target, class } => {
                if let Some(set) = state.classes.get_mut(target) {
                    set.remove(class);
                }
            }
            RenderInstruction::SetText { target, text } => {
                state.text.insert(target.clone(), text.clone());
            }
            RenderInstruction::SetStyle {
                target,
                property,
                value,
            } => {
                state
                    .styles
                    .insert((target.clone(), property.clone()), value.clone());
            }
            RenderInstruction::Append { node, .. } => {
                state.removed.remove(&node.id);
                state.present.insert(node.id.clone());
                if !node.class.is_empty() {
                    let classes = node.class.split_whitespace().map(str::to_string);
                    state.classes.entry(node.id.clone()).or_default().extend(classes);
                }
            }
            RenderInstruction::Remove { target } => {
                state.present.remove(target);
                state.removed.insert(target.clone());
            }
            RenderInstruction::SetAttribute { .. }
            | RenderInstruction::ScrollTo { .. }
            | RenderInstruction::ScrollIntoView { .. } => {}
        }
        state.journal.push((Instant::now(), instruction));
    }
}

/// Audio sink that records calls and optionally refuses to play.
#[derive(Debug)]
pub struct RecordingAudio {
    volume: Mutex<f64>,
    blocked: AtomicBool,
    playing: AtomicBool,
    play_attempts: AtomicUsize,
    pauses: AtomicUsize,
}

impl RecordingAudio {
    /// An audio sink that accepts playback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            volume: Mutex::new(1.0),
            blocked: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            play_attempts: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
        }
    }

    /// An audio sink whose `play` fails as if blocked by autoplay policy.
    #[must_use]
    pub fn blocked() -> Self {
        let audio = Self::new();
        audio.blocked.store(true, Ordering::SeqCst);
        audio
    }

    /// Allows or blocks subsequent `play` calls.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Number of `play` calls, successful or not.
    #[must_use]
    pub fn play_attempts(&self) -> usize {
        self.play_attempts.load(Ordering::SeqCst)
    }

    /// Number of `pause` calls.
    #[must_use]
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Whether playback is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl Default for RecordingAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for RecordingAudio {
    fn set_volume(&self, volume: f64) {
        let mut v = self
            .volume
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *v = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f64 {
        *self
            .volume
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn rewind(&self) {}

    fn play(&self) -> Result<(), AudioError> {
        self.play_attempts.fetch_add(1, Ordering::SeqCst);
        if self.blocked.load(Ordering::SeqCst) {
            return Err(AudioError::Blocked("NotAllowedError".to_string()));
        }
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
    }
}

/// Navigator that records committed navigations instead of leaving the page.
#[derive(Debug)]
pub struct RecordingNavigator {
    path: String,
    visits: Mutex<Vec<(Instant, String)>>,
}

impl RecordingNavigator {
    /// A navigator positioned at `path`.
    #[must_use]
    pub fn at(path: &str) -> Self {
        Self {
            path: path.to_string(),
            visits: Mutex::new(Vec::new()),
        }
    }

    /// Committed navigations with the instant each was issued.
    #[must_use]
    pub fn visits(&self) -> Vec<(Instant, String)> {
        self.visits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn navigate(&self, href: &str) {
        self.visits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((Instant::now(), href.to_string()));
    }
}
