//! One-shot "became visible" notifications.
//!
//! The host feeds viewport intersection entries through
//! [`VisibilityTrigger::notify`]. An element fires the first time it is
//! intersecting at or above the threshold and is unregistered right away.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::trace;

use crate::surface::ElementId;

/// One intersection observation delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionEntry {
    pub element: ElementId,
    /// Visible fraction of the element (0.0 - 1.0)
    pub ratio: f64,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    /// An element showing `ratio` of itself.
    #[must_use]
    pub fn visible(element: impl Into<ElementId>, ratio: f64) -> Self {
        Self {
            element: element.into(),
            ratio,
            is_intersecting: ratio > 0.0,
        }
    }

    /// An element outside the viewport.
    #[must_use]
    pub fn hidden(element: impl Into<ElementId>) -> Self {
        Self {
            element: element.into(),
            ratio: 0.0,
            is_intersecting: false,
        }
    }
}

/// An element that just became visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityEvent {
    pub element: ElementId,
    /// Position among the elements that fired in the same notification
    pub index: usize,
}

type OnVisible = Box<dyn FnOnce(&VisibilityEvent) + Send>;

/// Tracks elements waiting to become visible.
pub struct VisibilityTrigger {
    threshold: f64,
    pending: Mutex<IndexMap<ElementId, Option<OnVisible>>>,
}

impl std::fmt::Debug for VisibilityTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTrigger")
            .field("threshold", &self.threshold)
            .field("pending", &self.observed())
            .finish()
    }
}

impl VisibilityTrigger {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            pending: Mutex::new(IndexMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<ElementId, Option<OnVisible>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Registers `element` with a callback run when it fires.
    ///
    /// Returns `false`, leaving the existing registration alone, when the
    /// element is already pending.
    pub fn observe<F>(&self, element: impl Into<ElementId>, on_visible: F) -> bool
    where
        F: FnOnce(&VisibilityEvent) + Send + 'static,
    {
        self.insert(element.into(), Some(Box::new(on_visible)))
    }

    /// Registers `element` without a callback; it is only reported by
    /// [`notify`](Self::notify).
    pub fn register(&self, element: impl Into<ElementId>) -> bool {
        self.insert(element.into(), None)
    }

    fn insert(&self, element: ElementId, on_visible: Option<OnVisible>) -> bool {
        let mut pending = self.lock();
        if pending.contains_key(&element) {
            trace!(element = %element, "already observed");
            return false;
        }
        pending.insert(element, on_visible);
        true
    }

    /// Drops the registration of `element` without firing.
    pub fn unobserve(&self, element: &ElementId) -> bool {
        self.lock().shift_remove(element).is_some()
    }

    /// Drops every registration.
    pub fn disconnect(&self) {
        self.lock().clear();
    }

    /// Elements still waiting, in registration order.
    #[must_use]
    pub fn observed(&self) -> Vec<ElementId> {
        self.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Processes one batch of intersection entries.
    ///
    /// Qualifying entries fire in the order given; each fired element is
    /// unregistered before its callback runs. Entries for elements that are
    /// not pending are ignored.
    pub fn notify(&self, entries: &[IntersectionEntry]) -> Vec<VisibilityEvent> {
        let mut fired = Vec::new();
        {
            let mut pending = self.lock();
            for entry in entries {
                if !entry.is_intersecting || entry.ratio < self.threshold {
                    continue;
                }
                if let Some(callback) = pending.shift_remove(&entry.element) {
                    let event = VisibilityEvent {
                        element: entry.element.clone(),
                        index: fired.len(),
                    };
                    fired.push((event, callback));
                }
            }
        }

        fired
            .into_iter()
            .map(|(event, callback)| {
                trace!(element = %event.element, index = event.index, "visible");
                if let Some(callback) = callback {
                    callback(&event);
                }
                event
            })
            .collect()
    }
}
