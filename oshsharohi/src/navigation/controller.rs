//! Link interception and page transitions
//!
//! Same-page clicks play a flash and pulse in place and never navigate.
//! Cross-page clicks play the exit animation and navigate after a fixed
//! delay, or at once when there is nothing to animate.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use oshsharohi_core::config::schema::NavigationConfig;
use tracing::{debug, info};

use crate::error::SequenceError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics::{self, NavigationKind};
use crate::sequence::{FRAME_INTERVAL, SequenceHandle, SequenceStep, TimedSequencer};
use crate::surface::{ElementId, Navigator, NodeSpec, RenderInstruction, Surface};

use super::page::{ActiveLinks, LinkKind, classify, is_same_page, resolve_page};

/// Containers animated by page transitions, most specific first.
pub const CONTENT_CANDIDATES: [&str; 3] = ["main", ".page-content", ".hero"];

const BODY: &str = "body";

/// A click on a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClick {
    pub link: ElementId,
    pub href: String,
}

impl LinkClick {
    #[must_use]
    pub fn new(link: impl Into<ElementId>, href: &str) -> Self {
        Self {
            link: link.into(),
            href: href.to_owned(),
        }
    }
}

/// What `intercept` did with a click.
#[derive(Debug, Clone)]
pub enum Interception {
    /// Not ours; the default action proceeds
    Ignored,
    /// Smooth-scrolled to an in-page anchor
    Fragment { found: bool },
    /// Flash and pulse in place; navigation suppressed
    SamePage { handle: SequenceHandle },
    /// Exit animation running; navigation follows
    CrossPage { handle: SequenceHandle },
    /// No content container; navigated immediately
    Immediate,
}

impl Interception {
    /// Whether the default link action was prevented.
    #[must_use]
    pub const fn prevents_default(&self) -> bool {
        !matches!(self, Self::Ignored)
    }

    /// Handle of the transition run, if one was started.
    #[must_use]
    pub const fn handle(&self) -> Option<&SequenceHandle> {
        match self {
            Self::SamePage { handle } | Self::CrossPage { handle } => Some(handle),
            _ => None,
        }
    }
}

/// The flash overlay: three streak lines and a centre burst.
#[must_use]
pub fn flash_overlay(id: &ElementId) -> NodeSpec {
    (1..=3)
        .fold(
            NodeSpec::new(id, "div").class("page-flash-transition"),
            |node, n| {
                node.child(
                    NodeSpec::new(format!("{id}-line-{n}"), "div")
                        .class(&format!("flash-line flash-line-{n}")),
                )
            },
        )
        .child(NodeSpec::new(format!("{id}-center"), "div").class("flash-center"))
}

/// Intercepts internal link clicks and plays page transitions.
pub struct NavigationController {
    config: NavigationConfig,
    surface: Arc<dyn Surface>,
    navigator: Arc<dyn Navigator>,
    links: ActiveLinks,
    events: Arc<EventEmitter>,
    flash_seq: TimedSequencer,
    exit_seq: TimedSequencer,
    enter_seq: TimedSequencer,
    flashes: AtomicU64,
}

impl std::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationController")
            .field("config", &self.config)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl NavigationController {
    #[must_use]
    pub fn new(
        config: NavigationConfig,
        surface: Arc<dyn Surface>,
        navigator: Arc<dyn Navigator>,
        links: ActiveLinks,
    ) -> Self {
        Self {
            config,
            surface,
            navigator,
            links,
            events: Arc::new(EventEmitter::noop()),
            flash_seq: TimedSequencer::new("same-page-flash"),
            exit_seq: TimedSequencer::new("page-exit"),
            enter_seq: TimedSequencer::new("page-enter"),
            flashes: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    fn content(&self, candidates: &[&str]) -> Option<ElementId> {
        candidates
            .iter()
            .map(|c| ElementId::new(*c))
            .find(|id| self.surface.contains(id))
    }

    fn record(&self, href: &str, kind: NavigationKind) {
        metrics::record_navigation(kind);
        self.events.emit(Event::navigation_started(href, kind));
    }

    /// Page-load work: enter transition and initial nav highlighting.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoRuntime`] outside a tokio runtime.
    pub fn enter_page(&self) -> Result<Option<SequenceHandle>, SequenceError> {
        let page = self.navigator.current_path();
        self.surface
            .apply_present(self.links.sync_to_page(resolve_page(&page)));

        let Some(content) = self.content(&CONTENT_CANDIDATES[..2]) else {
            return Ok(None);
        };
        self.surface
            .apply(RenderInstruction::add_class(&content, "page-enter"));
        let surface = Arc::clone(&self.surface);
        let handle = self.enter_seq.run(vec![SequenceStep::new(
            self.config.enter_delay_ms,
            "enter",
            move |_| surface.apply(RenderInstruction::add_class(&content, "page-enter-active")),
        )])?;
        Ok(Some(handle))
    }

    /// Handles a click on a link.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoRuntime`] outside a tokio runtime.
    pub fn intercept(&self, click: &LinkClick) -> Result<Interception, SequenceError> {
        match classify(&click.href) {
            LinkKind::External => Ok(Interception::Ignored),
            LinkKind::Fragment => Ok(self.scroll_to_fragment(&click.href)),
            LinkKind::Page => {
                let current = self.navigator.current_path();
                if is_same_page(&current, &click.href) {
                    self.same_page(click)
                } else {
                    self.cross_page(click)
                }
            }
        }
    }

    fn scroll_to_fragment(&self, href: &str) -> Interception {
        let target = ElementId::new(href);
        let found = self.surface.apply_if_present(RenderInstruction::ScrollIntoView {
            target,
            smooth: true,
        });
        self.record(href, NavigationKind::Fragment);
        Interception::Fragment { found }
    }

    fn same_page(&self, click: &LinkClick) -> Result<Interception, SequenceError> {
        info!(href = %click.href, "same-page transition");
        self.surface.apply_present(self.links.mark(&click.link));
        self.record(&click.href, NavigationKind::SamePage);

        let n = self.flashes.fetch_add(1, Ordering::SeqCst);
        let flash = ElementId::new(format!("page-flash-{n}"));
        let content = self.content(&CONTENT_CANDIDATES);
        let hold = self.config.flash_hold_ms;

        let mut steps = Vec::with_capacity(5);
        {
            let surface = Arc::clone(&self.surface);
            let flash = flash.clone();
            let content = content.clone();
            steps.push(SequenceStep::new(0, "flash", move |_| {
                surface.apply_if_present(RenderInstruction::Append {
                    parent: ElementId::new(BODY),
                    node: flash_overlay(&flash),
                });
                surface.apply(RenderInstruction::ScrollTo {
                    top: 0.0,
                    smooth: true,
                });
                if let Some(content) = content {
                    surface.apply(RenderInstruction::add_class(content, "page-pulse"));
                }
            }));
        }
        steps.push(self.class_step(FRAME_INTERVAL, "flash active", &flash, "active"));
        steps.push(self.class_step(Duration::from_millis(hold), "flash fade", &flash, "fade-out"));
        if let Some(content) = content {
            let surface = Arc::clone(&self.surface);
            steps.push(SequenceStep::new(self.config.pulse_ms, "pulse end", move |_| {
                surface.apply(RenderInstruction::remove_class(content, "page-pulse"));
            }));
        }
        {
            let surface = Arc::clone(&self.surface);
            steps.push(SequenceStep::new(
                hold.saturating_add(self.config.flash_fade_ms),
                "flash remove",
                move |_| {
                    surface.apply_if_present(RenderInstruction::remove(flash));
                },
            ));
        }

        let handle = self.flash_seq.run(steps)?;
        Ok(Interception::SamePage { handle })
    }

    fn class_step(
        &self,
        at: Duration,
        label: &str,
        target: &ElementId,
        class: &str,
    ) -> SequenceStep {
        let surface = Arc::clone(&self.surface);
        let instruction = RenderInstruction::add_class(target, class);
        SequenceStep::at(at, label, move |_| {
            surface.apply_if_present(instruction);
        })
    }

    fn cross_page(&self, click: &LinkClick) -> Result<Interception, SequenceError> {
        self.surface.apply_present(self.links.mark(&click.link));

        let Some(content) = self.content(&CONTENT_CANDIDATES) else {
            debug!(href = %click.href, "no content container, navigating now");
            self.record(&click.href, NavigationKind::Immediate);
            self.navigator.navigate(&click.href);
            return Ok(Interception::Immediate);
        };

        info!(href = %click.href, "cross-page transition");
        self.record(&click.href, NavigationKind::CrossPage);
        self.surface
            .apply(RenderInstruction::add_class(content, "page-exit"));

        let navigator = Arc::clone(&self.navigator);
        let href = click.href.clone();
        let handle = self.exit_seq.run(vec![SequenceStep::new(
            self.config.exit_delay_ms,
            "navigate",
            move |_| navigator.navigate(&href),
        )])?;
        Ok(Interception::CrossPage { handle })
    }
}
