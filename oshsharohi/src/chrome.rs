//! Page-wide singletons
//!
//! The smooth-scroll driver, cursor glow, scroll progress bar and header
//! listener each exist at most once per page. Construction goes through
//! idempotent install functions that report whether this call did the work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::effects::pointer::{CURSOR_GLOW, CursorGlow};
use crate::effects::scroll::{self, HEADER, PROGRESS_BAR, ScrollMetrics};
use crate::error::SequenceError;
use crate::sequence::FRAME_INTERVAL;
use crate::surface::{ElementId, NodeSpec, RenderInstruction, Surface};

/// Fixed configuration of the smooth-scroll driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothScrollConfig {
    pub duration_s: f64,
    pub vertical: bool,
    pub smooth: bool,
    pub mouse_multiplier: f64,
    pub smooth_touch: bool,
    pub touch_multiplier: f64,
    pub infinite: bool,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            duration_s: 1.2,
            vertical: true,
            smooth: true,
            mouse_multiplier: 1.0,
            smooth_touch: false,
            touch_multiplier: 2.0,
            infinite: false,
        }
    }
}

impl SmoothScrollConfig {
    /// Exponential ease-out, capped at 1.
    #[must_use]
    pub fn easing(t: f64) -> f64 {
        (1.001 - 2f64.powf(-10.0 * t)).min(1.0)
    }
}

/// The external smooth-scroll engine, advanced once per frame.
pub trait ScrollDriver: Send + Sync {
    fn drive(&self, frame_time_ms: f64);
}

/// Holder for the single smooth-scroll driver.
#[derive(Default)]
pub struct SmoothScroll {
    driver: OnceLock<Arc<dyn ScrollDriver>>,
}

impl std::fmt::Debug for SmoothScroll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmoothScroll")
            .field("installed", &self.driver.get().is_some())
            .finish()
    }
}

impl SmoothScroll {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            driver: OnceLock::new(),
        }
    }

    /// Builds the driver with `factory` unless one exists. Returns whether
    /// this call installed it; the factory is not called otherwise.
    pub fn install<F>(&self, factory: F) -> bool
    where
        F: FnOnce(&SmoothScrollConfig) -> Arc<dyn ScrollDriver>,
    {
        let mut installed = false;
        self.driver.get_or_init(|| {
            installed = true;
            factory(&SmoothScrollConfig::default())
        });
        if !installed {
            debug!("smooth scroll already installed");
        }
        installed
    }

    #[must_use]
    pub fn driver(&self) -> Option<Arc<dyn ScrollDriver>> {
        self.driver.get().cloned()
    }

    /// Drives the installed driver every frame until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::NoRuntime`] outside a tokio runtime.
    pub fn spawn_frame_pump(
        &self,
        cancel: CancellationToken,
    ) -> Result<Option<JoinHandle<()>>, SequenceError> {
        let Some(driver) = self.driver() else {
            warn!("smooth scroll not installed, frame pump not started");
            return Ok(None);
        };
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| SequenceError::NoRuntime("frame-pump".to_string()))?;
        Ok(Some(runtime.spawn(async move {
            let start = Instant::now();
            let mut interval = tokio::time::interval(FRAME_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    now = interval.tick() => {
                        driver.drive((now - start).as_secs_f64() * 1000.0);
                    }
                }
            }
        })))
    }
}

static SMOOTH_SCROLL: SmoothScroll = SmoothScroll::new();

/// Installs the process-wide smooth-scroll driver.
pub fn install_smooth_scroll<F>(factory: F) -> bool
where
    F: FnOnce(&SmoothScrollConfig) -> Arc<dyn ScrollDriver>,
{
    SMOOTH_SCROLL.install(factory)
}

/// The process-wide holder.
#[must_use]
pub fn smooth_scroll() -> &'static SmoothScroll {
    &SMOOTH_SCROLL
}

/// Per-page chrome: cursor glow, progress bar and header state.
pub struct PageChrome {
    surface: Arc<dyn Surface>,
    touch_device: bool,
    glow_installed: AtomicBool,
    progress_installed: AtomicBool,
    header_installed: AtomicBool,
    glow: Mutex<GlowState>,
}

#[derive(Debug, Default)]
struct GlowState {
    glow: CursorGlow,
    pointer: (f64, f64),
}

impl std::fmt::Debug for PageChrome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageChrome")
            .field("touch_device", &self.touch_device)
            .finish_non_exhaustive()
    }
}

impl PageChrome {
    #[must_use]
    pub fn new(surface: Arc<dyn Surface>, touch_device: bool) -> Self {
        Self {
            surface,
            touch_device,
            glow_installed: AtomicBool::new(false),
            progress_installed: AtomicBool::new(false),
            header_installed: AtomicBool::new(false),
            glow: Mutex::default(),
        }
    }

    fn glow_state(&self) -> std::sync::MutexGuard<'_, GlowState> {
        self.glow
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Appends the cursor glow. Never on touch devices.
    pub fn install_cursor_glow(&self) -> bool {
        if self.touch_device {
            debug!("touch device, cursor glow skipped");
            return false;
        }
        if self.glow_installed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.surface.apply(RenderInstruction::Append {
            parent: ElementId::new("body"),
            node: NodeSpec::new(CURSOR_GLOW, "div").class(CURSOR_GLOW),
        });
        true
    }

    /// Appends the scroll progress bar at 0 %.
    pub fn install_progress_bar(&self) -> bool {
        if self.progress_installed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.surface.apply(RenderInstruction::Append {
            parent: ElementId::new("body"),
            node: NodeSpec::new(PROGRESS_BAR, "div")
                .class(PROGRESS_BAR)
                .style("width", "0%"),
        });
        true
    }

    /// Starts tracking the header; false when there is none or it is
    /// already tracked.
    pub fn install_header(&self) -> bool {
        if !self.surface.contains(&ElementId::new(HEADER)) {
            return false;
        }
        !self.header_installed.swap(true, Ordering::SeqCst)
    }

    /// Installs every singleton this page supports.
    pub fn install_all(&self) {
        self.install_header();
        self.install_progress_bar();
        self.install_cursor_glow();
    }

    /// Window scrolled.
    pub fn on_scroll(&self, metrics: &ScrollMetrics) {
        if self.header_installed.load(Ordering::SeqCst) {
            self.surface.apply(scroll::header_state(metrics.scroll_y));
        }
        if self.progress_installed.load(Ordering::SeqCst) {
            self.surface.apply(metrics.progress_bar());
        }
        self.surface
            .apply_if_present(scroll::parallax(metrics.scroll_y));
    }

    pub fn on_pointer_move(&self, x: f64, y: f64) {
        self.glow_state().pointer = (x, y);
    }

    pub fn on_pointer_leave(&self) {
        if self.glow_installed.load(Ordering::SeqCst) {
            self.surface.apply(CursorGlow::leave());
        }
    }

    pub fn on_pointer_enter(&self) {
        if self.glow_installed.load(Ordering::SeqCst) {
            self.surface.apply(CursorGlow::enter());
        }
    }

    /// One animation frame of the cursor glow.
    pub fn frame(&self) {
        if !self.glow_installed.load(Ordering::SeqCst) {
            return;
        }
        let out = {
            let mut state = self.glow_state();
            let (x, y) = state.pointer;
            state.glow.step(x, y)
        };
        self.surface.apply_all(out);
    }
}
