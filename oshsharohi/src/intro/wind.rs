//! Wind streaks blown across the screen while the gauge ramps.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use oshsharohi_core::config::schema::WindConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::effects::particles::uniform;
use crate::sequence::{RunContext, Ticker};
use crate::surface::{ElementId, NodeSpec, RenderInstruction, Surface};

/// Container the streaks are appended to.
pub const WIND_CONTAINER: &str = "intro-wind";

/// One streak's randomized shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindStreak {
    pub width_px: f64,
    /// Vertical position in percent of the container
    pub top_pct: f64,
    pub duration_s: f64,
}

impl WindStreak {
    /// Draws a streak within the configured ranges.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, config: &WindConfig) -> Self {
        Self {
            width_px: uniform(rng, config.min_width_px, config.max_width_px),
            top_pct: uniform(rng, 0.0, 100.0),
            duration_s: uniform(rng, config.min_duration_s, config.max_duration_s),
        }
    }

    /// Lifetime after which the streak is removed.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_s).unwrap_or(Duration::ZERO)
    }

    /// Node for this streak, starting just off the right edge.
    #[must_use]
    pub fn node(&self, id: impl Into<ElementId>) -> NodeSpec {
        NodeSpec::new(id, "div")
            .class("wind-streak")
            .style("width", format!("{}px", self.width_px))
            .style("top", format!("{}%", self.top_pct))
            .style("right", format!("-{}px", self.width_px))
            .style("animation-duration", format!("{}s", self.duration_s))
    }
}

/// Spawns a streak every `config.interval_ms` until the returned ticker is
/// stopped or the run ends. Each streak removes itself after its lifetime.
///
/// Without a wind container the ticker still runs but draws nothing.
pub fn spawn_wind(
    ctx: &RunContext,
    surface: Arc<dyn Surface>,
    config: WindConfig,
    seed: Option<u64>,
) -> Ticker {
    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let container = ElementId::new(WIND_CONTAINER);
    let follow_ups = ctx.clone();
    let mut spawned: u64 = 0;

    ctx.spawn_ticker(Duration::from_millis(config.interval_ms.max(1)), move |_| {
        if !surface.contains(&container) {
            return ControlFlow::Continue(());
        }
        let streak = WindStreak::sample(&mut rng, &config);
        let id = ElementId::new(format!("wind-streak-{spawned}"));
        spawned += 1;
        trace!(id = %id, width = streak.width_px, "wind streak");

        surface.apply(RenderInstruction::Append {
            parent: container.clone(),
            node: streak.node(&id),
        });
        let surface = Arc::clone(&surface);
        follow_ups.spawn_after(streak.lifetime(), move || {
            surface.apply(RenderInstruction::remove(id));
        });
        ControlFlow::Continue(())
    })
}
