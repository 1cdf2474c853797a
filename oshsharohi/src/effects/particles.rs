//! Rising hero particles.

use rand::Rng;

use crate::surface::{ElementId, NodeSpec, RenderInstruction};

pub const PARTICLES_CONTAINER: &str = "particles";
pub const PARTICLE_COUNT: usize = 40;

/// Uniform sample in `[lo, hi)`; `lo` for an empty range.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        lo
    } else {
        rng.random_range(lo..hi)
    }
}

/// One particle's randomized parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroParticle {
    pub size_px: f64,
    /// Horizontal start, percent of the container
    pub left_pct: f64,
    /// Vertical start, percent of the container (below the fold)
    pub top_pct: f64,
    pub duration_s: f64,
    pub delay_s: f64,
}

impl HeroParticle {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            size_px: uniform(rng, 1.0, 4.0),
            left_pct: uniform(rng, 0.0, 100.0),
            top_pct: uniform(rng, 100.0, 120.0),
            duration_s: uniform(rng, 4.0, 8.0),
            delay_s: uniform(rng, 0.0, 2.0),
        }
    }

    #[must_use]
    pub fn node(&self, id: impl Into<ElementId>) -> NodeSpec {
        NodeSpec::new(id, "div")
            .class("hero-particle")
            .style("width", format!("{}px", self.size_px))
            .style("height", format!("{}px", self.size_px))
            .style("left", format!("{}%", self.left_pct))
            .style("top", format!("{}%", self.top_pct))
            .style("box-shadow", format!("0 0 {}px rgba(227, 6, 19, 0.5)", self.size_px * 3.0))
            .style(
                "animation",
                format!(
                    "particleRise {}s ease-out {}s infinite",
                    self.duration_s, self.delay_s
                ),
            )
    }
}

/// Appends `count` particles to the hero container.
pub fn hero_particles<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<RenderInstruction> {
    let parent = ElementId::new(PARTICLES_CONTAINER);
    (0..count)
        .map(|i| RenderInstruction::Append {
            parent: parent.clone(),
            node: HeroParticle::sample(rng).node(format!("hero-particle-{i}")),
        })
        .collect()
}
