//! Scroll-position effects.

use crate::surface::RenderInstruction;

pub const HEADER: &str = "header";
pub const SCROLLED_CLASS: &str = "scrolled";
pub const PROGRESS_BAR: &str = "scroll-progress-bar";
pub const HERO_IMAGE: &str = "hero-img";

/// Scroll offset past which the header is compacted.
pub const HEADER_SCROLL_THRESHOLD: f64 = 50.0;

const PARALLAX_RATE: f64 = 0.4;
const PARALLAX_ZOOM: f64 = 0.0003;

/// Header class for a scroll offset.
#[must_use]
pub fn header_state(scroll_y: f64) -> RenderInstruction {
    if scroll_y > HEADER_SCROLL_THRESHOLD {
        RenderInstruction::add_class(HEADER, SCROLLED_CLASS)
    } else {
        RenderInstruction::remove_class(HEADER, SCROLLED_CLASS)
    }
}

/// Window scroll state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Percent of the scrollable range covered; 0 when the document does
    /// not scroll.
    #[must_use]
    pub fn progress_pct(&self) -> f64 {
        let range = self.document_height - self.viewport_height;
        if range > 0.0 {
            (self.scroll_y / range * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Width of the progress bar.
    #[must_use]
    pub fn progress_bar(&self) -> RenderInstruction {
        RenderInstruction::set_style(
            PROGRESS_BAR,
            "width",
            format!("{}%", self.progress_pct()),
        )
    }
}

/// Hero image transform for a scroll offset.
#[must_use]
pub fn parallax_transform(scroll_y: f64) -> String {
    format!(
        "translateY({}px) scale({})",
        scroll_y * PARALLAX_RATE,
        1.0 + scroll_y * PARALLAX_ZOOM
    )
}

#[must_use]
pub fn parallax(scroll_y: f64) -> RenderInstruction {
    RenderInstruction::set_style(HERO_IMAGE, "transform", parallax_transform(scroll_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_threshold_is_exclusive() {
        assert_eq!(header_state(50.0), RenderInstruction::remove_class(HEADER, "scrolled"));
        assert_eq!(header_state(50.5), RenderInstruction::add_class(HEADER, "scrolled"));
    }

    #[test]
    fn test_progress() {
        let m = ScrollMetrics {
            scroll_y: 500.0,
            document_height: 2000.0,
            viewport_height: 1000.0,
        };
        assert!((m.progress_pct() - 50.0).abs() < 1e-9);
        assert_eq!(
            m.progress_bar(),
            RenderInstruction::set_style(PROGRESS_BAR, "width", "50%")
        );
    }

    #[test]
    fn test_progress_on_short_document() {
        let m = ScrollMetrics {
            scroll_y: 0.0,
            document_height: 800.0,
            viewport_height: 1000.0,
        };
        assert!(m.progress_pct().abs() < f64::EPSILON);
    }

    #[test]
    fn test_parallax() {
        assert_eq!(parallax_transform(0.0), "translateY(0px) scale(1)");
        let t = parallax_transform(100.0);
        assert!(t.starts_with("translateY(40px) scale("));
        let scale: f64 = t["translateY(40px) scale(".len()..t.len() - 1].parse().unwrap();
        assert!((scale - 1.03).abs() < 1e-9);
    }
}
