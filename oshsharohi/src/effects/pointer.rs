//! Pointer-following effects.

use crate::surface::{ElementId, RenderInstruction};

pub const CURSOR_GLOW: &str = "cursor-glow";

/// Fraction of the remaining distance the glow covers per frame.
pub const GLOW_EASE: f64 = 0.1;
const GLOW_OPACITY: f64 = 0.3;
const MAGNETIC_PULL: f64 = 0.2;
const TILT_DEG: f64 = 5.0;

/// Bounding box of an element in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Pointer position relative to the box, each axis in `0..=1` when
    /// inside. Degenerate boxes map to the centre.
    #[must_use]
    pub fn relative(&self, x: f64, y: f64) -> (f64, f64) {
        let fx = if self.width > 0.0 {
            (x - self.left) / self.width
        } else {
            0.5
        };
        let fy = if self.height > 0.0 {
            (y - self.top) / self.height
        } else {
            0.5
        };
        (fx, fy)
    }
}

/// Glow element trailing the pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorGlow {
    pub x: f64,
    pub y: f64,
}

impl CursorGlow {
    /// Advances one frame toward the pointer at `(cx, cy)`.
    pub fn step(&mut self, cx: f64, cy: f64) -> Vec<RenderInstruction> {
        self.x += (cx - self.x) * GLOW_EASE;
        self.y += (cy - self.y) * GLOW_EASE;
        vec![
            RenderInstruction::set_style(CURSOR_GLOW, "left", format!("{}px", self.x)),
            RenderInstruction::set_style(CURSOR_GLOW, "top", format!("{}px", self.y)),
        ]
    }

    /// Pointer left the window.
    #[must_use]
    pub fn leave() -> RenderInstruction {
        RenderInstruction::set_style(CURSOR_GLOW, "opacity", 0)
    }

    /// Pointer entered the window.
    #[must_use]
    pub fn enter() -> RenderInstruction {
        RenderInstruction::set_style(CURSOR_GLOW, "opacity", GLOW_OPACITY)
    }
}

/// `--mouse-x`/`--mouse-y` custom properties for a card's radial glow.
#[must_use]
pub fn card_glow(card: &ElementId, rect: &Rect, x: f64, y: f64) -> Vec<RenderInstruction> {
    let (fx, fy) = rect.relative(x, y);
    vec![
        RenderInstruction::set_style(card, "--mouse-x", format!("{}%", fx * 100.0)),
        RenderInstruction::set_style(card, "--mouse-y", format!("{}%", fy * 100.0)),
    ]
}

/// Pulls a button a fifth of the way toward the pointer.
#[must_use]
pub fn magnetic(button: &ElementId, rect: &Rect, x: f64, y: f64) -> RenderInstruction {
    let dx = x - rect.left - rect.width / 2.0;
    let dy = y - rect.top - rect.height / 2.0;
    RenderInstruction::set_style(
        button,
        "transform",
        format!("translate({}px, {}px)", dx * MAGNETIC_PULL, dy * MAGNETIC_PULL),
    )
}

#[must_use]
pub fn magnetic_reset(button: &ElementId) -> RenderInstruction {
    RenderInstruction::set_style(button, "transform", "translate(0, 0)")
}

/// 3D tilt of a project card toward the pointer.
#[must_use]
pub fn tilt(card: &ElementId, rect: &Rect, x: f64, y: f64) -> RenderInstruction {
    let (fx, fy) = rect.relative(x, y);
    RenderInstruction::set_style(
        card,
        "transform",
        format!(
            "perspective(1000px) rotateY({}deg) rotateX({}deg)",
            (fx - 0.5) * TILT_DEG,
            -(fy - 0.5) * TILT_DEG
        ),
    )
}

#[must_use]
pub fn tilt_reset(card: &ElementId) -> RenderInstruction {
    RenderInstruction::set_style(card, "transform", "perspective(1000px) rotateY(0) rotateX(0)")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: Rect = Rect {
        left: 100.0,
        top: 100.0,
        width: 200.0,
        height: 100.0,
    };

    #[test]
    fn test_glow_converges() {
        let mut glow = CursorGlow::default();
        glow.step(100.0, 50.0);
        assert!((glow.x - 10.0).abs() < 1e-9);
        assert!((glow.y - 5.0).abs() < 1e-9);
        for _ in 0..200 {
            glow.step(100.0, 50.0);
        }
        assert!((glow.x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_glow_opacity() {
        assert_eq!(
            CursorGlow::enter(),
            RenderInstruction::set_style(CURSOR_GLOW, "opacity", "0.3")
        );
        assert_eq!(
            CursorGlow::leave(),
            RenderInstruction::set_style(CURSOR_GLOW, "opacity", "0")
        );
    }

    #[test]
    fn test_card_glow_percentages() {
        let card = ElementId::new("vision-1");
        let out = card_glow(&card, &RECT, 150.0, 175.0);
        assert_eq!(out[0], RenderInstruction::set_style("vision-1", "--mouse-x", "25%"));
        assert_eq!(out[1], RenderInstruction::set_style("vision-1", "--mouse-y", "75%"));
    }

    #[test]
    fn test_magnetic_from_centre() {
        let btn = ElementId::new("cta");
        assert_eq!(
            magnetic(&btn, &RECT, 250.0, 150.0),
            RenderInstruction::set_style("cta", "transform", "translate(10px, 0px)")
        );
    }

    #[test]
    fn test_tilt_toward_corner() {
        let card = ElementId::new("project");
        assert_eq!(
            tilt(&card, &RECT, 300.0, 100.0),
            RenderInstruction::set_style(
                "project",
                "transform",
                "perspective(1000px) rotateY(2.5deg) rotateX(2.5deg)"
            )
        );
    }
}
