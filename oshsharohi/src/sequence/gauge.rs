//! Intro speed gauge
//!
//! The needle readout ramps to [`GaugeConfig::target`] over
//! [`GaugeConfig::duration_ms`] with a cubic ease-out and a small sinusoidal
//! wobble. The fill arc is scaled against [`GaugeConfig::dial_max`], which
//! is larger than the target, so the arc never fills completely.

use std::f64::consts::PI;

use oshsharohi_core::config::schema::GaugeConfig;

use crate::surface::{ElementId, NodeSpec, RenderInstruction};

/// Element showing the numeric speed.
pub const SPEED_ELEMENT: &str = "loader-speed";
/// SVG container of the dial.
pub const GAUGE_SVG: &str = "gauge-svg";
/// Foreground (fill) arc node.
pub const FILL_ARC: &str = "gauge-progress-fg";
/// Background rim arc node.
pub const RIM_ARC: &str = "gauge-progress-bg";

/// Fixed dial geometry in SVG user units and degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialGeometry {
    pub cx: f64,
    pub cy: f64,
    /// Angle of the zero mark (bottom left)
    pub start_angle: f64,
    /// Angular span from zero to `dial_max`
    pub sweep: f64,
    /// Radius of the rim and fill arcs
    pub arc_radius: f64,
    pub tick_outer: f64,
    pub major_tick_inner: f64,
    pub minor_tick_inner: f64,
    pub label_radius: f64,
    pub major_step: u32,
    pub minor_step: u32,
}

impl Default for DialGeometry {
    fn default() -> Self {
        Self {
            cx: 100.0,
            cy: 100.0,
            start_angle: 150.0,
            sweep: 240.0,
            arc_radius: 90.0,
            tick_outer: 85.0,
            major_tick_inner: 70.0,
            minor_tick_inner: 80.0,
            label_radius: 58.0,
            major_step: 20,
            minor_step: 5,
        }
    }
}

/// One tick mark on the dial face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub value: u32,
    pub major: bool,
    pub inner: (f64, f64),
    pub outer: (f64, f64),
    /// Label anchor, present on major ticks
    pub label: Option<(f64, f64)>,
}

impl DialGeometry {
    /// Point at `angle` degrees and radius `r` from the centre.
    #[must_use]
    pub fn point(&self, angle: f64, r: f64) -> (f64, f64) {
        let rad = angle * PI / 180.0;
        (self.cx + r * rad.cos(), self.cy + r * rad.sin())
    }

    /// SVG path for a clockwise arc of radius `r` between two angles.
    #[must_use]
    pub fn arc_path(&self, r: f64, start: f64, end: f64) -> String {
        let (sx, sy) = self.point(start, r);
        let (ex, ey) = self.point(end, r);
        let large_arc = if end - start <= 180.0 { "0" } else { "1" };
        format!("M {sx} {sy} A {r} {r} 0 {large_arc} 1 {ex} {ey}")
    }

    /// Length of the fill arc.
    #[must_use]
    pub fn arc_length(&self) -> f64 {
        2.0 * PI * self.arc_radius * (self.sweep / 360.0)
    }

    /// Angle of `value` on a dial spanning `0..=dial_max`.
    #[must_use]
    pub fn angle_of(&self, value: u32, dial_max: u32) -> f64 {
        if dial_max == 0 {
            return self.start_angle;
        }
        self.start_angle + f64::from(value) / f64::from(dial_max) * self.sweep
    }

    /// Tick marks from 0 to `dial_max` in `minor_step` increments.
    #[must_use]
    pub fn ticks(&self, dial_max: u32) -> Vec<Tick> {
        let step = self.minor_step.max(1);
        (0..=dial_max)
            .step_by(step as usize)
            .map(|value| {
                let angle = self.angle_of(value, dial_max);
                let major = self.major_step != 0 && value % self.major_step == 0;
                let inner_r = if major {
                    self.major_tick_inner
                } else {
                    self.minor_tick_inner
                };
                Tick {
                    value,
                    major,
                    inner: self.point(angle, inner_r),
                    outer: self.point(angle, self.tick_outer),
                    label: major.then(|| self.point(angle, self.label_radius)),
                }
            })
            .collect()
    }

    /// Instructions drawing the rim, the empty fill arc, ticks and labels
    /// into [`GAUGE_SVG`].
    #[must_use]
    pub fn face(&self, dial_max: u32) -> Vec<RenderInstruction> {
        let parent = ElementId::new(GAUGE_SVG);
        let end = self.start_angle + self.sweep;
        let arc = self.arc_path(self.arc_radius, self.start_angle, end);
        let length = self.arc_length();

        let mut out = vec![
            RenderInstruction::Append {
                parent: parent.clone(),
                node: NodeSpec::new(RIM_ARC, "path")
                    .class(RIM_ARC)
                    .attr("d", &arc),
            },
            RenderInstruction::Append {
                parent: parent.clone(),
                node: NodeSpec::new(FILL_ARC, "path")
                    .class(FILL_ARC)
                    .attr("d", &arc)
                    .style("stroke-dasharray", length)
                    .style("stroke-dashoffset", length),
            },
        ];

        for tick in self.ticks(dial_max) {
            let class = if tick.major {
                "gauge-tick-major"
            } else {
                "gauge-tick-minor"
            };
            out.push(RenderInstruction::Append {
                parent: parent.clone(),
                node: NodeSpec::new(format!("gauge-tick-{}", tick.value), "line")
                    .class(class)
                    .attr("x1", tick.inner.0)
                    .attr("y1", tick.inner.1)
                    .attr("x2", tick.outer.0)
                    .attr("y2", tick.outer.1),
            });
            if let Some((x, y)) = tick.label {
                out.push(RenderInstruction::Append {
                    parent: parent.clone(),
                    node: NodeSpec::new(format!("gauge-label-{}", tick.value), "text")
                        .class("gauge-label")
                        .attr("x", x)
                        .attr("y", y)
                        .text(tick.value),
                });
            }
        }
        out
    }
}

/// Linear ramp progress in `[0, 1]`.
#[must_use]
pub fn linear_progress(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0)
}

/// Cubic ease-out: `1 - (1 - p)^3`.
#[must_use]
pub fn ease_out_cubic(p: f64) -> f64 {
    1.0 - (1.0 - p).powi(3)
}

/// Speed shown `elapsed_ms` after the ramp started.
///
/// `max(0, floor(eased * target + sin(e / 100) * 3 * p))`, pinned to the
/// target once the ramp is over.
#[must_use]
pub fn displayed_speed(elapsed_ms: f64, config: &GaugeConfig) -> u32 {
    #[allow(clippy::cast_precision_loss)]
    let duration = config.duration_ms as f64;
    let progress = linear_progress(elapsed_ms, duration);
    if progress >= 1.0 {
        return config.target;
    }
    let fluctuation = (elapsed_ms / 100.0).sin() * 3.0 * progress;
    // unfused, so floor boundaries match the browser arithmetic
    #[allow(clippy::suboptimal_flops)]
    let value = ease_out_cubic(progress) * f64::from(config.target) + fluctuation;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let shown = value.floor().max(0.0) as u32;
    shown
}

/// Fraction of the dial covered by `displayed`, against `dial_max`.
#[must_use]
pub fn dial_ratio(displayed: u32, dial_max: u32) -> f64 {
    if dial_max == 0 {
        return 1.0;
    }
    (f64::from(displayed) / f64::from(dial_max)).min(1.0)
}

/// Stroke dash offset leaving `ratio` of an arc of `arc_length` visible.
#[must_use]
pub fn stroke_offset(ratio: f64, arc_length: f64) -> f64 {
    ratio.mul_add(-arc_length, arc_length)
}

/// Gauge state for one animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeReading {
    pub elapsed_ms: f64,
    pub progress: f64,
    pub displayed: u32,
    pub dial_ratio: f64,
    pub stroke_offset: f64,
}

impl GaugeReading {
    /// Computes the reading `elapsed_ms` into the ramp.
    #[must_use]
    pub fn at(elapsed_ms: f64, config: &GaugeConfig, geometry: &DialGeometry) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let progress = linear_progress(elapsed_ms, config.duration_ms as f64);
        let displayed = displayed_speed(elapsed_ms, config);
        let ratio = dial_ratio(displayed, config.dial_max);
        Self {
            elapsed_ms,
            progress,
            displayed,
            dial_ratio: ratio,
            stroke_offset: stroke_offset(ratio, geometry.arc_length()),
        }
    }

    /// Whether this is the final frame of the ramp.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    /// Instructions updating the readout and the fill arc.
    #[must_use]
    pub fn render(&self) -> Vec<RenderInstruction> {
        vec![
            RenderInstruction::set_text(SPEED_ELEMENT, self.displayed),
            RenderInstruction::set_style(FILL_ARC, "stroke-dashoffset", self.stroke_offset),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> GaugeConfig {
        GaugeConfig::default()
    }

    #[test]
    fn test_start_reads_zero() {
        assert_eq!(displayed_speed(0.0, &config()), 0);
    }

    #[test]
    fn test_end_reads_target_exactly() {
        assert_eq!(displayed_speed(6000.0, &config()), 120);
        assert_eq!(displayed_speed(9000.0, &config()), 120);
    }

    #[test]
    fn test_dial_ratio_at_end_uses_dial_max() {
        let reading = GaugeReading::at(6000.0, &config(), &DialGeometry::default());
        assert!((reading.dial_ratio - 120.0 / 180.0).abs() < 1e-9);
        assert!(reading.is_finished());
    }

    #[test]
    fn test_midpoint_matches_formula() {
        // e = 3000: p = 0.5, eased = 0.875, wobble = sin(30) * 1.5
        let expected = (0.875f64 * 120.0 + 30f64.sin() * 1.5).floor();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected = expected as u32;
        assert_eq!(displayed_speed(3000.0, &config()), expected);
    }

    #[test]
    fn test_early_frames_follow_formula_and_never_wrap() {
        let mut previous = 0;
        for e in 0..700 {
            let e = f64::from(e);
            let p = e / 6000.0;
            let expected = (ease_out_cubic(p) * 120.0 + (e / 100.0).sin() * 3.0 * p)
                .floor()
                .max(0.0);
            let shown = displayed_speed(e, &config());
            assert!((f64::from(shown) - expected).abs() < f64::EPSILON, "at {e} ms");
            assert!(shown < 45, "at {e} ms shown {shown}");
            assert!(shown + 1 >= previous, "at {e} ms dropped from {previous}");
            previous = shown;
        }
    }

    #[test]
    fn test_elapsed_before_start_reads_zero() {
        assert_eq!(displayed_speed(-50.0, &config()), 0);
        assert_eq!(displayed_speed(-1.0e9, &config()), 0);
    }

    #[test]
    fn test_arc_length() {
        let geometry = DialGeometry::default();
        let expected = 2.0 * PI * 90.0 * (240.0 / 360.0);
        assert!((geometry.arc_length() - expected).abs() < 1e-9);
        assert!((geometry.arc_length() - 376.99).abs() < 0.01);
    }

    #[test]
    fn test_stroke_offset_bounds() {
        assert!((stroke_offset(0.0, 377.0) - 377.0).abs() < 1e-9);
        assert!(stroke_offset(1.0, 377.0).abs() < 1e-9);
    }

    #[test]
    fn test_ticks_cover_dial() {
        let ticks = DialGeometry::default().ticks(180);
        assert_eq!(ticks.len(), 37);
        assert_eq!(ticks.iter().filter(|t| t.major).count(), 10);
        assert!(ticks.iter().all(|t| t.major == t.label.is_some()));
        assert_eq!(ticks.last().map(|t| t.value), Some(180));
    }

    #[test]
    fn test_zero_tick_at_start_angle() {
        let geometry = DialGeometry::default();
        let tick = geometry.ticks(180)[0];
        let (x, y) = geometry.point(150.0, 85.0);
        assert!((tick.outer.0 - x).abs() < 1e-9);
        assert!((tick.outer.1 - y).abs() < 1e-9);
    }

    #[test]
    fn test_arc_path_uses_large_arc_for_wide_sweep() {
        let geometry = DialGeometry::default();
        let path = geometry.arc_path(90.0, 150.0, 390.0);
        assert!(path.starts_with("M "));
        assert!(path.contains(" A 90 90 0 1 1 "));
        let narrow = geometry.arc_path(90.0, 150.0, 200.0);
        assert!(narrow.contains(" A 90 90 0 0 1 "));
    }

    #[test]
    fn test_face_starts_empty() {
        let face = DialGeometry::default().face(180);
        let fill = face
            .iter()
            .find_map(|i| match i {
                RenderInstruction::Append { node, .. } if node.id.as_str() == FILL_ARC => {
                    Some(node.clone())
                }
                _ => None,
            })
            .unwrap();
        let dasharray = &fill.style[0].1;
        let dashoffset = &fill.style[1].1;
        assert_eq!(dasharray, dashoffset);
        // rim + fill + 37 ticks + 10 labels
        assert_eq!(face.len(), 2 + 37 + 10);
    }

    #[test]
    fn test_render_sets_text_and_offset() {
        let reading = GaugeReading::at(6000.0, &config(), &DialGeometry::default());
        let out = reading.render();
        assert_eq!(out[0], RenderInstruction::set_text(SPEED_ELEMENT, 120));
        assert!(matches!(
            &out[1],
            RenderInstruction::SetStyle { property, .. } if property == "stroke-dashoffset"
        ));
    }

    proptest! {
        #[test]
        fn prop_ratio_never_exceeds_one(e in 0.0f64..20_000.0) {
            let reading = GaugeReading::at(e, &config(), &DialGeometry::default());
            prop_assert!(reading.dial_ratio >= 0.0);
            prop_assert!(reading.dial_ratio <= 1.0);
            prop_assert!(reading.stroke_offset >= 0.0);
        }

        #[test]
        fn prop_reading_within_wobble_of_target(e in 0.0f64..6000.0) {
            // the wobble is at most 3 either side of the eased value
            let shown = displayed_speed(e, &config());
            prop_assert!(shown <= 123);
        }

        #[test]
        fn prop_after_ramp_is_target(e in 6000.0f64..100_000.0) {
            prop_assert_eq!(displayed_speed(e, &config()), 120);
        }
    }
}
