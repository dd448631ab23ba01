//! Hard-edged circular "clear" brush.
//!
//! A stamp sets alpha to 0 for every pixel (x, y) with
//! `(x - cx)^2 + (y - cy)^2 <= r^2`, where pixel coordinates are the integer
//! indices into the mask. Stamping is monotone: it can only reveal.

use crate::types::{FOG_CLEAR, Mask};

/// Diagnostics for one brush application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StampReport {
    pub covered: usize, // pixels inside the circle (and inside the mask)
    pub cleared: usize, // of those, how many were not already revealed
}

/// Stamp a filled circle of `radius` (mask pixels) at (`cx`, `cy`).
/// Coordinates outside the mask are clamped away; never panics.
pub fn apply_brush(mask: &mut Mask, cx: f64, cy: f64, radius: f64) -> StampReport {
    let mut report = StampReport::default();
    if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius < 0.0 {
        return report;
    }
    if mask.width == 0 || mask.height == 0 {
        return report;
    }

    // Bounding box [min, max] inclusive, clamped to the mask.
    let (Some((x0, x1)), Some((y0, y1))) = (
        clamp_span(cx, radius, mask.width),
        clamp_span(cy, radius, mask.height),
    ) else {
        return report;
    };

    let r2 = radius * radius;
    for y in y0..=y1 {
        let dy = y as f64 - cy;
        let row = y * mask.width;
        for x in x0..=x1 {
            let dx = x as f64 - cx;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            report.covered += 1;
            let a = &mut mask.alpha[row + x];
            if *a != FOG_CLEAR {
                *a = FOG_CLEAR;
                report.cleared += 1;
            }
        }
    }
    report
}

/// Integer span `[floor(c - r), ceil(c + r)]` intersected with `[0, len)`.
fn clamp_span(center: f64, radius: f64, len: usize) -> Option<(usize, usize)> {
    let lo = (center - radius).floor().max(0.0);
    let hi = (center + radius).ceil().min(len as f64 - 1.0);
    if hi < lo {
        return None;
    }
    Some((lo as usize, hi as usize))
}

/// Per-session brush settings and stroke bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushState {
    pub radius: f64,           // mask-space pixels, independent of DPR
    pub is_drawing: bool,
    pub stroke_recorded: bool, // history already pushed for the active stroke
}

impl BrushState {
    pub fn new(radius: f64) -> Self {
        Self { radius, is_drawing: false, stroke_recorded: false }
    }

    pub fn begin_stroke(&mut self) {
        self.is_drawing = true;
        self.stroke_recorded = false;
    }

    pub fn end_stroke(&mut self) {
        self.is_drawing = false;
        self.stroke_recorded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FOG_OPAQUE;
    use test_log::test;

    fn inside(x: usize, y: usize, cx: f64, cy: f64, r: f64) -> bool {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        dx * dx + dy * dy <= r * r
    }

    #[test]
    fn clears_exactly_the_disc() {
        let mut mask = Mask::new(40, 30, true);
        let (cx, cy, r) = (17.3, 12.6, 6.5);
        let report = apply_brush(&mut mask, cx, cy, r);

        let mut expected = 0;
        for y in 0..mask.height {
            for x in 0..mask.width {
                let a = mask.get(x, y).unwrap();
                if inside(x, y, cx, cy, r) {
                    expected += 1;
                    assert_eq!(a, FOG_CLEAR, "({x},{y}) should be revealed");
                } else {
                    assert_eq!(a, FOG_OPAQUE, "({x},{y}) should stay fogged");
                }
            }
        }
        assert_eq!(report.covered, expected);
        assert_eq!(report.cleared, expected);
    }

    #[test]
    fn second_identical_stamp_changes_nothing() {
        let mut once = Mask::new(32, 32, true);
        apply_brush(&mut once, 10.0, 20.0, 5.0);
        let mut twice = once.clone();
        let report = apply_brush(&mut twice, 10.0, 20.0, 5.0);
        assert_eq!(once, twice);
        assert_eq!(report.cleared, 0);
        assert!(report.covered > 0);
    }

    #[test]
    fn out_of_range_center_is_clamped() {
        let mut mask = Mask::new(10, 10, true);
        let report = apply_brush(&mut mask, -3.0, 4.0, 5.0);
        assert!(report.cleared > 0);
        assert_eq!(mask.get(0, 4), Some(FOG_CLEAR));
        assert_eq!(mask.get(9, 4), Some(FOG_OPAQUE));

        let mut far = Mask::new(10, 10, true);
        let report = apply_brush(&mut far, 500.0, -500.0, 5.0);
        assert_eq!(report, StampReport::default());
        assert_eq!(far, Mask::new(10, 10, true));
    }

    #[test]
    fn corner_stamp_stays_in_bounds() {
        let mut mask = Mask::new(5, 5, true);
        apply_brush(&mut mask, 4.9, 4.9, 100.0);
        assert_eq!(mask.revealed_count(), 25);
    }

    #[test]
    fn zero_radius_clears_only_an_exact_pixel_hit() {
        let mut mask = Mask::new(5, 5, true);
        assert_eq!(apply_brush(&mut mask, 2.0, 3.0, 0.0).cleared, 1);
        assert_eq!(mask.get(2, 3), Some(FOG_CLEAR));
        assert_eq!(apply_brush(&mut mask, 1.5, 1.5, 0.0).covered, 0);
    }

    #[test]
    fn invalid_arguments_are_ignored() {
        let mut mask = Mask::new(5, 5, true);
        apply_brush(&mut mask, f64::NAN, 1.0, 3.0);
        apply_brush(&mut mask, 1.0, 1.0, -2.0);
        apply_brush(&mut mask, 1.0, 1.0, f64::INFINITY);
        assert_eq!(mask.revealed_count(), 0);

        let mut empty = Mask::new(0, 0, true);
        assert_eq!(apply_brush(&mut empty, 0.0, 0.0, 3.0), StampReport::default());
    }

    #[test]
    fn stroke_flags_reset_on_begin_and_end() {
        let mut brush = BrushState::new(50.0);
        brush.begin_stroke();
        brush.stroke_recorded = true;
        brush.end_stroke();
        assert!(!brush.is_drawing && !brush.stroke_recorded);
    }
}
