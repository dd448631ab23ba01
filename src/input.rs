//! Pointer/touch input: screen → mask coordinates and gesture disambiguation.

use std::time::{Duration, Instant};

use log::debug;

use crate::types::{MaskPoint, ScreenPoint, SurfaceRect};

pub const DEFAULT_MENU_WINDOW: Duration = Duration::from_millis(500);

/// Convert a screen point to mask space. The scale is recomputed from the
/// current surface and mask sizes on every call, since they can disagree
/// briefly after a resize. Returns `None` for a degenerate surface.
pub fn map_to_mask(
    point: ScreenPoint,
    surface: SurfaceRect,
    mask_width: usize,
    mask_height: usize,
) -> Option<MaskPoint> {
    if !(surface.width.is_finite() && surface.width > 0.0)
        || !(surface.height.is_finite() && surface.height > 0.0)
    {
        return None;
    }
    let scale_x = mask_width as f64 / surface.width;
    let scale_y = mask_height as f64 / surface.height;
    Some(MaskPoint {
        x: (point.x - surface.left) * scale_x,
        y: (point.y - surface.top) * scale_y,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    SingleDraw,
    TwoFingerPending { since: Instant },
}

/// What the caller should do in response to an input event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureAction {
    None,
    StrokeBegin(ScreenPoint),
    StrokeContinue(ScreenPoint),
    StrokeEnd,
    OpenMenu,
}

/// Idle / SingleDraw / TwoFingerPending state machine.
#[derive(Debug)]
pub struct GestureMachine {
    state: GestureState,
    menu_window: Duration,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new(DEFAULT_MENU_WINDOW)
    }
}

impl GestureMachine {
    pub fn new(menu_window: Duration) -> Self {
        Self { state: GestureState::Idle, menu_window }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Drop any gesture in progress (e.g. on resize).
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    // --- mouse: always a single pointer ---

    pub fn mouse_down(&mut self, at: ScreenPoint) -> GestureAction {
        self.state = GestureState::SingleDraw;
        GestureAction::StrokeBegin(at)
    }

    pub fn mouse_move(&mut self, at: ScreenPoint) -> GestureAction {
        match self.state {
            GestureState::SingleDraw => GestureAction::StrokeContinue(at),
            _ => GestureAction::None,
        }
    }

    pub fn mouse_up(&mut self) -> GestureAction {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::SingleDraw => GestureAction::StrokeEnd,
            _ => GestureAction::None,
        }
    }

    // --- touch: `touches` is the full list of active contacts after the event ---

    pub fn touch_start(&mut self, touches: &[ScreenPoint], now: Instant) -> GestureAction {
        match (self.state, touches) {
            (_, []) => self.release(now),
            (GestureState::Idle, [only]) => {
                self.state = GestureState::SingleDraw;
                GestureAction::StrokeBegin(*only)
            }
            (GestureState::TwoFingerPending { .. }, _) => GestureAction::None,
            (GestureState::SingleDraw, [only]) => GestureAction::StrokeContinue(*only),
            (previous, _) => {
                debug!("second contact, suspending drawing");
                self.state = GestureState::TwoFingerPending { since: now };
                if previous == GestureState::SingleDraw {
                    GestureAction::StrokeEnd
                } else {
                    GestureAction::None
                }
            }
        }
    }

    pub fn touch_move(&mut self, touches: &[ScreenPoint]) -> GestureAction {
        match (self.state, touches) {
            (GestureState::SingleDraw, [only]) => GestureAction::StrokeContinue(*only),
            _ => GestureAction::None,
        }
    }

    pub fn touch_end(&mut self, remaining: &[ScreenPoint], now: Instant) -> GestureAction {
        if remaining.is_empty() {
            return self.release(now);
        }
        // Lifting one of several fingers keeps the pending gesture alive.
        GestureAction::None
    }

    fn release(&mut self, now: Instant) -> GestureAction {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => GestureAction::None,
            GestureState::SingleDraw => GestureAction::StrokeEnd,
            GestureState::TwoFingerPending { since } => {
                let held = now.saturating_duration_since(since);
                if held <= self.menu_window {
                    GestureAction::OpenMenu
                } else {
                    debug!("two-finger touch held {held:?}, ignoring");
                    GestureAction::None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn p(x: f64, y: f64) -> ScreenPoint {
        ScreenPoint::new(x, y)
    }

    #[test]
    fn maps_relative_to_surface_origin() {
        let surface = SurfaceRect { left: 100.0, top: 20.0, width: 400.0, height: 300.0 };
        let m = map_to_mask(p(150.0, 50.0), surface, 400, 300).unwrap();
        assert_eq!((m.x, m.y), (50.0, 30.0));
    }

    #[test]
    fn maps_through_drifted_surface_size() {
        // Surface shown at 200x150 while the mask is still 400x300.
        let surface = SurfaceRect { left: 0.0, top: 0.0, width: 200.0, height: 150.0 };
        let m = map_to_mask(p(10.0, 15.0), surface, 400, 300).unwrap();
        assert_eq!((m.x, m.y), (20.0, 30.0));
        assert!(map_to_mask(p(1.0, 1.0), SurfaceRect::default(), 400, 300).is_none());
    }

    #[test]
    fn mouse_drag_is_one_stroke() {
        let mut g = GestureMachine::default();
        assert_eq!(g.mouse_move(p(1.0, 1.0)), GestureAction::None);
        assert_eq!(g.mouse_down(p(1.0, 1.0)), GestureAction::StrokeBegin(p(1.0, 1.0)));
        assert_eq!(g.mouse_move(p(2.0, 2.0)), GestureAction::StrokeContinue(p(2.0, 2.0)));
        assert_eq!(g.mouse_up(), GestureAction::StrokeEnd);
        assert_eq!(g.state(), GestureState::Idle);
        assert_eq!(g.mouse_up(), GestureAction::None);
    }

    #[test]
    fn single_touch_draws_until_release() {
        let t0 = Instant::now();
        let mut g = GestureMachine::default();
        assert_eq!(g.touch_start(&[p(5.0, 5.0)], t0), GestureAction::StrokeBegin(p(5.0, 5.0)));
        assert_eq!(g.touch_move(&[p(6.0, 5.0)]), GestureAction::StrokeContinue(p(6.0, 5.0)));
        assert_eq!(g.touch_end(&[], t0), GestureAction::StrokeEnd);
        assert_eq!(g.state(), GestureState::Idle);
    }

    #[test]
    fn quick_two_finger_tap_opens_menu() {
        let t0 = Instant::now();
        let mut g = GestureMachine::default();
        g.touch_start(&[p(1.0, 1.0)], t0);
        let action = g.touch_start(&[p(1.0, 1.0), p(50.0, 1.0)], t0);
        assert_eq!(action, GestureAction::StrokeEnd);
        assert!(matches!(g.state(), GestureState::TwoFingerPending { .. }));

        // No drawing while pending, even with one finger left.
        assert_eq!(g.touch_move(&[p(2.0, 2.0), p(51.0, 2.0)]), GestureAction::None);
        assert_eq!(g.touch_end(&[p(2.0, 2.0)], t0), GestureAction::None);
        assert_eq!(g.touch_move(&[p(3.0, 3.0)]), GestureAction::None);

        let t1 = t0 + Duration::from_millis(400);
        assert_eq!(g.touch_end(&[], t1), GestureAction::OpenMenu);
        assert_eq!(g.state(), GestureState::Idle);
    }

    #[test]
    fn slow_two_finger_touch_is_ignored() {
        let t0 = Instant::now();
        let mut g = GestureMachine::default();
        assert_eq!(g.touch_start(&[p(1.0, 1.0), p(9.0, 9.0)], t0), GestureAction::None);
        let late = t0 + Duration::from_millis(501);
        assert_eq!(g.touch_end(&[], late), GestureAction::None);
        assert_eq!(g.state(), GestureState::Idle);
    }

    #[test]
    fn window_is_measured_from_entering_pending() {
        let t0 = Instant::now();
        let mut g = GestureMachine::default();
        g.touch_start(&[p(1.0, 1.0), p(9.0, 9.0)], t0);
        // A third finger does not restart the window.
        g.touch_start(&[p(1.0, 1.0), p(9.0, 9.0), p(5.0, 5.0)], t0 + Duration::from_millis(300));
        assert_eq!(g.touch_end(&[], t0 + Duration::from_millis(500)), GestureAction::OpenMenu);
    }
}
