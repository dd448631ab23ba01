//! `FogSession`: one loaded video's worth of fog state.
//!
//! The session is the context object every core operation goes through. It
//! owns the mask store, undo history, brush and gesture state, and drives the
//! readiness state machine:
//!
//! ```text
//! Unloaded --attach_video--> MetadataPending --poll ok--> Ready
//!     ^                         ^    |  (retry after delay)  |
//!     |                         |    +-----------------------+ resolve fails
//!     +------detach_video-------+----------------------------+
//! ```

use std::time::Instant;

use log::{debug, info, warn};

use crate::brush::{BrushState, StampReport};
use crate::compositor::{Compositor, FrameOutcome};
use crate::config::Config;
use crate::geometry::{self, DisplayGeometry, Viewport};
use crate::history::History;
use crate::input::{GestureAction, GestureMachine, GestureState, map_to_mask};
use crate::mask::MaskStore;
use crate::surface::PresentationSurface;
use crate::types::{Mask, ScreenPoint, SurfaceRect};
use crate::video::VideoSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    /// Waiting for video metadata or a usable container. `retry_at` is the
    /// earliest time the next resolve attempt may run.
    MetadataPending { retry_at: Option<Instant> },
    Ready,
}

/// Raw input from the shell, in screen (logical) pixels. Touch events carry
/// every contact still active after the event.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    MouseDown(ScreenPoint),
    MouseMove(ScreenPoint),
    MouseUp,
    TouchStart(Vec<ScreenPoint>),
    TouchMove(Vec<ScreenPoint>),
    TouchEnd(Vec<ScreenPoint>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResponse {
    Ignored,
    Painted(StampReport),
    StrokeEnded,
    MenuRequested,
}

pub struct FogSession {
    config: Config,
    state: SessionState,
    viewport: Option<Viewport>,
    geometry: Option<DisplayGeometry>,
    surface_rect: SurfaceRect,
    surface_stale: bool,
    store: MaskStore,
    history: History,
    brush: BrushState,
    gestures: GestureMachine,
    compositor: Compositor,
}

impl FogSession {
    pub fn new(config: Config) -> Self {
        let config = config.validate();
        Self {
            state: SessionState::Unloaded,
            viewport: None,
            geometry: None,
            surface_rect: SurfaceRect::default(),
            surface_stale: true,
            store: MaskStore::default(),
            history: History::new(config.history.capacity),
            brush: BrushState::new(config.brush.radius),
            gestures: GestureMachine::new(config.gestures.menu_window()),
            compositor: Compositor::new(config.fog.fog_color, config.fog.placeholder_color),
            config,
        }
    }

    // --- lifecycle ---

    /// A new video was handed over; wait for its metadata.
    pub fn attach_video(&mut self) {
        info!("video attached, waiting for metadata");
        self.clear_fog_state();
        self.state = SessionState::MetadataPending { retry_at: None };
    }

    pub fn detach_video(&mut self) {
        info!("video detached");
        self.clear_fog_state();
        self.state = SessionState::Unloaded;
    }

    fn clear_fog_state(&mut self) {
        self.geometry = None;
        self.store = MaskStore::default();
        self.history.clear();
        self.cancel_stroke();
        self.compositor.invalidate();
        self.surface_stale = true;
    }

    fn cancel_stroke(&mut self) {
        self.brush.end_stroke();
        self.gestures.reset();
    }

    /// Container size or DPR changed. A ready session re-resolves at once.
    pub fn set_viewport(&mut self, viewport: Viewport, video: &dyn VideoSource, now: Instant) {
        if self.viewport == Some(viewport) {
            return;
        }
        debug!("viewport {}x{} @{}", viewport.width, viewport.height, viewport.device_pixel_ratio);
        self.viewport = Some(viewport);
        match self.state {
            SessionState::Unloaded => {}
            SessionState::MetadataPending { .. } => {
                self.state = SessionState::MetadataPending { retry_at: None };
                self.poll(video, now);
            }
            SessionState::Ready => self.resolve(video, now),
        }
    }

    /// Attempt pending geometry resolution if its retry time has come.
    pub fn poll(&mut self, video: &dyn VideoSource, now: Instant) -> SessionState {
        if let SessionState::MetadataPending { retry_at } = self.state {
            if retry_at.is_none_or(|at| now >= at) {
                self.resolve(video, now);
            }
        }
        self.state
    }

    fn resolve(&mut self, video: &dyn VideoSource, now: Instant) {
        let (vw, vh) = video.intrinsic_size().unwrap_or((0, 0));
        let result = match self.viewport {
            Some(viewport) => geometry::resolve(viewport, vw, vh, self.config.display.scale_factor)
                .map(|g| (g, viewport)),
            None => Err(geometry::GeometryError::InvalidContainer),
        };
        match result {
            Ok((g, viewport)) => self.apply_geometry(g, viewport),
            Err(e) => {
                let retry = self.config.timing.geometry_retry();
                debug!("geometry not ready ({e}), retrying in {retry:?}");
                if self.state == SessionState::Ready {
                    self.cancel_stroke();
                }
                self.state = SessionState::MetadataPending { retry_at: Some(now + retry) };
            }
        }
    }

    fn apply_geometry(&mut self, g: DisplayGeometry, viewport: Viewport) {
        let (w, h) = g.mask_size();
        if self.store.mask().is_empty() || self.store.size() != (w, h) {
            // New display size: the old mask and its snapshots no longer fit.
            self.cancel_stroke();
            self.history.clear();
            self.store.initialize(w, h, self.config.fog.start_fogged);
        } else {
            // Only the DPR/backing changed; the display-space mask stays valid.
            self.store.mark_dirty();
        }
        self.surface_rect = g.layout(viewport, self.config.display.scale_factor);
        self.geometry = Some(g);
        self.surface_stale = true;
        if self.state != SessionState::Ready {
            info!(
                "session ready: video {}x{}, display {:.1}x{:.1}, mask {w}x{h}, dpr {}",
                g.video_width,
                g.video_height,
                g.display_width,
                g.display_height,
                g.device_pixel_ratio
            );
        }
        self.state = SessionState::Ready;
    }

    // --- frame ---

    /// One frame: advance the video, finish any pending setup, composite.
    pub fn render(
        &mut self,
        video: &mut dyn VideoSource,
        surface: &mut dyn PresentationSurface,
        now: Instant,
    ) -> FrameOutcome {
        video.advance(now);
        if self.poll(&*video, now) != SessionState::Ready {
            return FrameOutcome::NotReady;
        }
        if self.surface_stale {
            if let Some(g) = self.geometry {
                surface.set_logical_size(g.display_width, g.display_height);
                let (bw, bh) = g.backing_size();
                surface.set_backing_size(bw, bh);
                self.surface_stale = false;
            }
        }
        let outcome = self.compositor.render(video, &mut self.store, surface);
        if outcome == FrameOutcome::NoSurface {
            // Lost the raster; set the surface up again next frame.
            self.surface_stale = true;
        }
        outcome
    }

    // --- input ---

    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant) -> InputResponse {
        let action = match event {
            PointerEvent::MouseDown(p) => self.gestures.mouse_down(*p),
            PointerEvent::MouseMove(p) => self.gestures.mouse_move(*p),
            PointerEvent::MouseUp => self.gestures.mouse_up(),
            PointerEvent::TouchStart(t) => self.gestures.touch_start(t, now),
            PointerEvent::TouchMove(t) => self.gestures.touch_move(t),
            PointerEvent::TouchEnd(t) => self.gestures.touch_end(t, now),
        };
        match action {
            GestureAction::None => InputResponse::Ignored,
            GestureAction::StrokeBegin(p) => {
                self.brush.begin_stroke();
                self.paint(p)
            }
            GestureAction::StrokeContinue(p) if self.brush.is_drawing => self.paint(p),
            GestureAction::StrokeContinue(_) => InputResponse::Ignored,
            GestureAction::StrokeEnd => {
                self.brush.end_stroke();
                InputResponse::StrokeEnded
            }
            GestureAction::OpenMenu => {
                info!("two-finger tap: menu requested");
                InputResponse::MenuRequested
            }
        }
    }

    fn paint(&mut self, at: ScreenPoint) -> InputResponse {
        if self.state != SessionState::Ready {
            return InputResponse::Ignored;
        }
        let (w, h) = self.store.size();
        let Some(point) = map_to_mask(at, self.surface_rect, w, h) else {
            warn!("surface has no size, dropping brush point");
            return InputResponse::Ignored;
        };
        // One history entry per stroke: the mask as it was before the first
        // stamp that actually cleared something.
        let pending = (!self.brush.stroke_recorded).then(|| self.store.snapshot());
        let report = self.store.stamp(point, self.brush.radius);
        if let Some(before) = pending {
            if report.cleared > 0 {
                self.history.push_snapshot(before);
                self.brush.stroke_recorded = true;
            }
        }
        debug!(
            "stamp at ({:.1}, {:.1}) r={}: {} covered, {} cleared",
            point.x, point.y, self.brush.radius, report.covered, report.cleared
        );
        InputResponse::Painted(report)
    }

    // --- whole-mask operations ---

    /// Restore the mask from before the last recorded action. Returns false
    /// (and does nothing) when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop_and_restore() else {
            debug!("nothing to undo");
            return false;
        };
        if (previous.width, previous.height) != self.store.size() {
            warn!(
                "discarding undo snapshot with stale size {}x{}",
                previous.width, previous.height
            );
            return false;
        }
        self.store.replace(previous);
        // An undo ends the active drag; painting resumes on the next press.
        if self.brush.is_drawing {
            self.brush.end_stroke();
        }
        info!("undo ({} left)", self.history.len());
        true
    }

    /// Fog everything again. Recorded in history.
    pub fn reset_fog(&mut self) -> bool {
        self.fill(true)
    }

    /// Reveal everything. Recorded in history.
    pub fn reveal_all(&mut self) -> bool {
        self.fill(false)
    }

    fn fill(&mut self, opaque: bool) -> bool {
        if self.state != SessionState::Ready {
            return false;
        }
        let (w, h) = self.store.size();
        self.history.push_snapshot(self.store.snapshot());
        self.store.replace(Mask::new(w, h, opaque));
        info!("{}", if opaque { "fog reset" } else { "fog revealed" });
        true
    }

    // --- brush ---

    /// Set the brush radius (mask pixels), clamped to the configured range.
    pub fn set_brush_radius(&mut self, radius: f64) -> f64 {
        let b = &self.config.brush;
        if radius.is_finite() {
            self.brush.radius = radius.clamp(b.min_radius, b.max_radius);
        }
        self.brush.radius
    }

    pub fn grow_brush(&mut self) -> f64 {
        self.set_brush_radius(self.brush.radius + self.config.brush.step)
    }

    pub fn shrink_brush(&mut self) -> f64 {
        self.set_brush_radius(self.brush.radius - self.config.brush.step)
    }

    // --- accessors ---

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn geometry(&self) -> Option<DisplayGeometry> {
        self.geometry
    }

    /// The live mask, once the session is ready.
    pub fn mask(&self) -> Option<&Mask> {
        (self.state == SessionState::Ready).then(|| self.store.mask())
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn brush_radius(&self) -> f64 {
        self.brush.radius
    }

    pub fn is_drawing(&self) -> bool {
        self.brush.is_drawing
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    pub fn surface_rect(&self) -> SurfaceRect {
        self.surface_rect
    }

    /// Override where the surface sits on screen when the shell lays it out
    /// differently from the default centering. Reset on the next resize.
    pub fn set_surface_rect(&mut self, rect: SurfaceRect) {
        self.surface_rect = rect;
    }

    pub fn frames_composited(&self) -> u64 {
        self.compositor.frames()
    }
}
