//! Per-frame compositing: video first, fog on top.
//!
//! The mask lives at display resolution while the surface is DPR-scaled, so
//! the compositor keeps a fog layer already scaled to backing resolution and
//! only rebuilds it when the mask store is dirty or the surface size changed.

use log::{info, warn};

use crate::mask::MaskStore;
use crate::surface::PresentationSurface;
use crate::types::{FOG_CLEAR, FOG_OPAQUE, FrameBuffer, Mask, sample_columns};
use crate::video::VideoSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    NotReady,    // session has no geometry yet; nothing drawn
    Placeholder, // video has no frame; placeholder fill drawn
    Composited,  // video + fog drawn
    Skipped,     // video draw failed; surface untouched
    NoSurface,   // no raster to draw into
}

pub struct Compositor {
    fog_color: u32,
    placeholder: u32,
    video_frame: FrameBuffer, // scratch at backing resolution
    fog_layer: Vec<u8>,       // mask alpha scaled to backing resolution
    fog_size: (usize, usize),
    frames: u64,
    draw_failures: u32,
    surface_missing: bool,
}

impl Compositor {
    pub fn new(fog_color: u32, placeholder: u32) -> Self {
        Self {
            fog_color,
            placeholder,
            video_frame: FrameBuffer::filled(0, 0, 0),
            fog_layer: Vec::new(),
            fog_size: (0, 0),
            frames: 0,
            draw_failures: 0,
            surface_missing: false,
        }
    }

    /// Number of frames composited so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forget the cached fog layer (e.g. new session geometry).
    pub fn invalidate(&mut self) {
        self.fog_size = (0, 0);
        self.frames = 0;
    }

    pub fn render(
        &mut self,
        video: &mut dyn VideoSource,
        store: &mut MaskStore,
        surface: &mut dyn PresentationSurface,
    ) -> FrameOutcome {
        let Some(target) = surface.raster() else {
            if !self.surface_missing {
                warn!("presentation surface has no raster, frame aborted");
                self.surface_missing = true;
            }
            return FrameOutcome::NoSurface;
        };
        self.surface_missing = false;

        if !video.has_frame() {
            target.fill(self.placeholder);
            return FrameOutcome::Placeholder;
        }

        // Draw into scratch first so a failed draw never leaves a torn frame.
        self.video_frame.resize(target.width, target.height);
        if let Err(e) = video.draw_into(&mut self.video_frame) {
            if self.draw_failures == 0 {
                warn!("video draw failed, skipping frame: {e}");
            }
            self.draw_failures = self.draw_failures.saturating_add(1);
            return FrameOutcome::Skipped;
        }
        self.draw_failures = 0;

        let size = (target.width, target.height);
        let dirty = store.take_dirty();
        if dirty || self.fog_size != size {
            rebuild_fog_layer(&mut self.fog_layer, store.mask(), size);
            self.fog_size = size;
        }

        blend_fog(target, &self.video_frame, &self.fog_layer, self.fog_color);

        if self.frames == 0 {
            info!(
                "first frame composited: surface {}x{}, mask {}x{}",
                size.0,
                size.1,
                store.mask().width,
                store.mask().height
            );
        }
        self.frames += 1;
        FrameOutcome::Composited
    }
}

/// Nearest-neighbour upscale of the mask alpha to `width` x `height`.
fn rebuild_fog_layer(layer: &mut Vec<u8>, mask: &Mask, (width, height): (usize, usize)) {
    layer.clear();
    if mask.is_empty() {
        layer.resize(width * height, FOG_CLEAR);
        return;
    }
    layer.reserve(width * height);
    let xs = sample_columns(mask.width, width);
    for y in 0..height {
        let sy = y * mask.height / height;
        let row = &mask.alpha[sy * mask.width..(sy + 1) * mask.width];
        layer.extend(xs.iter().map(|&sx| row[sx]));
    }
}

/// `out = video * (1 - a) + fog * a`, per channel, a = alpha / 255.
fn blend_fog(target: &mut FrameBuffer, video: &FrameBuffer, fog: &[u8], fog_color: u32) {
    for ((dst, &src), &a) in target.pixels.iter_mut().zip(&video.pixels).zip(fog) {
        *dst = match a {
            FOG_CLEAR => src,
            FOG_OPAQUE => fog_color,
            _ => mix(src, fog_color, a),
        };
    }
}

#[inline]
fn mix(under: u32, over: u32, alpha: u8) -> u32 {
    let a = alpha as u32;
    let channel = |shift: u32| {
        let u = (under >> shift) & 0xFF;
        let o = (over >> shift) & 0xFF;
        ((u * (255 - a) + o * a + 127) / 255) << shift
    };
    channel(16) | channel(8) | channel(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::surface::RasterSurface;
    use crate::types::MaskPoint;
    use test_log::test;

    const VIDEO: u32 = 0x0012_3456;
    const FOG: u32 = 0x0000_0000;
    const PLACEHOLDER: u32 = 0x0000_00FF;

    /// Solid-color video; `fail` makes every draw error out.
    struct SolidVideo {
        ready: bool,
        fail: bool,
        draws: usize,
    }

    impl VideoSource for SolidVideo {
        fn intrinsic_size(&self) -> Option<(u32, u32)> {
            Some((4, 4))
        }
        fn has_frame(&self) -> bool {
            self.ready
        }
        fn draw_into(&mut self, target: &mut FrameBuffer) -> Result<(), Error> {
            self.draws += 1;
            if self.fail {
                return Err(Error::VideoFrame("decoder hiccup".into()));
            }
            target.fill(VIDEO);
            Ok(())
        }
    }

    fn surface(w: usize, h: usize) -> RasterSurface {
        let mut s = RasterSurface::new();
        s.set_logical_size(w as f64, h as f64);
        s.set_backing_size(w, h);
        s
    }

    #[test]
    fn placeholder_until_video_has_frame() {
        let mut c = Compositor::new(FOG, PLACEHOLDER);
        let mut video = SolidVideo { ready: false, fail: false, draws: 0 };
        let mut store = MaskStore::new(4, 4, true);
        let mut s = surface(4, 4);
        assert_eq!(c.render(&mut video, &mut store, &mut s), FrameOutcome::Placeholder);
        assert!(s.frame().unwrap().pixels.iter().all(|&p| p == PLACEHOLDER));
        assert_eq!(video.draws, 0);
    }

    #[test]
    fn fog_hides_video_and_cleared_pixels_show_it() {
        let mut c = Compositor::new(FOG, PLACEHOLDER);
        let mut video = SolidVideo { ready: true, fail: false, draws: 0 };
        let mut store = MaskStore::new(4, 4, true);
        store.stamp(MaskPoint { x: 0.0, y: 0.0 }, 0.0);
        let mut s = surface(4, 4);

        assert_eq!(c.render(&mut video, &mut store, &mut s), FrameOutcome::Composited);
        let px = &s.frame().unwrap().pixels;
        assert_eq!(px[0], VIDEO);
        assert!(px[1..].iter().all(|&p| p == FOG));
        assert!(!store.is_dirty());
        assert_eq!(c.frames(), 1);
    }

    #[test]
    fn dpr_surface_upscales_mask() {
        let mut c = Compositor::new(FOG, PLACEHOLDER);
        let mut video = SolidVideo { ready: true, fail: false, draws: 0 };
        let mut store = MaskStore::new(2, 2, true);
        store.stamp(MaskPoint { x: 1.0, y: 1.0 }, 0.0);
        let mut s = surface(4, 4); // 2x DPR

        c.render(&mut video, &mut store, &mut s);
        let px = &s.frame().unwrap().pixels;
        for y in 0..4 {
            for x in 0..4 {
                let expected = if x >= 2 && y >= 2 { VIDEO } else { FOG };
                assert_eq!(px[y * 4 + x], expected, "({x},{y})");
            }
        }
    }

    #[test]
    fn brush_write_between_frames_is_visible_next_frame() {
        let mut c = Compositor::new(FOG, PLACEHOLDER);
        let mut video = SolidVideo { ready: true, fail: false, draws: 0 };
        let mut store = MaskStore::new(4, 4, true);
        let mut s = surface(4, 4);

        c.render(&mut video, &mut store, &mut s);
        assert_eq!(s.frame().unwrap().pixels[15], FOG);

        store.stamp(MaskPoint { x: 3.0, y: 3.0 }, 0.0);
        c.render(&mut video, &mut store, &mut s);
        assert_eq!(s.frame().unwrap().pixels[15], VIDEO);
    }

    #[test]
    fn failed_draw_skips_frame_and_leaves_surface() {
        let mut c = Compositor::new(FOG, PLACEHOLDER);
        let mut video = SolidVideo { ready: true, fail: true, draws: 0 };
        let mut store = MaskStore::new(4, 4, false);
        let mut s = surface(4, 4);
        s.clear_region(0, 0, 4, 4, 0x0077_7777);

        assert_eq!(c.render(&mut video, &mut store, &mut s), FrameOutcome::Skipped);
        assert_eq!(c.render(&mut video, &mut store, &mut s), FrameOutcome::Skipped);
        assert!(s.frame().unwrap().pixels.iter().all(|&p| p == 0x0077_7777));
        assert!(store.is_dirty());
        assert_eq!(c.frames(), 0);
    }

    #[test]
    fn missing_raster_aborts() {
        let mut c = Compositor::new(FOG, PLACEHOLDER);
        let mut video = SolidVideo { ready: true, fail: false, draws: 0 };
        let mut store = MaskStore::new(4, 4, true);
        let mut s = RasterSurface::new();
        assert_eq!(c.render(&mut video, &mut store, &mut s), FrameOutcome::NoSurface);
        assert_eq!(video.draws, 0);
    }

    #[test]
    fn partial_alpha_mixes_channels() {
        assert_eq!(mix(0x00FF_FFFF, 0x0000_0000, 255), 0);
        assert_eq!(mix(0x00FF_FFFF, 0x0000_0000, 0), 0x00FF_FFFF);
        assert_eq!(mix(0x00FF_0000, 0x0000_0000, 128), 0x007F_0000);
    }
}
