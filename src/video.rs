// Video sources the compositor can draw from.
// The core never decodes containers itself: a source either has a frame
// ready or it doesn't, and knows its intrinsic size once metadata is in.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::{ImageFormat, RgbImage};
use log::{debug, info, warn};

use crate::error::Error;
use crate::types::FrameBuffer;

pub trait VideoSource {
    /// Intrinsic frame size, or `None` while metadata is still pending.
    fn intrinsic_size(&self) -> Option<(u32, u32)>;

    /// True once a frame can be drawn.
    fn has_frame(&self) -> bool;

    /// Let the source move to the frame for `now` (decode, grab, ...).
    fn advance(&mut self, _now: Instant) {}

    /// Draw the current frame scaled to fill `target`.
    fn draw_into(&mut self, target: &mut FrameBuffer) -> Result<(), Error>;
}

/// Pack an RGB image as 0x00RRGGBB pixels.
pub(crate) fn rgb_to_framebuffer(img: &RgbImage) -> FrameBuffer {
    let (w, h) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect();
    FrameBuffer { width: w as usize, height: h as usize, pixels }
}

const DEFAULT_CLIP_FPS: f64 = 30.0;

/// Time between clip frames. Rates that are not positive, or so low the
/// interval would not fit in a `Duration`, fall back to 30 fps.
fn frame_interval(fps: f64) -> Duration {
    let fallback = Duration::from_secs_f64(1.0 / DEFAULT_CLIP_FPS);
    if !(fps.is_finite() && fps > 0.0) {
        return fallback;
    }
    Duration::try_from_secs_f64(1.0 / fps)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(fallback)
}

/// A clip made of still images in a directory, played in name order and
/// looped. Frames are decoded on first use and kept.
pub struct FrameSequence {
    paths: Vec<PathBuf>,
    frames: Vec<Option<FrameBuffer>>,
    interval: Duration,
    started: Option<Instant>,
    current: Option<usize>,
    size: Option<(u32, u32)>,
}

impl FrameSequence {
    /// List the image files in `dir`. Nothing is decoded yet, so the
    /// intrinsic size stays unknown until the first `advance`.
    pub fn open(dir: &Path, fps: f64) -> Result<Self, Error> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::VideoOpen(format!("{}: {e}", dir.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && ImageFormat::from_path(p).is_ok())
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(Error::VideoOpen(format!("{}: no image frames found", dir.display())));
        }
        let interval = frame_interval(fps);
        info!(
            "clip {}: {} frames, {:.1} ms per frame",
            dir.display(),
            paths.len(),
            interval.as_secs_f64() * 1000.0
        );

        Ok(Self {
            frames: vec![None; paths.len()],
            paths,
            interval,
            started: None,
            current: None,
            size: None,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Index of the frame being shown, once one has decoded.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    fn index_at(&self, now: Instant) -> usize {
        let start = self.started.unwrap_or(now);
        let elapsed = now.saturating_duration_since(start);
        let step = (elapsed.as_nanos() / self.interval.as_nanos().max(1)) as usize;
        step % self.paths.len()
    }

    fn decode(&mut self, index: usize) -> Result<(), Error> {
        if self.frames[index].is_some() {
            return Ok(());
        }
        let path = &self.paths[index];
        let img = image::open(path)
            .map_err(|e| Error::VideoFrame(format!("{}: {e}", path.display())))?
            .to_rgb8();
        debug!("decoded {} ({}x{})", path.display(), img.width(), img.height());
        if self.size.is_none() {
            self.size = Some(img.dimensions());
        }
        self.frames[index] = Some(rgb_to_framebuffer(&img));
        Ok(())
    }
}

impl VideoSource for FrameSequence {
    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn has_frame(&self) -> bool {
        self.current.is_some()
    }

    fn advance(&mut self, now: Instant) {
        self.started.get_or_insert(now);
        let index = self.index_at(now);
        if self.current == Some(index) {
            return;
        }
        // A frame that fails to decode keeps the previous one on screen.
        match self.decode(index) {
            Ok(()) => self.current = Some(index),
            Err(e) => warn!("{e}"),
        }
    }

    fn draw_into(&mut self, target: &mut FrameBuffer) -> Result<(), Error> {
        let frame = self
            .current
            .and_then(|i| self.frames[i].as_ref())
            .ok_or_else(|| Error::VideoFrame("no frame decoded yet".into()))?;
        target.scale_from(frame);
        Ok(())
    }
}
