//! Presentation surface: the raster the compositor draws each frame into.

use crate::types::FrameBuffer;

/// Abstract 2D raster sink. Logical size is the on-screen size (display
/// space); backing size is the pixel resolution (logical x DPR).
pub trait PresentationSurface {
    fn set_logical_size(&mut self, width: f64, height: f64);
    fn logical_size(&self) -> (f64, f64);
    fn set_backing_size(&mut self, width: usize, height: usize);

    /// Raw pixel access at backing resolution. `None` when the surface has
    /// no raster (torn down or not yet created).
    fn raster(&mut self) -> Option<&mut FrameBuffer>;

    /// Fill a backing-space rectangle with one color, clipped to the raster.
    fn clear_region(&mut self, x: usize, y: usize, width: usize, height: usize, color: u32) {
        let Some(fb) = self.raster() else { return };
        let x1 = (x.saturating_add(width)).min(fb.width);
        let y1 = (y.saturating_add(height)).min(fb.height);
        for row in y.min(y1)..y1 {
            let start = row * fb.width;
            fb.pixels[start + x.min(x1)..start + x1].fill(color);
        }
    }
}

/// In-memory surface backed by a `FrameBuffer`; the window shell presents it.
#[derive(Debug, Default)]
pub struct RasterSurface {
    logical: (f64, f64),
    buffer: Option<FrameBuffer>,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the last composited frame.
    pub fn frame(&self) -> Option<&FrameBuffer> {
        self.buffer.as_ref()
    }

    /// Drop the raster; subsequent draws report the surface as unavailable.
    pub fn release(&mut self) {
        self.buffer = None;
    }
}

impl PresentationSurface for RasterSurface {
    fn set_logical_size(&mut self, width: f64, height: f64) {
        self.logical = (width, height);
    }

    fn logical_size(&self) -> (f64, f64) {
        self.logical
    }

    fn set_backing_size(&mut self, width: usize, height: usize) {
        match &mut self.buffer {
            Some(fb) => fb.resize(width, height),
            None => self.buffer = Some(FrameBuffer::filled(width, height, 0)),
        }
    }

    fn raster(&mut self) -> Option<&mut FrameBuffer> {
        self.buffer.as_mut()
    }
}
