// Core raster and coordinate types shared by the mask engine and the shell.

/// Fully fogged alpha value.
pub const FOG_OPAQUE: u8 = 255;
/// Fully revealed alpha value (video visible).
pub const FOG_CLEAR: u8 = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is (pixels)
    pub height: usize,     // how tall the frame is (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A buffer of the given size filled with one color.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    /// Reallocate to a new size if needed. Contents are unspecified afterwards.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels.clear();
            self.pixels.resize(width * height, 0);
        }
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Nearest-neighbour scale of `src` into the whole of `self`.
    pub fn scale_from(&mut self, src: &FrameBuffer) {
        if src.width == 0 || src.height == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        if src.width == self.width && src.height == self.height {
            self.pixels.copy_from_slice(&src.pixels);
            return;
        }
        let xs = sample_columns(src.width, self.width);
        for y in 0..self.height {
            let sy = y * src.height / self.height;
            let src_row = &src.pixels[sy * src.width..(sy + 1) * src.width];
            let dst_row = &mut self.pixels[y * self.width..(y + 1) * self.width];
            for (dst, &sx) in dst_row.iter_mut().zip(&xs) {
                *dst = src_row[sx];
            }
        }
    }
}

/// Source column for every destination column of a nearest-neighbour scale.
pub(crate) fn sample_columns(src_width: usize, dst_width: usize) -> Vec<usize> {
    (0..dst_width).map(|x| x * src_width / dst_width).collect()
}

/// Fog mask at display resolution: one alpha byte per pixel.
/// 255 = fogged (video hidden), 0 = revealed. The fog color is fixed by the
/// compositor, so no color channels are stored here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub alpha: Vec<u8>,    // length = width * height
}

impl Mask {
    pub fn new(width: usize, height: usize, opaque: bool) -> Self {
        let value = if opaque { FOG_OPAQUE } else { FOG_CLEAR };
        Self { width, height, alpha: vec![value; width * height] }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.alpha[y * self.width + x])
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// Number of pixels currently revealed.
    pub fn revealed_count(&self) -> usize {
        self.alpha.iter().filter(|&&a| a == FOG_CLEAR).count()
    }
}

/// Pointer position in logical (CSS-like) pixels, relative to the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position in mask (display) space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskPoint {
    pub x: f64,
    pub y: f64,
}

/// Where the presentation surface sits on screen, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.left
            && p.y >= self.top
            && p.x < self.left + self.width
            && p.y < self.top + self.height
    }
}
