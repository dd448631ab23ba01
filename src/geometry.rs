//! Display geometry: fitting a video into its container.
//!
//! The video is letterboxed (aspect preserved, never cropped) into a box that
//! is the full container width by `scale_factor` of the container height.
//! The mask lives at the resulting display size; the presentation surface's
//! backing store is that size times the device pixel ratio.

use std::fmt::{self, Display};

use crate::types::SurfaceRect;

/// Container size in logical pixels plus the device pixel ratio it renders at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self { width, height, device_pixel_ratio }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayGeometry {
    pub display_width: f64,
    pub display_height: f64,
    pub device_pixel_ratio: f64,
    pub video_width: u32,
    pub video_height: u32,
}

/// Why geometry could not be resolved yet. None of these are fatal: the
/// caller retries after a short delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryError {
    InvalidContainer, // zero, negative or non-finite container size
    MissingVideoSize, // metadata not loaded (intrinsic size 0)
    InvalidScale,     // scale factor outside (0, 1]
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidContainer => write!(f, "container has invalid dimensions"),
            GeometryError::MissingVideoSize => write!(f, "video intrinsic size not known yet"),
            GeometryError::InvalidScale => write!(f, "scale factor must be within (0, 1]"),
        }
    }
}

impl std::error::Error for GeometryError {}

fn valid_extent(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Anything below 1 or non-finite is treated as 1.
pub fn sanitize_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() && dpr >= 1.0 { dpr } else { 1.0 }
}

/// Fit a `video_width` x `video_height` video into `container`.
pub fn resolve(
    container: Viewport,
    video_width: u32,
    video_height: u32,
    scale_factor: f64,
) -> Result<DisplayGeometry, GeometryError> {
    if !valid_extent(container.width) || !valid_extent(container.height) {
        return Err(GeometryError::InvalidContainer);
    }
    if video_width == 0 || video_height == 0 {
        return Err(GeometryError::MissingVideoSize);
    }
    if !(scale_factor.is_finite() && scale_factor > 0.0 && scale_factor <= 1.0) {
        return Err(GeometryError::InvalidScale);
    }

    let box_width = container.width;
    let box_height = container.height * scale_factor;
    let aspect = video_width as f64 / video_height as f64;

    // Landscape fits width first, portrait/square fits height first.
    let (mut width, mut height) = if video_width > video_height {
        let w = box_width.min(box_height * aspect);
        (w, w / aspect)
    } else {
        let h = box_height.min(box_width / aspect);
        (h * aspect, h)
    };

    if width > box_width {
        width = box_width;
        height = box_width / aspect;
    }
    if height > box_height {
        height = box_height;
        width = box_height * aspect;
    }

    Ok(DisplayGeometry {
        display_width: width,
        display_height: height,
        device_pixel_ratio: sanitize_dpr(container.device_pixel_ratio),
        video_width,
        video_height,
    })
}

impl DisplayGeometry {
    /// Mask resolution: the display size truncated to whole pixels (never 0).
    pub fn mask_size(&self) -> (usize, usize) {
        (whole_pixels(self.display_width), whole_pixels(self.display_height))
    }

    /// Surface backing-store resolution (display size x DPR).
    pub fn backing_size(&self) -> (usize, usize) {
        (
            whole_pixels(self.display_width * self.device_pixel_ratio),
            whole_pixels(self.display_height * self.device_pixel_ratio),
        )
    }

    /// Where the surface sits inside `container`: centered horizontally and
    /// centered within the scaled top band vertically.
    pub fn layout(&self, container: Viewport, scale_factor: f64) -> SurfaceRect {
        let band = container.height * scale_factor;
        SurfaceRect {
            left: ((container.width - self.display_width) / 2.0).max(0.0),
            top: ((band - self.display_height) / 2.0).max(0.0),
            width: self.display_width,
            height: self.display_height,
        }
    }
}

fn whole_pixels(v: f64) -> usize {
    (v.floor() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const EPS: f64 = 1e-9;

    #[test]
    fn landscape_video_fits_scaled_box() {
        let g = resolve(Viewport::new(1000.0, 500.0, 1.0), 1920, 1080, 0.8).unwrap();
        assert!(g.display_width <= 1000.0 + EPS);
        assert!(g.display_height <= 400.0 + EPS);
        assert!((g.display_width / g.display_height - 1920.0 / 1080.0).abs() < EPS);
        assert!((g.display_height - 400.0).abs() < EPS);
    }

    #[test]
    fn portrait_video_is_height_bound() {
        let g = resolve(Viewport::new(1000.0, 500.0, 1.0), 1080, 1920, 0.8).unwrap();
        assert!(g.display_height <= 400.0 + EPS);
        assert!((g.display_width - g.display_height * (1080.0 / 1920.0)).abs() < EPS);
        assert_eq!(g.mask_size(), (225, 400));
    }

    #[test]
    fn wide_video_in_narrow_container_clamps_to_width() {
        let g = resolve(Viewport::new(300.0, 1000.0, 1.0), 1600, 900, 1.0).unwrap();
        assert!((g.display_width - 300.0).abs() < EPS);
        assert!((g.display_height - 300.0 * 900.0 / 1600.0).abs() < EPS);
    }

    #[test]
    fn square_video_uses_smaller_side() {
        let g = resolve(Viewport::new(800.0, 600.0, 1.0), 500, 500, 0.5).unwrap();
        assert!((g.display_width - 300.0).abs() < EPS);
        assert!((g.display_height - 300.0).abs() < EPS);
    }

    #[test]
    fn invalid_inputs_are_not_ready() {
        let v = Viewport::new(0.0, 500.0, 1.0);
        assert_eq!(resolve(v, 640, 480, 0.8), Err(GeometryError::InvalidContainer));
        let v = Viewport::new(f64::NAN, 500.0, 1.0);
        assert_eq!(resolve(v, 640, 480, 0.8), Err(GeometryError::InvalidContainer));
        let v = Viewport::new(800.0, f64::INFINITY, 1.0);
        assert_eq!(resolve(v, 640, 480, 0.8), Err(GeometryError::InvalidContainer));
        let v = Viewport::new(800.0, 600.0, 1.0);
        assert_eq!(resolve(v, 0, 480, 0.8), Err(GeometryError::MissingVideoSize));
        assert_eq!(resolve(v, 640, 480, 0.0), Err(GeometryError::InvalidScale));
        assert_eq!(resolve(v, 640, 480, 1.5), Err(GeometryError::InvalidScale));
    }

    #[test]
    fn backing_size_scales_with_dpr_but_mask_does_not() {
        let g = resolve(Viewport::new(1000.0, 500.0, 2.0), 1920, 1080, 0.8).unwrap();
        assert_eq!(g.mask_size(), (711, 400));
        assert_eq!(g.backing_size(), (1422, 800));

        let low = resolve(Viewport::new(1000.0, 500.0, 0.5), 1920, 1080, 0.8).unwrap();
        assert_eq!(low.device_pixel_ratio, 1.0);
    }

    #[test]
    fn layout_centers_surface() {
        let container = Viewport::new(1000.0, 500.0, 1.0);
        let g = resolve(container, 1080, 1920, 0.8).unwrap();
        let rect = g.layout(container, 0.8);
        assert!((rect.left - 387.5).abs() < EPS);
        assert!(rect.top.abs() < EPS);
        assert_eq!(rect.width, g.display_width);
    }
}
