// Window + software drawing utilities for the desktop shell.
// 1) A resizable window that shows the composited surface, letterboxed.
// 2) A ring that follows the mouse showing the brush footprint.

use fog_eraser::error::Error;
use fog_eraser::types::{FrameBuffer, ScreenPoint, SurfaceRect};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window, // the on-screen window you see
    title: String,  // last title sent to the OS
}

impl Drawer {
    /// Open a resizable window of the given client size.
    /// Visual: an empty window appears; the clip shows once it is ready.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let options = WindowOptions { resize: true, ..WindowOptions::default() };
        let window = Window::new(title, width, height, options)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window, title: title.to_string() })
    }

    /// Push this frame's pixels to the screen (also pumps window events).
    /// Visual: the window immediately shows the new composited frame.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Process window events without presenting a new frame.
    /// Visual: nothing changes, but a minimized window stays responsive.
    pub fn pump(&mut self) {
        self.window.update();
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Current client size in pixels.
    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.window.is_key_down(key)
    }

    pub fn key_pressed_once(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    pub fn ctrl_down(&self) -> bool {
        self.key_down(Key::LeftCtrl) || self.key_down(Key::RightCtrl)
    }

    /// Mouse position in window pixels, clamped to the window.
    /// Visual: when this returns Some(x,y), the brush ring is drawn there.
    pub fn mouse_pos(&self) -> Option<ScreenPoint> {
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| ScreenPoint::new(x as f64, y as f64))
    }

    /// Visual: while held over the video, the fog under the ring clears.
    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    /// Only touches the OS window when the text actually changed.
    /// Visual: the title bar tracks the session state and brush size.
    pub fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.window.set_title(title);
            self.title = title.to_string();
        }
    }
}

/* ---------- Software drawing ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
/// Visual: the exact pixel at (x,y) changes color.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    fb.pixels[y * fb.width + x] = color;
}

/// Copy the surface's backing pixels into `rect` of the window buffer,
/// nearest-neighbour scaled (backing may be DPR-sized).
/// Visual: the fogged video sits centered, with background bars around it.
pub fn blit_surface(window: &mut FrameBuffer, surface: &FrameBuffer, rect: SurfaceRect) {
    // 1) Nothing to show yet, or the rect collapsed.
    if surface.width == 0 || surface.height == 0 || rect.width < 1.0 || rect.height < 1.0 {
        return;
    }
    // 2) Snap the rect to whole window pixels.
    let left = rect.left.round() as i64;
    let top = rect.top.round() as i64;
    let w = rect.width.floor() as i64;
    let h = rect.height.floor() as i64;

    // 3) Each window pixel samples its nearest backing pixel; off-window ones are skipped.
    for dy in 0..h {
        let wy = top + dy;
        if wy < 0 || wy >= window.height as i64 {
            continue;
        }
        let sy = (dy * surface.height as i64 / h) as usize;
        let src_row = &surface.pixels[sy * surface.width..(sy + 1) * surface.width];
        let dst_row = wy as usize * window.width;
        for dx in 0..w {
            let wx = left + dx;
            if wx < 0 || wx >= window.width as i64 {
                continue;
            }
            let sx = (dx * surface.width as i64 / w) as usize;
            window.pixels[dst_row + wx as usize] = src_row[sx];
        }
    }
}

/// Circle outline (midpoint algorithm) centered at (cx,cy).
/// Visual: a thin ring around the mouse, the size of the area one dab clears.
pub fn draw_ring(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: u32) {
    if radius <= 0 {
        put_pixel(fb, cx, cy, color);
        return;
    }
    let (mut x, mut y) = (radius, 0);
    let mut err = 1 - radius;
    while x >= y {
        // One computed point, mirrored into all eight octants.
        for (px, py) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            put_pixel(fb, cx + px, cy + py, color);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}
