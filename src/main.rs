// What you SEE:
// • The clip plays under a black fog, letterboxed into the window.
// • Hold Left Mouse: scratch the fog away (ring shows the brush size).
// • U / Ctrl+Z undo, R re-fogs everything, A reveals everything.
// • [ and ] shrink/grow the brush. M asks for the menu. ESC quits.

mod draw;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use minifb::Key;

use draw::{Drawer, blit_surface, draw_ring};
use fog_eraser::scheduler::{FrameLoop, IntervalClock, LoopControl};
use fog_eraser::surface::RasterSurface;
use fog_eraser::types::{FrameBuffer, ScreenPoint};
use fog_eraser::video::{FrameSequence, VideoSource};
use fog_eraser::{Config, FogSession, FrameOutcome, PointerEvent, SessionState, Viewport};

const BACKGROUND: u32 = 0x0020_2020;
const RING_COLOR: u32 = 0x00FF_CC33;

/// Scratch fog off a video, stroke by stroke.
#[derive(Parser, Debug)]
#[command(name = "fog-eraser", version)]
struct Args {
    /// Directory of image frames played as the clip (sorted by name).
    #[arg(short, long, value_name = "DIR")]
    frames: Option<PathBuf>,

    /// Playback rate of the frame directory.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Use camera INDEX as the video instead of a frame directory
    /// (needs the `camera` feature).
    #[arg(long, value_name = "INDEX")]
    camera: Option<u32>,

    /// JSON config file; missing fields use defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Device pixel ratio for the surface backing store.
    #[arg(long)]
    dpr: Option<f64>,

    /// Fraction of the window height used for the video, in (0, 1].
    #[arg(long)]
    scale: Option<f64>,

    /// Brush radius in display pixels.
    #[arg(long)]
    brush: Option<f64>,

    /// Start with the fog already cleared.
    #[arg(long)]
    start_clear: bool,

    /// Initial window width.
    #[arg(long, default_value_t = 1280)]
    width: usize,

    /// Initial window height.
    #[arg(long, default_value_t = 800)]
    height: usize,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).context("loading config")?,
        None => Config::default(),
    };
    if let Some(dpr) = args.dpr {
        config.display.device_pixel_ratio = dpr;
    }
    if let Some(scale) = args.scale {
        config.display.scale_factor = scale;
    }
    if let Some(radius) = args.brush {
        config.brush.radius = radius;
    }
    if args.start_clear {
        config.fog.start_fogged = false;
    }
    Ok(config.validate())
}

#[cfg(feature = "camera")]
fn open_camera(index: u32) -> anyhow::Result<Box<dyn VideoSource>> {
    let cam = fog_eraser::camera::CameraSource::open(index, 640, 480).context("opening camera")?;
    Ok(Box::new(cam))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_index: u32) -> anyhow::Result<Box<dyn VideoSource>> {
    anyhow::bail!("built without the `camera` feature")
}

fn open_video(args: &Args) -> anyhow::Result<Box<dyn VideoSource>> {
    if let Some(index) = args.camera {
        return open_camera(index);
    }
    let dir = args
        .frames
        .as_deref()
        .context("no video given: pass --frames <DIR>")?;
    let clip = FrameSequence::open(dir, args.fps).context("opening frame directory")?;
    Ok(Box::new(clip))
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Unloaded => "no video",
        SessionState::MetadataPending { .. } => "loading",
        SessionState::Ready => "ready",
    }
}

fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let dpr = config.display.device_pixel_ratio;
    let mut video = open_video(&args)?;

    let mut drawer = Drawer::new("Fog Eraser", args.width, args.height)?;
    let mut session = FogSession::new(config.clone());
    let mut surface = RasterSurface::new();
    let mut screen = FrameBuffer::filled(args.width, args.height, BACKGROUND);
    session.attach_video();

    let mut mouse_was_down = false;
    let mut last_mouse: Option<ScreenPoint> = None;
    let mut present_result = Ok(());

    let frame_loop = FrameLoop::new();
    let mut clock = IntervalClock::new(config.timing.target_fps);
    let frames = frame_loop.run(&mut clock, |now| {
        if !drawer.is_open() || drawer.key_down(Key::Escape) {
            return LoopControl::Stop;
        }

        /* 1) Window size is the container. */
        let (ww, wh) = drawer.size();
        if ww == 0 || wh == 0 {
            // Minimized: keep the window responsive, skip drawing.
            drawer.pump();
            return LoopControl::Continue;
        }
        session.set_viewport(Viewport::new(ww as f64, wh as f64, dpr), video.as_ref(), now);

        /* 2) Keys */
        let ctrl_z = drawer.ctrl_down() && drawer.key_pressed_once(Key::Z);
        if drawer.key_pressed_once(Key::U) || ctrl_z {
            session.undo();
        }
        if drawer.key_pressed_once(Key::R) {
            session.reset_fog();
        }
        if drawer.key_pressed_once(Key::A) {
            session.reveal_all();
        }
        if drawer.key_pressed_once(Key::LeftBracket) {
            session.shrink_brush();
        }
        if drawer.key_pressed_once(Key::RightBracket) {
            session.grow_brush();
        }
        if drawer.key_pressed_once(Key::M) {
            info!("menu requested");
        }

        /* 3) Mouse → pointer events (mouse is always a single pointer). */
        let down = drawer.left_mouse_down();
        let pos = drawer.mouse_pos();
        let event = match (mouse_was_down, down, pos) {
            (false, true, Some(p)) => Some(PointerEvent::MouseDown(p)),
            (true, true, Some(p)) if last_mouse != Some(p) => Some(PointerEvent::MouseMove(p)),
            (true, false, _) => Some(PointerEvent::MouseUp),
            _ => None,
        };
        if let Some(event) = event {
            session.handle_pointer(&event, now);
        }
        mouse_was_down = down;
        last_mouse = pos;

        /* 4) Composite, then letterbox into the window. */
        let outcome = session.render(video.as_mut(), &mut surface, now);
        screen.resize(ww, wh);
        screen.fill(BACKGROUND);
        if outcome != FrameOutcome::NotReady {
            if let Some(frame) = surface.frame() {
                blit_surface(&mut screen, frame, session.surface_rect());
            }
        }

        /* 5) Brush ring, in screen pixels. */
        if let (Some(p), Some(mask)) = (pos, session.mask()) {
            let rect = session.surface_rect();
            if rect.contains(p) && mask.width > 0 {
                let r = session.brush_radius() * rect.width / mask.width as f64;
                draw_ring(&mut screen, p.x as i32, p.y as i32, r.round() as i32, RING_COLOR);
            }
        }

        drawer.set_title(&format!(
            "Fog Eraser | {} | brush {:.0}px | undo {}",
            state_label(session.state()),
            session.brush_radius(),
            session.history_len()
        ));

        /* 6) Present. */
        if let Err(e) = drawer.present(&screen) {
            present_result = Err(e);
            return LoopControl::Stop;
        }
        LoopControl::Continue
    });

    info!("closed after {frames} frames");
    present_result.context("presenting frame")?;
    Ok(())
}
