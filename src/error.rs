// A small hand-written error type; every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),   // Creating the window failed
    WindowUpdate(String), // Updating the window buffer failed
    CameraInit(String),   // Opening/starting the camera failed
    CameraFrame(String),  // Grabbing/decoding a camera frame failed
    VideoOpen(String),    // Listing/opening a clip failed
    VideoFrame(String),   // Decoding or drawing a clip frame failed
    Config(String),       // Reading/parsing the config file failed
    SurfaceUnavailable,   // The presentation surface has no raster to draw into
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::CameraInit(s) => write!(f, "Camera init error: {s}"),
            Error::CameraFrame(s) => write!(f, "Camera frame error: {s}"),
            Error::VideoOpen(s) => write!(f, "Video open error: {s}"),
            Error::VideoFrame(s) => write!(f, "Video frame error: {s}"),
            Error::Config(s) => write!(f, "Config error: {s}"),
            Error::SurfaceUnavailable => write!(f, "Presentation surface unavailable"),
        }
    }
}

impl std::error::Error for Error {}
