// Live webcam as a video source (feature `camera`).
// Visual expectation: the fog sits over your live camera image instead of a clip.
// Grabbing blocks until the device hands over a frame, so `advance` runs at
// the camera's rate; a failed grab keeps the last good frame on screen.

use std::time::Instant;

use log::{info, warn};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use crate::error::Error;
use crate::types::FrameBuffer;
use crate::video::VideoSource;

// Wraps nokhwa::Camera behind the same trait the clip player uses.
pub struct CameraSource {
    cam: Camera, // open stream; frames are pulled in `advance`
    width: u32,
    height: u32,
    latest: Option<FrameBuffer>,
    failures: u32, // consecutive failed grabs, logged once per streak
}

impl CameraSource {
    /// Open camera `index` near the requested resolution and start streaming.
    /// Nothing shows yet: the session still waits for the first grabbed frame.
    pub fn open(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        // 1) Ask for RGB frames, as close as possible to the requested size.
        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // 2) Create the camera (fails if no such device exists), then stream.
        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // 3) The stream may settle on a different resolution than requested.
        let actual = cam.resolution();
        info!("camera {index} streaming at {}x{}", actual.width(), actual.height());

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
            latest: None,
            failures: 0,
        })
    }

    /// Pull one frame and pack it as 0x00RRGGBB pixels.
    fn grab(&mut self) -> Result<FrameBuffer, Error> {
        // 1) Blocks until the device delivers a frame.
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;
        // 2) Decode whatever raw format arrived (YUYV, MJPEG) to RGB.
        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;
        // 3) nokhwa may pin a different `image` version, so pack from raw bytes.
        let (w, h) = (rgb.width() as usize, rgb.height() as usize);
        let pixels = rgb
            .into_raw()
            .chunks_exact(3)
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();
        Ok(FrameBuffer { width: w, height: h, pixels })
    }
}

impl VideoSource for CameraSource {
    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn has_frame(&self) -> bool {
        self.latest.is_some()
    }

    /// Visual: the video under the fog moves on by one camera frame.
    fn advance(&mut self, _now: Instant) {
        match self.grab() {
            Ok(fb) => {
                self.failures = 0;
                self.latest = Some(fb);
            }
            Err(e) => {
                if self.failures == 0 {
                    warn!("{e}");
                }
                self.failures = self.failures.saturating_add(1);
            }
        }
    }

    fn draw_into(&mut self, target: &mut FrameBuffer) -> Result<(), Error> {
        let frame = self
            .latest
            .as_ref()
            .ok_or_else(|| Error::CameraFrame("no frame grabbed yet".into()))?;
        target.scale_from(frame);
        Ok(())
    }
}
