pub mod v4l2;

pub use v4l2::{CameraInfo, V4lCamera, V4lStream};

use crate::common::Result;
use image::DynamicImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// Hints passed to the camera backend when acquiring a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingMode,
    pub audio: bool,
}

impl VideoConstraints {
    /// Video-only, front-facing request used for face enrollment.
    pub fn enrollment(ideal_width: u32, ideal_height: u32) -> Self {
        Self {
            ideal_width,
            ideal_height,
            facing: FacingMode::User,
            audio: false,
        }
    }
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self::enrollment(1280, 720)
    }
}

/// Something that can hand out live camera streams.
pub trait CameraBackend {
    type Stream: VideoStream;

    fn acquire(&mut self, constraints: &VideoConstraints) -> Result<Self::Stream>;
}

/// A live camera stream. Tracks stay live until `stop` is called.
pub trait VideoStream {
    /// Native resolution the device actually delivers.
    fn frame_size(&self) -> (u32, u32);

    fn grab_frame(&mut self) -> Result<DynamicImage>;

    fn live_tracks(&self) -> usize;

    /// Stops every track. Calling it again is a no-op.
    fn stop(&mut self);
}
