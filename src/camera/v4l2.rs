use crate::camera::{CameraBackend, FacingMode, VideoConstraints, VideoStream};
use crate::common::config::{CameraConfig, AUTO_DETECT_DEVICE};
use crate::common::{EnrollError, Result};
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};
use std::fs;
use std::io;
use std::time::Duration;

/// A `/dev/videoN` device found while scanning.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
    pub formats: Vec<String>,
    pub video_capture: bool,
    pub color: bool,
}

pub struct V4lCamera {
    config: CameraConfig,
}

/// Number of mmap buffers queued with the driver.
const BUFFER_COUNT: u32 = 4;

pub struct V4lStream {
    stream: Option<MmapStream<'static>>,
    format: Format,
    _device: Device,
}

impl V4lCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self { config: config.clone() }
    }

    /// List all available cameras with their capabilities
    pub fn list_all_cameras() -> Result<Vec<CameraInfo>> {
        let mut cameras = Vec::new();

        for entry in fs::read_dir("/dev")? {
            let entry = entry?;
            let path = entry.path();
            let filename = path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");

            let Some(index) = filename.strip_prefix("video").and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };
            let Ok(device) = Device::new(index as usize) else {
                continue;
            };
            let Ok(caps) = device.query_caps() else {
                continue;
            };

            let video_capture = caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE);
            let mut formats = Vec::new();
            let mut color = false;
            for fmt in device.enum_formats().unwrap_or_default() {
                let fourcc = fmt.fourcc.str().unwrap_or("UNKNOWN").to_string();
                if fourcc == "MJPG" || fourcc == "YUYV" {
                    color = true;
                }
                formats.push(fourcc);
            }

            cameras.push(CameraInfo {
                index,
                name: caps.card.clone(),
                formats,
                video_capture,
                color,
            });
        }

        cameras.sort_by_key(|c| c.index);
        Ok(cameras)
    }

    /// Pick the device a front-facing enrollment should use.
    ///
    /// Color capture devices win over grayscale (IR) ones, lower indices win
    /// ties. Falls back to device 0 when nothing usable is found.
    pub fn detect_front_camera() -> Result<u32> {
        let cameras = Self::list_all_cameras()?;
        Ok(pick_front_camera(&cameras).unwrap_or_else(|| {
            tracing::warn!("No color camera detected, falling back to /dev/video0");
            0
        }))
    }

    fn open_device(&self, index: u32, constraints: &VideoConstraints) -> Result<(Device, Format)> {
        tracing::info!("Opening camera device {}...", index);

        let device = Device::new(index as usize).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                EnrollError::Camera(format!("Permission denied opening /dev/video{}", index))
            } else {
                EnrollError::Camera(format!("Failed to open camera {}: {}", index, e))
            }
        })?;

        let caps = device.query_caps()
            .map_err(|e| EnrollError::Camera(format!("Failed to query capabilities: {}", e)))?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(EnrollError::Camera(format!(
                "Device {} ({}) does not support video capture", index, caps.card
            )));
        }

        let mut fmt = device.format()
            .map_err(|e| EnrollError::Camera(format!("Failed to get format: {}", e)))?;

        fmt.width = constraints.ideal_width;
        fmt.height = constraints.ideal_height;
        if fourcc_name(&fmt) != "GREY" {
            fmt.fourcc = FourCC::new(b"MJPG");
        }

        tracing::debug!("Requesting format: {}x{} {}", fmt.width, fmt.height, fourcc_name(&fmt));

        // Resolution is only a hint, the device may pick something else.
        if let Err(e) = device.set_format(&fmt) {
            tracing::warn!("Could not set exact format: {}. Using device defaults.", e);
        }

        let actual = device.format()
            .map_err(|e| EnrollError::Camera(format!("Failed to get final format: {}", e)))?;

        if actual.width != constraints.ideal_width || actual.height != constraints.ideal_height {
            tracing::info!("Camera resolution {}x{} differs from ideal {}x{}",
                     actual.width, actual.height,
                     constraints.ideal_width, constraints.ideal_height);
        }

        Ok((device, actual))
    }
}

impl CameraBackend for V4lCamera {
    type Stream = V4lStream;

    fn acquire(&mut self, constraints: &VideoConstraints) -> Result<V4lStream> {
        if constraints.audio {
            return Err(EnrollError::Camera("Audio capture is not supported".into()));
        }
        if constraints.facing == FacingMode::Environment {
            tracing::debug!("V4L2 has no facing hint, using the configured device");
        }

        let index = if self.config.device_index == AUTO_DETECT_DEVICE {
            Self::detect_front_camera()?
        } else {
            self.config.device_index
        };

        let (device, format) = self.open_device(index, constraints)?;

        let mut stream = MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| EnrollError::Camera(format!("Failed to create stream: {}", e)))?;

        for i in 0..self.config.warmup_frames {
            stream.next()
                .map_err(|e| EnrollError::Camera(format!("Failed to capture warmup frame {}: {}", i, e)))?;
            std::thread::sleep(Duration::from_millis(self.config.warmup_delay_ms));
        }
        tracing::info!("Camera ready: {}x{} {}", format.width, format.height, fourcc_name(&format));

        Ok(V4lStream {
            stream: Some(stream),
            format,
            _device: device,
        })
    }
}

impl VideoStream for V4lStream {
    fn frame_size(&self) -> (u32, u32) {
        (self.format.width, self.format.height)
    }

    fn grab_frame(&mut self) -> Result<DynamicImage> {
        let stream = self.stream.as_mut()
            .ok_or_else(|| EnrollError::Camera("Stream already stopped".into()))?;

        let data = latest_frame(stream, BUFFER_COUNT)
            .map_err(|e| EnrollError::Camera(format!("Failed to capture: {}", e)))?;

        decode_frame(&data, &self.format)
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.stream.is_some())
    }

    fn stop(&mut self) {
        // Dropping the mmap stream turns streaming off and unmaps the buffers.
        if self.stream.take().is_some() {
            tracing::debug!("Camera stream stopped");
        }
    }
}

impl Drop for V4lStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A driver queue that hands back filled buffers oldest first.
trait FrameQueue {
    fn dequeue(&mut self) -> io::Result<&[u8]>;
}

impl FrameQueue for MmapStream<'static> {
    fn dequeue(&mut self) -> io::Result<&[u8]> {
        let (buf, meta) = CaptureStream::next(self)?;
        let used = (meta.bytesused as usize).min(buf.len());
        Ok(if used == 0 { buf } else { &buf[..used] })
    }
}

/// Buffers filled while nobody was grabbing sit in the queue, so the first
/// dequeue can be seconds old. Cycling through the whole ring yields a frame
/// captured after this call started.
fn latest_frame<Q: FrameQueue>(queue: &mut Q, depth: u32) -> io::Result<Vec<u8>> {
    for _ in 1..depth.max(1) {
        queue.dequeue()?;
    }
    Ok(queue.dequeue()?.to_vec())
}

fn fourcc_name(fmt: &Format) -> &str {
    fmt.fourcc.str().unwrap_or("????")
}

fn pick_front_camera(cameras: &[CameraInfo]) -> Option<u32> {
    cameras.iter()
        .filter(|c| c.video_capture)
        .min_by_key(|c| (!c.color, c.index))
        .map(|c| c.index)
}

fn decode_frame(data: &[u8], fmt: &Format) -> Result<DynamicImage> {
    match fourcc_name(fmt) {
        "MJPG" => Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?),
        "GREY" => grey_to_image(data, fmt.width, fmt.height),
        "YUYV" => yuyv_to_image(data, fmt.width, fmt.height),
        other => Err(EnrollError::Camera(format!("Unsupported pixel format {}", other))),
    }
}

fn grey_to_image(data: &[u8], width: u32, height: u32) -> Result<DynamicImage> {
    let len = (width * height) as usize;
    if data.len() < len {
        return Err(EnrollError::Camera("Short grayscale frame".into()));
    }
    let img_buffer = ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data[..len].to_vec())
        .ok_or_else(|| EnrollError::Camera("Failed to create grayscale image buffer".into()))?;

    Ok(DynamicImage::ImageLuma8(img_buffer))
}

fn yuyv_to_image(data: &[u8], width: u32, height: u32) -> Result<DynamicImage> {
    let pixels = (width * height) as usize;
    if data.len() < pixels * 2 {
        return Err(EnrollError::Camera("Short YUYV frame".into()));
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in data[..pixels * 2].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }

    let img_buffer = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, rgb)
        .ok_or_else(|| EnrollError::Camera("Failed to create RGB image buffer".into()))?;
    Ok(DynamicImage::ImageRgb8(img_buffer))
}

// BT.601 limited range
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as f32 - 16.0;
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;
    let r = 1.164 * c + 1.596 * e;
    let g = 1.164 * c - 0.392 * d - 0.813 * e;
    let b = 1.164 * c + 2.017 * d;
    [r.clamp(0.0, 255.0) as u8, g.clamp(0.0, 255.0) as u8, b.clamp(0.0, 255.0) as u8]
}
