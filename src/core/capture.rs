use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use std::path::Path;
use crate::common::{EnrollError, Result};

pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// A still frame encoded for upload.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

impl CapturedFrame {
    /// Encodes `frame` at its native size as JPEG and wraps it in a data URL.
    pub fn encode(frame: &DynamicImage, quality: u8) -> Result<Self> {
        let (width, height) = (frame.width(), frame.height());
        let rgb = frame.to_rgb8();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .encode(rgb.as_raw(), width, height, ColorType::Rgb8)?;

        tracing::debug!("Encoded {}x{} frame to {} JPEG bytes (q{})", width, height, jpeg.len(), quality);

        Ok(Self {
            width,
            height,
            data_url: format!("{}{}", JPEG_DATA_URL_PREFIX, STANDARD.encode(&jpeg)),
        })
    }

    pub fn jpeg_bytes(&self) -> Result<Vec<u8>> {
        let payload = self.data_url.strip_prefix(JPEG_DATA_URL_PREFIX)
            .ok_or_else(|| EnrollError::Protocol("not a JPEG data URL".into()))?;
        STANDARD.decode(payload)
            .map_err(|e| EnrollError::Protocol(format!("invalid base64 payload: {}", e)))
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory_with_format(&self.jpeg_bytes()?, ImageFormat::Jpeg)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.jpeg_bytes()?)?;
        Ok(())
    }
}
