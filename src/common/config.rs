use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{EnrollError, Result};

/// Device index that asks for auto-detection instead of a fixed `/dev/videoN`.
pub const AUTO_DETECT_DEVICE: u32 = 999;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub notices: NoticeConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_timeout() -> u64 { 30 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_device_index")]
    pub device_index: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: u32,
    #[serde(default = "default_warmup_delay")]
    pub warmup_delay_ms: u64,
}

fn default_device_index() -> u32 { AUTO_DETECT_DEVICE }
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_warmup_frames() -> u32 { 3 }
fn default_warmup_delay() -> u64 { 50 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: default_device_index(),
            width: default_width(),
            height: default_height(),
            warmup_frames: default_warmup_frames(),
            warmup_delay_ms: default_warmup_delay(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptureConfig {
    /// JPEG quality on a 1-100 scale.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 { 95 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { jpeg_quality: default_jpeg_quality() }
    }
}

/// How long each kind of transient message stays visible.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NoticeConfig {
    #[serde(default = "default_success_ms")]
    pub success_ms: u64,
    #[serde(default = "default_camera_error_ms")]
    pub camera_error_ms: u64,
    #[serde(default = "default_upload_error_ms")]
    pub upload_error_ms: u64,
    #[serde(default = "default_delete_error_ms")]
    pub delete_error_ms: u64,
}

fn default_success_ms() -> u64 { 5000 }
fn default_camera_error_ms() -> u64 { 5000 }
fn default_upload_error_ms() -> u64 { 8000 }
fn default_delete_error_ms() -> u64 { 5000 }

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            success_ms: default_success_ms(),
            camera_error_ms: default_camera_error_ms(),
            upload_error_ms: default_upload_error_ms(),
            delete_error_ms: default_delete_error_ms(),
        }
    }
}

impl NoticeConfig {
    pub fn success(&self) -> Duration { Duration::from_millis(self.success_ms) }
    pub fn camera_error(&self) -> Duration { Duration::from_millis(self.camera_error_ms) }
    pub fn upload_error(&self) -> Duration { Duration::from_millis(self.upload_error_ms) }
    pub fn delete_error(&self) -> Duration { Duration::from_millis(self.delete_error_ms) }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PreviewConfig {
    #[serde(default = "default_true")]
    pub enable_ascii_preview: bool,
    #[serde(default)]
    pub ascii_width: Option<usize>,
    #[serde(default)]
    pub ascii_height: Option<usize>,
}

fn default_true() -> bool { true }

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enable_ascii_preview: true,
            ascii_width: None,
            ascii_height: None,
        }
    }
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EnrollError::Config(format!(
                "Config file not found: {}", path.display()
            )));
        }

        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Loads the file when present, otherwise falls back to built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EnrollError::Config(format!("Config parse error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.server.base_url.starts_with("http://") && !self.server.base_url.starts_with("https://") {
            return Err(EnrollError::Config(format!(
                "Server base_url must start with http:// or https://, got {}", self.server.base_url
            )));
        }
        if self.server.timeout_seconds < 1 || self.server.timeout_seconds > 300 {
            return Err(EnrollError::Config(format!(
                "Server timeout must be between 1 and 300 seconds, got {}",
                self.server.timeout_seconds
            )));
        }

        if self.camera.width == 0 || self.camera.width > 4096 {
            return Err(EnrollError::Config(format!(
                "Camera width must be between 1 and 4096, got {}", self.camera.width
            )));
        }
        if self.camera.height == 0 || self.camera.height > 4096 {
            return Err(EnrollError::Config(format!(
                "Camera height must be between 1 and 4096, got {}", self.camera.height
            )));
        }

        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(EnrollError::Config(format!(
                "JPEG quality must be between 1 and 100, got {}", self.capture.jpeg_quality
            )));
        }

        Ok(())
    }
}
