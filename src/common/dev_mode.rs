use std::path::PathBuf;
use std::fs;
use crate::error::Result;

/// Local development context: everything lands under `./dev_data`.
#[derive(Debug, Clone)]
pub struct DevMode {
    enabled: bool,
    base_dir: PathBuf,
}

impl DevMode {
    pub fn new(enabled: bool) -> Result<Self> {
        Self::with_base_dir(enabled, PathBuf::from("./dev_data"))
    }

    pub fn with_base_dir(enabled: bool, base_dir: PathBuf) -> Result<Self> {
        if enabled {
            fs::create_dir_all(&base_dir)?;
            fs::create_dir_all(base_dir.join("captures"))?;

            tracing::info!("Development mode enabled - data will be saved to: {}",
                     base_dir.display());
        }

        Ok(Self { enabled, base_dir })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Where a captured frame is kept for inspection; `None` outside dev mode.
    pub fn get_capture_path(&self, prefix: &str) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
        Some(self.base_dir.join("captures").join(format!("{}_{}.jpg", prefix, timestamp)))
    }
}
