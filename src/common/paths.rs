use std::path::PathBuf;
use std::fs;
use directories::ProjectDirs;
use crate::common::DevMode;
use crate::error::{EnrollError, Result};

pub const CONFIG_FILE_NAME: &str = "face-enroll.toml";
pub const SESSION_FILE_NAME: &str = "session.json";

pub enum RunMode {
    Development(PathBuf),
    User { config_dir: PathBuf, data_dir: PathBuf },
}

pub struct Paths {
    mode: RunMode,
}

impl Paths {
    pub fn new(dev_mode: &DevMode) -> Result<Self> {
        if dev_mode.is_enabled() {
            return Ok(Self {
                mode: RunMode::Development(dev_mode.base_dir().clone()),
            });
        }

        let dirs = ProjectDirs::from("com", "faceenroll", "face-enroll")
            .ok_or_else(|| EnrollError::Config("Could not determine home directory".into()))?;
        let config_dir = dirs.config_dir().to_path_buf();
        let data_dir = dirs.data_dir().to_path_buf();

        fs::create_dir_all(&data_dir)?;
        tracing::debug!("User mode - config: {}, data: {}", config_dir.display(), data_dir.display());

        Ok(Self {
            mode: RunMode::User { config_dir, data_dir },
        })
    }

    pub fn config_file(&self) -> PathBuf {
        match &self.mode {
            RunMode::Development(base) => base.join(CONFIG_FILE_NAME),
            RunMode::User { config_dir, .. } => config_dir.join(CONFIG_FILE_NAME),
        }
    }

    pub fn session_file(&self) -> PathBuf {
        match &self.mode {
            RunMode::Development(base) => base.join(SESSION_FILE_NAME),
            RunMode::User { data_dir, .. } => data_dir.join(SESSION_FILE_NAME),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self.mode, RunMode::Development(_))
    }
}
