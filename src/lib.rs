// Core modules
pub mod core;
pub mod camera;
pub mod storage;
pub mod service;
pub mod cli;
pub mod common;

// Re-export commonly used types
pub use crate::common::{Config, DevMode, EnrollError, Paths, Result};
pub use crate::core::{
    CapturedFrame, CommandOutcome, ControllerSettings, EnrollmentController, EnrollmentStatus,
    FaceSectionView, Phase,
};
pub use crate::camera::{CameraBackend, FacingMode, V4lCamera, VideoConstraints, VideoStream};
pub use crate::storage::{Session, SessionStore};
pub use crate::service::{protocol, EnrollmentApi, ServiceClient};

pub mod config {
    pub use crate::common::config::*;
}
pub mod error {
    pub use crate::common::error::*;
}
