use crate::camera::{CameraBackend, VideoConstraints, VideoStream};
use crate::common::config::{Config, NoticeConfig};
use crate::common::{EnrollError, Result};
use crate::core::capture::CapturedFrame;
use crate::core::notice::{NoticeKind, Notices};
use crate::core::phase::{CommandOutcome, Phase};
use crate::core::status::EnrollmentStatus;
use crate::core::view::FaceSectionView;
use crate::service::EnrollmentApi;
use image::DynamicImage;
use std::time::Instant;

pub const CAMERA_UNAVAILABLE: &str = "Could not access the camera. Make sure camera permission is granted.";

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub constraints: VideoConstraints,
    pub jpeg_quality: u8,
    pub notices: NoticeConfig,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            constraints: VideoConstraints::enrollment(config.camera.width, config.camera.height),
            jpeg_quality: config.capture.jpeg_quality,
            notices: config.notices.clone(),
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Drives one face-enrollment capture session.
///
/// The controller exclusively owns the camera stream. Every command handler
/// recovers from its own failures: errors end up as transient notices and the
/// session always lands in a phase the user can act from.
pub struct EnrollmentController<A: EnrollmentApi, C: CameraBackend> {
    api: A,
    camera: C,
    settings: ControllerSettings,
    stream: Option<C::Stream>,
    phase: Phase,
    status: Option<EnrollmentStatus>,
    notices: Notices,
    history: Vec<Phase>,
    last_capture: Option<CapturedFrame>,
}

impl<A: EnrollmentApi, C: CameraBackend> EnrollmentController<A, C> {
    pub fn new(api: A, camera: C, settings: ControllerSettings) -> Self {
        Self {
            api,
            camera,
            settings,
            stream: None,
            phase: Phase::Idle,
            status: None,
            notices: Notices::default(),
            history: vec![Phase::Idle],
            last_capture: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> Option<&EnrollmentStatus> {
        self.status.as_ref()
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Every phase entered since the section was opened, in order.
    pub fn phase_history(&self) -> &[Phase] {
        &self.history
    }

    pub fn last_capture(&self) -> Option<&CapturedFrame> {
        self.last_capture.as_ref()
    }

    pub fn live_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.live_tracks())
    }

    pub fn view(&self) -> FaceSectionView {
        self.view_at(Instant::now())
    }

    pub fn view_at(&self, now: Instant) -> FaceSectionView {
        FaceSectionView::derive(self.phase, self.status.as_ref(), &self.notices, now)
    }

    /// Opens the face section: fresh session, then load the server status.
    pub fn enter_section(&mut self) -> CommandOutcome {
        self.release_stream();
        self.phase = Phase::Idle;
        self.history = vec![Phase::Idle];
        self.notices.clear();
        self.last_capture = None;
        self.refresh_status();
        CommandOutcome::Applied
    }

    /// Re-fetches the enrollment status. A failure keeps the cached copy.
    pub fn refresh_status(&mut self) -> bool {
        match self.api.face_status() {
            Ok(status) => {
                tracing::debug!("Face registered: {}", status.has_face_registered());
                self.status = Some(status);
                true
            }
            Err(e) => {
                tracing::error!("Error loading face status: {}", e);
                false
            }
        }
    }

    pub fn start_camera(&mut self) -> CommandOutcome {
        if self.phase != Phase::Idle {
            tracing::warn!("Ignoring start camera while {}", self.phase);
            return CommandOutcome::Ignored { phase: self.phase };
        }

        self.release_stream();
        self.transition(Phase::CameraStarting);

        match self.camera.acquire(&self.settings.constraints) {
            Ok(stream) => {
                let (width, height) = stream.frame_size();
                tracing::info!("Camera stream bound at {}x{}", width, height);
                self.stream = Some(stream);
                self.transition(Phase::CameraActive);
            }
            Err(e) => {
                tracing::error!("Error accessing camera: {}", e);
                self.transition(Phase::Error);
                self.notices.show(NoticeKind::Error, CAMERA_UNAVAILABLE, self.settings.notices.camera_error());
                self.transition(Phase::Idle);
            }
        }

        CommandOutcome::Applied
    }

    /// Grabs a frame and uploads it. Only available while the camera is live.
    pub fn capture_face(&mut self) -> CommandOutcome {
        if self.phase != Phase::CameraActive {
            tracing::warn!("Ignoring capture while {}", self.phase);
            return CommandOutcome::Ignored { phase: self.phase };
        }

        self.notices.clear();
        self.last_capture = None;

        let captured = match self.grab_and_encode() {
            Ok(captured) => captured,
            Err(e) => {
                tracing::error!("Frame capture failed: {}", e);
                self.notices.show(NoticeKind::Error, e.user_message(), self.settings.notices.camera_error());
                return CommandOutcome::Applied;
            }
        };

        self.transition(Phase::Captured);
        self.transition(Phase::Uploading);

        let upload = self.api.register_face(&captured.data_url);
        self.last_capture = Some(captured);

        match upload {
            Ok(message) => {
                tracing::info!("Face registered: {}", message);
                self.release_stream();
                self.refresh_status();
                self.notices.show(NoticeKind::Success, message, self.settings.notices.success());
                self.transition(Phase::Idle);
            }
            Err(e) => {
                tracing::warn!("Face registration failed: {}", e);
                self.transition(Phase::Error);
                self.notices.show(NoticeKind::Error, e.user_message(), self.settings.notices.upload_error());
                self.transition(Phase::CameraActive);
            }
        }

        CommandOutcome::Applied
    }

    /// Stops every track and returns to the placeholder. Safe from any phase.
    pub fn stop_camera(&mut self) -> CommandOutcome {
        self.release_stream();
        if self.phase != Phase::Idle {
            self.transition(Phase::Idle);
        }
        CommandOutcome::Applied
    }

    /// Deletes the server-side registration. The caller confirms intent first.
    pub fn delete_face_registration(&mut self) -> CommandOutcome {
        if self.phase == Phase::Uploading {
            return CommandOutcome::Ignored { phase: self.phase };
        }
        if !self.status.as_ref().is_some_and(EnrollmentStatus::has_face_registered) {
            tracing::warn!("Ignoring delete: no face registered");
            return CommandOutcome::Ignored { phase: self.phase };
        }

        self.notices.clear();

        match self.api.delete_face() {
            Ok(detail) => {
                tracing::info!("Face registration deleted: {}", detail);
                self.refresh_status();
                self.notices.show(NoticeKind::Success, detail, self.settings.notices.success());
            }
            Err(e) => {
                tracing::warn!("Face registration delete failed: {}", e);
                self.notices.show(NoticeKind::Error, e.user_message(), self.settings.notices.delete_error());
            }
        }

        CommandOutcome::Applied
    }

    /// Navigating away: release the camera and reset the session.
    pub fn leave_section(&mut self) -> CommandOutcome {
        self.stop_camera();
        self.notices.clear();
        CommandOutcome::Applied
    }

    /// Grabs a live frame without changing phase, for previews.
    pub fn preview_frame(&mut self) -> Result<Option<DynamicImage>> {
        if self.phase != Phase::CameraActive {
            return Ok(None);
        }
        match self.stream.as_mut() {
            Some(stream) => stream.grab_frame().map(Some),
            None => Ok(None),
        }
    }

    fn grab_and_encode(&mut self) -> Result<CapturedFrame> {
        let stream = self.stream.as_mut()
            .ok_or_else(|| EnrollError::Camera("No live camera stream".into()))?;
        let frame = stream.grab_frame()?;
        CapturedFrame::encode(&frame, self.settings.jpeg_quality)
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::debug!("Released camera stream");
        }
    }

    fn transition(&mut self, next: Phase) {
        tracing::debug!("Enrollment phase {} -> {}", self.phase, next);
        self.phase = next;
        self.history.push(next);
    }
}

impl<A: EnrollmentApi, C: CameraBackend> Drop for EnrollmentController<A, C> {
    fn drop(&mut self) {
        self.release_stream();
    }
}
