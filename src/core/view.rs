use chrono::{DateTime, Local, Utc};
use std::time::Instant;
use crate::core::notice::Notices;
use crate::core::phase::Phase;
use crate::core::status::EnrollmentStatus;

/// Everything the face section shows, derived from controller state only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSectionView {
    pub status_icon: &'static str,
    pub status_label: &'static str,
    pub details_visible: bool,
    pub enrolled_at: Option<String>,
    pub last_verified: Option<String>,
    pub delete_visible: bool,
    pub placeholder_visible: bool,
    pub video_visible: bool,
    pub start_visible: bool,
    pub capture_visible: bool,
    pub stop_visible: bool,
    pub processing_visible: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl FaceSectionView {
    pub fn derive(phase: Phase, status: Option<&EnrollmentStatus>, notices: &Notices, now: Instant) -> Self {
        let registered = status.filter(|s| s.has_face_registered());

        Self {
            status_icon: if registered.is_some() { "✅" } else { "🔒" },
            status_label: if registered.is_some() { "Face registered" } else { "Not registered" },
            details_visible: registered.is_some(),
            enrolled_at: registered.and_then(|s| s.enrolled_at()).map(format_local),
            last_verified: registered.map(|s| {
                s.last_verified_at().map(format_local).unwrap_or_else(|| "Never".to_string())
            }),
            delete_visible: registered.is_some(),
            placeholder_visible: matches!(phase, Phase::Idle | Phase::CameraStarting | Phase::Error),
            video_visible: phase.holds_stream(),
            start_visible: phase == Phase::Idle,
            capture_visible: phase == Phase::CameraActive,
            stop_visible: matches!(phase, Phase::CameraActive | Phase::Captured),
            processing_visible: matches!(phase, Phase::Captured | Phase::Uploading),
            error: notices.error(now).map(str::to_string),
            success: notices.success(now).map(str::to_string),
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn render(&self) -> String {
        let mut out = format!("{} {}\n", self.status_icon, self.status_label);
        if self.details_visible {
            if let Some(enrolled) = &self.enrolled_at {
                out.push_str(&format!("   Enrolled:      {}\n", enrolled));
            }
            if let Some(verified) = &self.last_verified {
                out.push_str(&format!("   Last verified: {}\n", verified));
            }
        }
        out.push_str(if self.video_visible { "   [camera live]\n" } else { "   [no camera]\n" });
        if self.processing_visible {
            out.push_str("   Processing...\n");
        }
        if let Some(err) = &self.error {
            out.push_str(&format!("❌ {}\n", err));
        }
        if let Some(ok) = &self.success {
            out.push_str(&format!("✅ {}\n", ok));
        }
        out
    }

    /// Key hints for the actions currently on offer.
    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions = Vec::new();
        if self.start_visible {
            actions.push("[s] start camera");
        }
        if self.capture_visible {
            actions.push("[c] capture");
            actions.push("[p] preview");
        }
        if self.stop_visible {
            actions.push("[x] stop camera");
        }
        if self.delete_visible {
            actions.push("[d] delete registration");
        }
        actions.push("[r] refresh");
        actions.push("[q] quit");
        actions
    }
}

fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}
