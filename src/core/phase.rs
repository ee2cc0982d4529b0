use std::fmt;

/// Where the capture session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    CameraStarting,
    CameraActive,
    Captured,
    Uploading,
    Error,
}

impl Phase {
    /// Phases in which a camera stream may be held.
    pub fn holds_stream(self) -> bool {
        matches!(self, Phase::CameraActive | Phase::Captured | Phase::Uploading)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::CameraStarting => "camera starting",
            Phase::CameraActive => "camera active",
            Phase::Captured => "captured",
            Phase::Uploading => "uploading",
            Phase::Error => "error",
        };
        f.write_str(name)
    }
}

/// Result of a command handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// The command is not available in the current phase and did nothing.
    Ignored { phase: Phase },
}

impl CommandOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}
