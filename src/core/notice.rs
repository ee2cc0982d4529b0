use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message that hides itself once its time is up.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Notice {
    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.shown_at + self.ttl
    }

    pub fn expires_at(&self) -> Instant {
        self.shown_at + self.ttl
    }
}

/// One slot per kind; a newer notice replaces the older one of the same kind.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    error: Option<Notice>,
    success: Option<Notice>,
}

impl Notices {
    pub fn show(&mut self, kind: NoticeKind, text: impl Into<String>, ttl: Duration) {
        self.show_at(kind, text, ttl, Instant::now());
    }

    pub fn show_at(&mut self, kind: NoticeKind, text: impl Into<String>, ttl: Duration, now: Instant) {
        let notice = Notice { kind, text: text.into(), shown_at: now, ttl };
        match kind {
            NoticeKind::Error => self.error = Some(notice),
            NoticeKind::Success => self.success = Some(notice),
        }
    }

    pub fn clear(&mut self) {
        self.error = None;
        self.success = None;
    }

    pub fn error(&self, now: Instant) -> Option<&str> {
        self.error.as_ref().filter(|n| n.is_visible(now)).map(|n| n.text.as_str())
    }

    pub fn success(&self, now: Instant) -> Option<&str> {
        self.success.as_ref().filter(|n| n.is_visible(now)).map(|n| n.text.as_str())
    }

    /// Drops notices whose time is up.
    pub fn prune(&mut self, now: Instant) {
        if self.error.as_ref().is_some_and(|n| !n.is_visible(now)) {
            self.error = None;
        }
        if self.success.as_ref().is_some_and(|n| !n.is_visible(now)) {
            self.success = None;
        }
    }

    /// Earliest moment a visible notice disappears, for UI redraw scheduling.
    pub fn next_expiry(&self) -> Option<Instant> {
        [self.error.as_ref(), self.success.as_ref()]
            .into_iter()
            .flatten()
            .map(Notice::expires_at)
            .min()
    }
}
