// src/notify.rs
use chrono::{DateTime, Duration, Utc};
use log::{error, info};

const DISMISS_AFTER_MS: i64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub tone: Tone,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

/// Sink for operation outcomes. Nothing reads back what was sent.
pub trait Notifier: Send {
    fn notify(&mut self, notice: Notice);

    fn success(&mut self, message: &str) {
        self.notify(Notice::success(message));
    }

    fn error(&mut self, message: &str) {
        self.notify(Notice::error(message));
    }
}

/// Toast-style queue: notices stay visible for a fixed interval, then drop.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    notices: Vec<Notice>,
    dismiss_after: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
            dismiss_after: Duration::milliseconds(DISMISS_AFTER_MS),
        }
    }

    pub fn with_dismiss_after(mut self, dismiss_after: Duration) -> Self {
        self.dismiss_after = dismiss_after;
        self
    }

    pub fn dismiss_after(&self) -> Duration {
        self.dismiss_after
    }

    /// Notices still on screen at `now`, oldest first.
    pub fn visible_at(&mut self, now: DateTime<Utc>) -> &[Notice] {
        let ttl = self.dismiss_after;
        self.notices.retain(|n| now - n.raised_at < ttl);
        &self.notices
    }

    pub fn visible(&mut self) -> &[Notice] {
        self.visible_at(Utc::now())
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Notifier for ToastQueue {
    fn notify(&mut self, notice: Notice) {
        match notice.tone {
            Tone::Success => info!("{}", notice.message),
            Tone::Error => error!("{}", notice.message),
        }
        self.notices.push(notice);
    }
}
