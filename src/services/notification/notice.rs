//! Short-lived in-app notices ("Schedule saved", "Updated by another
//! viewer"). The presentation layer decides how to draw them.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
}

impl NoticeLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Warning => "⚠",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration: Duration::from_secs(3),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Success)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Warning)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.duration
    }
}

#[derive(Debug)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
    duration: Duration,
}

impl NoticeQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            notices: Vec::new(),
            duration,
        }
    }

    /// Queues a notice using the queue's display duration.
    pub fn push(&mut self, notice: Notice) {
        let duration = self.duration;
        self.notices.push(notice.with_duration(duration));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notice::success(message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Notice::info(message));
    }

    /// Takes the notices still visible at `now`; expired ones are dropped.
    pub fn take_active(&mut self, now: Instant) -> Vec<Notice> {
        self.notices.retain(|notice| !notice.is_expired_at(now));
        std::mem::take(&mut self.notices)
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}
