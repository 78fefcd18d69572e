mod notice;

pub use notice::{Notice, NoticeLevel, NoticeQueue};

use anyhow::Result;
use notify_rust::{Notification, Timeout};

/// Service for displaying desktop notifications
pub struct NotificationService {
    enabled: bool,
}

impl NotificationService {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Check if notifications are enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mirror an in-app notice on the desktop.
    pub fn show_notice(&self, notice: &Notice) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let timeout = match notice.level {
            NoticeLevel::Warning => Timeout::Milliseconds(10000),
            NoticeLevel::Success | NoticeLevel::Info => Timeout::Milliseconds(5000),
        };

        Notification::new()
            .summary("Weekly Schedule")
            .body(&notice.message)
            .timeout(timeout)
            .show()
            .map_err(|e| anyhow::anyhow!("Failed to show notification: {}", e))?;

        Ok(())
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(false)
    }
}
