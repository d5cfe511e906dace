//! Auto-dismissing user notices (toasts).

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::ResourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    expires_at: Instant,
}

/// Non-blocking notices shown to the user. Every notice expires after the
/// board's time-to-live.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: Vec::new(),
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> Uuid {
        self.prune();
        let notice = Notice {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            raised_at: Utc::now(),
            expires_at: Instant::now() + self.ttl,
        };
        let id = notice.id;
        self.notices.push(notice);
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Success, message)
    }

    /// Raise an error notice. Validation errors belong to their form and are
    /// not shown here.
    pub fn error(&mut self, error: &ResourceError) -> Option<Uuid> {
        error
            .is_user_visible()
            .then(|| self.push(NoticeLevel::Error, error.message.clone()))
    }

    /// Notices still on screen; expired ones are dropped.
    pub fn active(&mut self) -> Vec<Notice> {
        self.prune();
        self.notices.clone()
    }

    /// Number of notices held, expired ones included until the next prune.
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    fn prune(&mut self) {
        let now = Instant::now();
        self.notices.retain(|n| n.expires_at > now);
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() < before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldError;

    #[tokio::test(start_paused = true)]
    async fn test_notices_expire() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        board.success("Slider created");
        tokio::time::advance(Duration::from_secs(2)).await;
        board.push(NoticeLevel::Info, "Refreshing");

        assert_eq!(board.active().len(), 2);
        tokio::time::advance(Duration::from_secs(2)).await;
        let active = board.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Refreshing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_board_stays_bounded() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        for _ in 0..100 {
            board.error(&ResourceError::network("offline"));
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        assert!(board.len() <= 3);
    }

    #[test]
    fn test_validation_errors_are_not_posted() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        let invalid = ResourceError::validation(vec![FieldError::new("title", "required")]);
        assert!(board.error(&invalid).is_none());
        assert!(board.error(&ResourceError::network("offline")).is_some());
    }

    #[test]
    fn test_dismiss() {
        let mut board = NoticeBoard::new(Duration::from_secs(60));
        let id = board.success("Saved");
        assert!(board.dismiss(id));
        assert!(!board.dismiss(id));
    }
}
