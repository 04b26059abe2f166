//! The single operator-visible notification slot.

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: Severity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: Severity::Error,
            message: message.into(),
        }
    }

    /// Scoped failure: "`scope`: `reason`".
    pub fn failure(scope: &str, err: &MonitorError) -> Self {
        Self::error(format!("{scope}: {err}"))
    }

    pub fn is_error(&self) -> bool {
        self.kind == Severity::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Holds at most one notification. Posting replaces whatever was shown.
#[derive(Debug, Default)]
pub struct NotificationBoard {
    current: Mutex<Option<Notification>>,
}

impl NotificationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, notification: Notification) {
        *self.current.lock() = Some(notification);
    }

    pub fn current(&self) -> Option<Notification> {
        self.current.lock().clone()
    }

    /// Remove and return the visible notification.
    pub fn dismiss(&self) -> Option<Notification> {
        self.current.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_notification_replaces_previous() {
        let board = NotificationBoard::new();
        board.post(Notification::success("created"));
        board.post(Notification::error("failed"));
        assert_eq!(board.current(), Some(Notification::error("failed")));
    }

    #[test]
    fn dismiss_clears_slot() {
        let board = NotificationBoard::new();
        board.post(Notification::warning("partial"));
        assert!(board.dismiss().is_some());
        assert!(board.current().is_none());
        assert!(board.dismiss().is_none());
    }

    #[test]
    fn failure_is_scoped() {
        let err = MonitorError::transport(Some(500), "Request failed (HTTP 500)");
        let n = Notification::failure("Failed to load wallets", &err);
        assert!(n.is_error());
        assert_eq!(n.message, "Failed to load wallets: Request failed (HTTP 500)");
    }

    #[test]
    fn serializes_as_type_and_message() {
        let json = serde_json::to_value(Notification::warning("x")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "warning", "message": "x"}));
    }
}
