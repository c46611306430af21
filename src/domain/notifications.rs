//! Notification domain types
//!
//! In-app notifications, optionally mirrored to email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Notification category
    pub enum NotificationKind {
        Booking => "booking",
        Order => "order",
        Payment => "payment",
        Worker => "worker",
        General => "general",
    }
}

/// Notification entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
}

/// Query params for listing notifications
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotificationQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Unread badge count
#[derive(Debug, Clone, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}
