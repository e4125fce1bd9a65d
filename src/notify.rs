//! Notification entity and creation draft.
//!
//! Notifications are created by the command dispatcher as side effects of
//! task completion and reassignment, and delivered back through the store's
//! per-recipient subscription in timestamp-descending order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::NotificationKind;

/// A notification as stored in the `notifications` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// Recipient.
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// Caller-supplied fields for creating a notification.
///
/// The dispatcher assigns the timestamp and sets `read = false` at creation,
/// so neither appears here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}
