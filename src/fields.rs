//! Enumerations and field types for the dashboard domain.
//!
//! This module defines the structured vocabulary shared by every other module:
//! task priority and lifecycle status, user roles, notification kinds, the KPI
//! selectors used by the feed projector, and the response locale for AI calls.
//!
//! Serde names match the documents persisted in the remote store, so these
//! types decode collection snapshots directly.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task importance classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

/// Task lifecycle stage. The four stages form a fixed ordered sequence;
/// advancing or retreating always moves exactly one step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "To Do")]
    #[value(name = "todo")]
    Todo,
    #[serde(rename = "In Progress")]
    #[value(name = "in-progress")]
    InProgress,
    Review,
    Completed,
}

impl Status {
    /// The lifecycle sequence, in order. Kanban columns render in this order.
    pub const SEQUENCE: [Status; 4] = [
        Status::Todo,
        Status::InProgress,
        Status::Review,
        Status::Completed,
    ];

    /// One step forward in the sequence; saturates at `Completed`.
    pub fn advanced(self) -> Status {
        match self {
            Status::Todo => Status::InProgress,
            Status::InProgress => Status::Review,
            Status::Review | Status::Completed => Status::Completed,
        }
    }

    /// One step back in the sequence; saturates at `To Do`.
    pub fn retreated(self) -> Status {
        match self {
            Status::Todo | Status::InProgress => Status::Todo,
            Status::Review => Status::InProgress,
            Status::Completed => Status::Review,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::InProgress => "In Progress",
            Status::Review => "Review",
            Status::Completed => "Completed",
        }
    }
}

/// Team member role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Viewer,
}

/// What produced a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Assignment,
    Status,
    Alert,
    Comment,
}

/// Named aggregate views used to slice the task feed.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Kpi {
    /// Every task.
    Total,
    /// Completed tasks only.
    Completed,
    /// Due strictly before today and not yet completed.
    Overdue,
    /// Urgent or High priority.
    Priority,
}

/// Response language for AI insight requests.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    /// Language name as spelled out in AI prompts.
    pub fn language_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Ar => "Arabic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_advances_one_step_and_saturates() {
        assert_eq!(Status::Todo.advanced(), Status::InProgress);
        assert_eq!(Status::InProgress.advanced(), Status::Review);
        assert_eq!(Status::Review.advanced(), Status::Completed);
        assert_eq!(Status::Completed.advanced(), Status::Completed);
    }

    #[test]
    fn status_retreats_one_step_and_saturates() {
        assert_eq!(Status::Completed.retreated(), Status::Review);
        assert_eq!(Status::Review.retreated(), Status::InProgress);
        assert_eq!(Status::InProgress.retreated(), Status::Todo);
        assert_eq!(Status::Todo.retreated(), Status::Todo);
    }

    #[test]
    fn status_wire_names_match_store_documents() {
        assert_eq!(
            serde_json::to_value(Status::Todo).unwrap(),
            serde_json::json!("To Do")
        );
        assert_eq!(
            serde_json::to_value(Status::InProgress).unwrap(),
            serde_json::json!("In Progress")
        );
        let s: Status = serde_json::from_value(serde_json::json!("Completed")).unwrap();
        assert_eq!(s, Status::Completed);
    }

    #[test]
    fn notification_kind_is_lowercase_on_the_wire() {
        assert_eq!(
            serde_json::to_value(NotificationKind::Assignment).unwrap(),
            serde_json::json!("assignment")
        );
    }
}
