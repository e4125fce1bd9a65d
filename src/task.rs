//! Task entity and creation draft.
//!
//! A task is the central work item of the dashboard: it belongs to exactly one
//! assignee, project and department, carries a due date, and moves through the
//! fixed status sequence defined in [`crate::fields::Status`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, Status};

/// A work item as stored in the `tasks` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: NaiveDate,
    pub assignee_id: String,
    pub project_id: String,
    pub dept_id: String,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Caller-supplied fields for creating a task.
///
/// The dispatcher assigns the document id, and overwrites `status` with
/// `To Do` whatever the draft says.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: NaiveDate,
    pub assignee_id: String,
    pub project_id: String,
    pub dept_id: String,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}
