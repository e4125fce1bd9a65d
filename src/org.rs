//! Organisational entities: team members, departments, projects.

use serde::{Deserialize, Serialize};

use crate::fields::Role;

/// A team member as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub dept_id: String,
}

/// A department as stored in the `departments` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: String,
    pub name: String,
}

/// A project as stored in the `projects` collection.
///
/// `progress` is a percentage in 0..=100, maintained by whoever edits the
/// project; the dashboard only displays it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub dept_id: String,
    pub progress: u8,
}
