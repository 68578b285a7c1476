// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A registered account.
///
/// The password hash lives only in the `users` table and is never loaded
/// into this structure, so no read path (JSON, `Debug`, template) can leak it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Lifecycle of a task. Stored and transmitted by its upper-case name.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Wire/storage name, e.g. `IN_PROGRESS`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of the enumerated names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown task status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A task owned by exactly one user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,

    // Set at creation and never updated.
    pub owner_id: i64,

    pub created_at: DateTime<Utc>,
}

/// View access on one task granted to one other user.
///
/// `can_view_status` defaults to true in storage while `can_view` defaults
/// to false; sharing always sets both.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Permission {
    pub id: i64,
    pub task_id: i64,
    #[sqlx(rename = "user_id")]
    pub grantee_id: i64,
    pub can_view: bool,
    pub can_view_status: bool,
}

/// Result of sharing a task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShareOutcome {
    /// A new permission row was inserted.
    Shared,
    /// A permission row already existed and was upgraded in place.
    Upgraded,
}

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

/// Returned on login. `token` goes into `Authorization: Bearer <token>`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Title and description of a task, used for both creation and edits.
#[derive(Deserialize, Debug, Clone)]
pub struct TaskPayload {
    pub title: String,
    pub description: Option<String>,
}

/// Raw status string; validated server-side so that an unknown value is
/// reported as an invalid status rather than a malformed body.
#[derive(Deserialize, Debug)]
pub struct StatusPayload {
    pub status: String,
}

#[derive(Deserialize, Debug)]
pub struct SharePayload {
    pub username: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AdminTaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
}
