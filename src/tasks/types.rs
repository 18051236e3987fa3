//! Types for the tasks module
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::shared::utils::{double_option, empty_string_as_none};
use crate::equipment::types::{Equipment, EquipmentRef};
use crate::users::types::{UserProfile, UserRef};

pub use crate::core::shared::enums::{TaskPriority, TaskStatus};

pub const DEFAULT_TEAM: &str = "Maintenance";

/// Columns of a task row as they appear on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub team: String,
    pub assigned_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub equipment_id: i32,
    pub user_id: Option<i32>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with the narrow projections the board renders on each card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    pub record: TaskRecord,
    pub equipment: EquipmentRef,
    pub user: Option<UserRef>,
}

impl Task {
    pub fn id(&self) -> i32 {
        self.record.id
    }

    pub fn status(&self) -> TaskStatus {
        self.record.status
    }
}

/// A single task with full equipment and assignee detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub record: TaskRecord,
    pub equipment: Equipment,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskQuery {
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<TaskPriority>,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub team: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub equipment_id: Option<i32>,
    #[serde(skip)]
    pub user_id: Option<i32>,
    #[serde(skip)]
    pub limit: Option<usize>,
}

impl TaskQuery {
    pub fn matches(&self, record: &TaskRecord) -> bool {
        self.status.map_or(true, |s| s == record.status)
            && self.priority.map_or(true, |p| p == record.priority)
            && self.team.as_ref().map_or(true, |t| *t == record.team)
            && self.equipment_id.map_or(true, |e| e == record.equipment_id)
            && self.user_id.map_or(true, |u| Some(u) == record.user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub equipment_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
}

/// Body of `PUT /api/tasks/{id}`. Absent fields keep their stored value;
/// `"userId": null` unassigns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub team: Option<String>,
    pub equipment_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_id: Option<Option<i32>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub expected_version: Option<i32>,
}

/// Body of `PATCH /api/tasks/{id}/status`. The status stays a raw string so an
/// unknown literal is answered with "Invalid status" instead of a decode error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusUpdateRequest {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i32>,
}

/// A write against one task, as the store applies it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub team: Option<String>,
    pub equipment_id: Option<i32>,
    pub user_id: Option<Option<i32>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub expected_version: Option<i32>,
    /// Re-stamps the completion rule even when `status` equals the stored one.
    pub force_transition: bool,
}

impl TaskChanges {
    pub fn transition(status: TaskStatus, expected_version: Option<i32>) -> Self {
        Self {
            status: Some(status),
            expected_version,
            force_transition: true,
            ..Self::default()
        }
    }
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            team: req.team,
            equipment_id: req.equipment_id,
            user_id: req.user_id,
            completion_date: req.completion_date,
            expected_version: req.expected_version,
            force_transition: false,
        }
    }
}

/// Number of tasks sharing one (status, priority, team) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTally {
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub team: String,
    pub count: i64,
}

/// Completion timestamp after a task moves to `status`.
///
/// Repaired and Scrap stamp `now`. New and In Progress keep whatever was stored
/// before, so re-opening a finished task keeps its last completion time.
pub fn completion_after(
    status: TaskStatus,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if status.is_terminal() {
        Some(now)
    } else {
        previous
    }
}
