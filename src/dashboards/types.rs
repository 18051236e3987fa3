use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tasks::types::{TaskPriority, TaskStatus};

/// Teams reported by the workload summary, in display order.
pub const TEAMS: [&str; 4] = ["Mechanics", "Electricians", "IT", "Maintenance"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub total: i64,
    pub new: i64,
    pub in_progress: i64,
    pub repaired: i64,
    pub scrap: i64,
    pub critical: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentCounts {
    pub total: i64,
    pub operational: i64,
    pub maintenance_required: i64,
    pub broken: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserCounts {
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    /// Percentage of tasks in Repaired, rounded to an integer.
    pub completion_rate: i64,
    /// Mean hours from assignment to completion, e.g. `"2.4h"`.
    pub avg_repair_time: String,
    pub upcoming_events: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i32,
    pub title: String,
    pub equipment: String,
    pub user: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub tasks: TaskCounts,
    pub equipment: EquipmentCounts,
    pub users: UserCounts,
    pub metrics: DashboardMetrics,
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWorkload {
    pub name: String,
    pub active_tasks: i64,
    pub completed_tasks: i64,
    pub total_tasks: i64,
}
