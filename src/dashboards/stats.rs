use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::store::{StoreResult, StoreResultExt};
use crate::core::shared::utils::run_blocking;
use crate::equipment::storage::EquipmentStore;
use crate::equipment::types::EquipmentStatus;
use crate::tasks::storage::TaskStore;
use crate::tasks::types::{Task, TaskPriority, TaskQuery, TaskStatus, TaskTally};

use super::types::{
    ActivityEntry, DashboardMetrics, DashboardStats, EquipmentCounts, TaskCounts, TeamWorkload,
    UserCounts, TEAMS,
};

pub const RECENT_ACTIVITY: usize = 5;

/// Raw figures read from the store in one blocking pass.
#[derive(Debug, Clone, Default)]
pub struct DashboardInputs {
    pub tallies: Vec<TaskTally>,
    pub completion_spans: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    pub equipment: Vec<(EquipmentStatus, i64)>,
    pub users: i64,
    pub upcoming_events: i64,
    pub recent: Vec<Task>,
}

pub fn count_tasks(tallies: &[TaskTally]) -> TaskCounts {
    let mut counts = TaskCounts::default();
    for tally in tallies {
        counts.total += tally.count;
        match tally.status {
            TaskStatus::New => counts.new += tally.count,
            TaskStatus::InProgress => counts.in_progress += tally.count,
            TaskStatus::Repaired => counts.repaired += tally.count,
            TaskStatus::Scrap => counts.scrap += tally.count,
        }
        if tally.priority == TaskPriority::Critical {
            counts.critical += tally.count;
        }
    }
    counts
}

pub fn count_equipment(by_status: &[(EquipmentStatus, i64)]) -> EquipmentCounts {
    let mut counts = EquipmentCounts::default();
    for (status, count) in by_status {
        counts.total += count;
        match status {
            EquipmentStatus::Operational => counts.operational += count,
            EquipmentStatus::MaintenanceRequired => counts.maintenance_required += count,
            EquipmentStatus::Broken => counts.broken += count,
        }
    }
    counts
}

pub fn completion_rate(counts: &TaskCounts) -> i64 {
    if counts.total == 0 {
        return 0;
    }
    (counts.repaired as f64 / counts.total as f64 * 100.0).round() as i64
}

pub fn average_repair_time(spans: &[(DateTime<Utc>, DateTime<Utc>)]) -> String {
    if spans.is_empty() {
        return "0.0h".to_string();
    }
    let total_hours: f64 = spans
        .iter()
        .map(|(assigned, completed)| (*completed - *assigned).num_seconds() as f64 / 3600.0)
        .sum();
    format!("{:.1}h", total_hours / spans.len() as f64)
}

fn activity_entry(task: Task) -> ActivityEntry {
    let equipment = if task.equipment.name.is_empty() {
        "Unknown".to_string()
    } else {
        task.equipment.name
    };
    ActivityEntry {
        id: task.record.id,
        title: task.record.title,
        equipment,
        user: task
            .user
            .map(|u| u.name)
            .unwrap_or_else(|| "Unassigned".to_string()),
        status: task.record.status,
        priority: task.record.priority,
        created_at: task.record.created_at,
    }
}

pub fn build_stats(inputs: DashboardInputs) -> DashboardStats {
    let tasks = count_tasks(&inputs.tallies);
    let metrics = DashboardMetrics {
        completion_rate: completion_rate(&tasks),
        avg_repair_time: average_repair_time(&inputs.completion_spans),
        upcoming_events: inputs.upcoming_events,
    };
    DashboardStats {
        tasks,
        equipment: count_equipment(&inputs.equipment),
        users: UserCounts {
            total: inputs.users,
        },
        metrics,
        recent_activity: inputs.recent.into_iter().map(activity_entry).collect(),
    }
}

pub fn team_workloads(tallies: &[TaskTally]) -> Vec<TeamWorkload> {
    TEAMS
        .iter()
        .map(|team| {
            let (mut active, mut completed) = (0, 0);
            for tally in tallies.iter().filter(|t| t.team == *team) {
                if tally.status.is_terminal() {
                    completed += tally.count;
                } else {
                    active += tally.count;
                }
            }
            TeamWorkload {
                name: (*team).to_string(),
                active_tasks: active,
                completed_tasks: completed,
                total_tasks: active + completed,
            }
        })
        .collect()
}

fn read_inputs(state: &AppState, now: DateTime<Utc>) -> StoreResult<DashboardInputs> {
    let store = &state.store;
    Ok(DashboardInputs {
        tallies: store.task_tallies()?,
        completion_spans: store.completion_spans()?,
        equipment: store.equipment_status_counts()?,
        users: store.count_users()?,
        upcoming_events: store.count_upcoming_events(now)?,
        recent: store.list_tasks(&TaskQuery {
            limit: Some(RECENT_ACTIVITY),
            ..TaskQuery::default()
        })?,
    })
}

pub async fn handle_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let inputs = run_blocking("Failed to fetch dashboard statistics", move || {
        read_inputs(&state, Utc::now()).or_api("Failed to fetch dashboard statistics")
    })
    .await?;
    Ok(Json(build_stats(inputs)))
}

pub async fn handle_team_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TeamWorkload>>, ApiError> {
    let store = state.store.clone();
    let tallies = run_blocking("Failed to fetch team statistics", move || {
        store.task_tallies().or_api("Failed to fetch team statistics")
    })
    .await?;
    Ok(Json(team_workloads(&tallies)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn tally(status: TaskStatus, priority: TaskPriority, team: &str, count: i64) -> TaskTally {
        TaskTally {
            status,
            priority,
            team: team.to_string(),
            count,
        }
    }

    #[test]
    fn test_task_counts_and_completion_rate() {
        let tallies = vec![
            tally(TaskStatus::New, TaskPriority::Critical, "IT", 2),
            tally(TaskStatus::Repaired, TaskPriority::Low, "IT", 1),
            tally(TaskStatus::Scrap, TaskPriority::Critical, "Mechanics", 1),
            tally(TaskStatus::InProgress, TaskPriority::Medium, "Mechanics", 2),
        ];
        let counts = count_tasks(&tallies);
        assert_eq!(counts.total, 6);
        assert_eq!(counts.new, 2);
        assert_eq!(counts.repaired, 1);
        assert_eq!(counts.critical, 3);
        // 1 of 6 repaired rounds to 17
        assert_eq!(completion_rate(&counts), 17);
        assert_eq!(completion_rate(&TaskCounts::default()), 0);
    }

    #[test]
    fn test_average_repair_time() {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        let spans = vec![
            (start, start + Duration::hours(2)),
            (start, start + Duration::minutes(170)),
        ];
        assert_eq!(average_repair_time(&spans), "2.4h");
        assert_eq!(average_repair_time(&[]), "0.0h");
    }

    #[test]
    fn test_team_workloads_cover_fixed_teams() {
        let tallies = vec![
            tally(TaskStatus::New, TaskPriority::Low, "IT", 2),
            tally(TaskStatus::Repaired, TaskPriority::Low, "IT", 3),
            tally(TaskStatus::InProgress, TaskPriority::Low, "Facilities", 9),
        ];
        let teams = team_workloads(&tallies);
        let names: Vec<&str> = teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, TEAMS.to_vec());

        let it = &teams[2];
        assert_eq!((it.active_tasks, it.completed_tasks, it.total_tasks), (2, 3, 5));
        assert_eq!(teams[0].total_tasks, 0);
    }

    #[test]
    fn test_equipment_counts() {
        let counts = count_equipment(&[
            (EquipmentStatus::Operational, 4),
            (EquipmentStatus::Broken, 1),
        ]);
        assert_eq!(counts.total, 5);
        assert_eq!(counts.maintenance_required, 0);
    }
}
