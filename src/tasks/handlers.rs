use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::shared::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::core::shared::state::AppState;
use crate::core::shared::store::StoreResultExt;
use crate::core::shared::utils::run_blocking;

use super::storage::TaskStore;
use super::types::{
    CreateTaskRequest, StatusUpdateRequest, Task, TaskChanges, TaskDetail, TaskQuery,
    TaskStatus, UpdateTaskRequest,
};

fn require_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Title is required".to_string()));
    }
    Ok(())
}

pub async fn handle_list_tasks(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TaskQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let store = state.store.clone();
    let tasks = run_blocking("Failed to fetch tasks", move || {
        store.list_tasks(&query).or_api("Failed to fetch tasks")
    })
    .await?;
    Ok(Json(tasks))
}

pub async fn handle_get_task(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<TaskDetail>, ApiError> {
    let store = state.store.clone();
    let task = run_blocking("Failed to fetch task", move || {
        store.get_task(id).or_api("Failed to fetch task")
    })
    .await?;
    Ok(Json(task))
}

pub async fn handle_create_task(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    require_title(&req.title)?;

    let store = state.store.clone();
    let task = run_blocking("Failed to create task", move || {
        store
            .create_task(req, Utc::now())
            .or_api("Failed to create task")
    })
    .await?;

    info!(
        "Created task {} '{}' on equipment {}",
        task.id(),
        task.record.title,
        task.record.equipment_id
    );
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn handle_update_task(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    if let Some(title) = &req.title {
        require_title(title)?;
    }

    let changes = TaskChanges::from(req);
    let store = state.store.clone();
    let task = run_blocking("Failed to update task", move || {
        store
            .update_task(id, &changes, Utc::now())
            .or_api("Failed to update task")
    })
    .await?;
    Ok(Json(task))
}

/// Kanban drop target: validates the literal, then applies one status change.
pub async fn handle_update_task_status(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> Result<Json<Task>, ApiError> {
    let status: TaskStatus = req.status.parse().map_err(|e| {
        warn!("Rejected status change for task {id}: {e}");
        ApiError::InvalidArgument("Invalid status".to_string())
    })?;

    let changes = TaskChanges::transition(status, req.expected_version);
    let store = state.store.clone();
    let task = run_blocking("Failed to update task status", move || {
        store
            .update_task(id, &changes, Utc::now())
            .or_api("Failed to update task status")
    })
    .await?;

    info!("Task {id} moved to {status}");
    Ok(Json(task))
}

pub async fn handle_delete_task(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    run_blocking("Failed to delete task", move || {
        store.delete_task(id).or_api("Failed to delete task")
    })
    .await?;

    info!("Deleted task {id}");
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}
