//! Maintenance requests: the task store, query service and the status
//! transition endpoint behind the Kanban board.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;
pub use storage::TaskStore;
pub use types::*;

pub fn configure_task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::TASKS,
            get(handle_list_tasks).post(handle_create_task),
        )
        .route(
            ApiUrls::TASK_BY_ID,
            get(handle_get_task)
                .put(handle_update_task)
                .delete(handle_delete_task),
        )
        .route(ApiUrls::TASK_STATUS, patch(handle_update_task_status))
}
