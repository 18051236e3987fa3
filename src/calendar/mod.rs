//! Preventive-maintenance calendar: scheduled events and the month grid.

pub mod grid;
pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use grid::{build_month_grid, month_window, CalendarDay, MonthGrid};
pub use handlers::*;
pub use storage::EventStore;
pub use types::*;

pub fn configure_calendar_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::EVENTS,
            get(handle_list_events).post(handle_create_event),
        )
        .route(ApiUrls::EVENTS_CALENDAR, get(handle_month_calendar))
        .route(
            ApiUrls::EVENT_BY_ID,
            get(handle_get_event)
                .put(handle_update_event)
                .delete(handle_delete_event),
        )
}
