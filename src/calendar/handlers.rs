use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use log::info;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::shared::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::core::shared::state::AppState;
use crate::core::shared::store::StoreResultExt;
use crate::core::shared::utils::run_blocking;

use super::grid::{build_month_grid, month_window, MonthGrid};
use super::storage::EventStore;
use super::types::{
    CalendarQuery, CreateEventRequest, EventDetail, EventFilter, EventQuery, MaintenanceEvent,
    UpdateEventRequest,
};

fn invalid_month() -> ApiError {
    ApiError::InvalidArgument("Invalid month or year".to_string())
}

impl TryFrom<EventQuery> for EventFilter {
    type Error = ApiError;

    fn try_from(query: EventQuery) -> Result<Self, Self::Error> {
        let (from, until) = match (query.month, query.year) {
            (Some(month), Some(year)) => {
                let (from, until) = month_window(year, month).ok_or_else(invalid_month)?;
                (Some(from), Some(until))
            }
            (None, None) => (None, None),
            _ => {
                return Err(ApiError::InvalidArgument(
                    "month and year must be given together".to_string(),
                ))
            }
        };
        Ok(Self {
            from,
            until,
            event_type: query.event_type,
        })
    }
}

pub async fn handle_list_events(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> Result<Json<Vec<MaintenanceEvent>>, ApiError> {
    let filter = EventFilter::try_from(query)?;
    let store = state.store.clone();
    let events = run_blocking("Failed to fetch events", move || {
        store.list_events(&filter).or_api("Failed to fetch events")
    })
    .await?;
    Ok(Json(events))
}

pub async fn handle_month_calendar(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CalendarQuery>,
) -> Result<Json<MonthGrid>, ApiError> {
    let (from, until) = month_window(query.year, query.month).ok_or_else(invalid_month)?;
    let filter = EventFilter {
        from: Some(from),
        until: Some(until),
        event_type: None,
    };

    let store = state.store.clone();
    let events = run_blocking("Failed to fetch events", move || {
        store.list_events(&filter).or_api("Failed to fetch events")
    })
    .await?;

    let grid = build_month_grid(query.year, query.month, &events).ok_or_else(invalid_month)?;
    Ok(Json(grid))
}

pub async fn handle_get_event(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<EventDetail>, ApiError> {
    let store = state.store.clone();
    let event = run_blocking("Failed to fetch event", move || {
        store.get_event(id).or_api("Failed to fetch event")
    })
    .await?;
    Ok(Json(event))
}

pub async fn handle_create_event(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<MaintenanceEvent>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Title is required".to_string()));
    }

    let store = state.store.clone();
    let event = run_blocking("Failed to create event", move || {
        store
            .create_event(req, Utc::now())
            .or_api("Failed to create event")
    })
    .await?;

    info!(
        "Scheduled {} event {} for {}",
        event.record.event_type, event.record.id, event.record.event_date
    );
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn handle_update_event(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateEventRequest>,
) -> Result<Json<MaintenanceEvent>, ApiError> {
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::InvalidArgument("Title is required".to_string()));
    }

    let store = state.store.clone();
    let event = run_blocking("Failed to update event", move || {
        store.update_event(id, &req).or_api("Failed to update event")
    })
    .await?;
    Ok(Json(event))
}

pub async fn handle_delete_event(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    run_blocking("Failed to delete event", move || {
        store.delete_event(id).or_api("Failed to delete event")
    })
    .await?;

    info!("Deleted event {id}");
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}
