use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use log::info;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::shared::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::core::shared::state::AppState;
use crate::core::shared::store::StoreResultExt;
use crate::core::shared::utils::run_blocking;

use super::types::{
    CreateEquipmentRequest, Equipment, EquipmentDetail, EquipmentQuery, EquipmentSummary,
    UpdateEquipmentRequest,
};

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidArgument(format!("{field} is required")));
    }
    Ok(())
}

pub async fn handle_list_equipment(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<EquipmentQuery>,
) -> Result<Json<Vec<EquipmentSummary>>, ApiError> {
    let store = state.store.clone();
    let equipment = run_blocking("Failed to fetch equipment", move || {
        store.list_equipment(&query).or_api("Failed to fetch equipment")
    })
    .await?;
    Ok(Json(equipment))
}

pub async fn handle_get_equipment(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<EquipmentDetail>, ApiError> {
    let store = state.store.clone();
    let equipment = run_blocking("Failed to fetch equipment", move || {
        store.get_equipment(id).or_api("Failed to fetch equipment")
    })
    .await?;
    Ok(Json(equipment))
}

pub async fn handle_create_equipment(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateEquipmentRequest>,
) -> Result<(StatusCode, Json<Equipment>), ApiError> {
    require(&req.name, "Name")?;
    require(&req.serial_number, "Serial number")?;

    let store = state.store.clone();
    let equipment = run_blocking("Failed to create equipment", move || {
        store
            .create_equipment(req, Utc::now())
            .or_api("Failed to create equipment")
    })
    .await?;

    info!(
        "Registered equipment {} ({})",
        equipment.id, equipment.serial_number
    );
    Ok((StatusCode::CREATED, Json(equipment)))
}

pub async fn handle_update_equipment(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateEquipmentRequest>,
) -> Result<Json<Equipment>, ApiError> {
    if let Some(name) = &req.name {
        require(name, "Name")?;
    }
    if let Some(serial) = &req.serial_number {
        require(serial, "Serial number")?;
    }

    let store = state.store.clone();
    let equipment = run_blocking("Failed to update equipment", move || {
        store
            .update_equipment(id, &req, Utc::now())
            .or_api("Failed to update equipment")
    })
    .await?;
    Ok(Json(equipment))
}

pub async fn handle_delete_equipment(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    run_blocking("Failed to delete equipment", move || {
        store.delete_equipment(id).or_api("Failed to delete equipment")
    })
    .await?;

    info!("Deleted equipment {id}");
    Ok(Json(json!({ "message": "Equipment deleted successfully" })))
}
