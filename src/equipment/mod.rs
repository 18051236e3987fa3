//! Equipment registry.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;
pub use storage::EquipmentStore;
pub use types::*;

pub fn configure_equipment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::EQUIPMENT,
            get(handle_list_equipment).post(handle_create_equipment),
        )
        .route(
            ApiUrls::EQUIPMENT_BY_ID,
            get(handle_get_equipment)
                .put(handle_update_equipment)
                .delete(handle_delete_equipment),
        )
}
