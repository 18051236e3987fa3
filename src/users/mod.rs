//! Accounts: registration, login and the technician directory.

pub mod handlers;
pub mod storage;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;
pub use storage::UserStore;
pub use types::*;

pub fn configure_user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::USER_REGISTER, post(handle_register))
        .route(ApiUrls::USER_LOGIN, post(handle_login))
        .route(ApiUrls::USERS, get(handle_list_users))
        .route(
            ApiUrls::USER_BY_ID,
            get(handle_get_user)
                .put(handle_update_user)
                .delete(handle_delete_user),
        )
}
