use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::shared::error::{ApiError, ApiJson, ApiPath};
use crate::core::shared::state::AppState;
use crate::core::shared::store::StoreResultExt;
use crate::core::shared::utils::run_blocking;

use super::storage::{NewDbUser, UserStore};
use super::types::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, UserDetail, UserProfile,
    UserSummary,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::InvalidArgument("A valid email is required".to_string())),
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Name is required".to_string()));
    }
    Ok(())
}

pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    validate_name(&req.name)?;
    validate_email(&req.email)?;
    state
        .passwords
        .check_policy(&req.password)
        .map_err(ApiError::InvalidArgument)?;

    let store = state.store.clone();
    let passwords = state.passwords.clone();
    let user = run_blocking("Failed to register user", move || {
        let hash = passwords
            .hash(&req.password)
            .map_err(|e| ApiError::internal("Failed to register user", e))?;
        store
            .register_user(NewDbUser::new(req, hash, Utc::now()))
            .or_api("Failed to register user")
    })
    .await?;

    info!("Registered user {} ({})", user.id, user.role);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let store = state.store.clone();
    let passwords = state.passwords.clone();
    let user = run_blocking("Failed to login", move || {
        let Some(credentials) = store
            .find_credentials(&req.email)
            .or_api("Failed to login")?
        else {
            return Ok(None);
        };
        let verified = passwords
            .verify(&req.password, &credentials.password_hash)
            .map_err(|e| ApiError::internal("Failed to login", e))?;
        Ok(verified.then_some(credentials.profile))
    })
    .await?;

    let Some(user) = user else {
        warn!("Failed login attempt");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let issued = state
        .sessions
        .issue(&user)
        .map_err(|e| ApiError::internal("Failed to login", e))?;

    info!("User {} logged in", user.id);
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user,
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

pub async fn handle_list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let store = state.store.clone();
    let users = run_blocking("Failed to fetch users", move || {
        store.list_users().or_api("Failed to fetch users")
    })
    .await?;
    Ok(Json(users))
}

pub async fn handle_get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<UserDetail>, ApiError> {
    let store = state.store.clone();
    let user = run_blocking("Failed to fetch user", move || {
        store.get_user(id).or_api("Failed to fetch user")
    })
    .await?;
    Ok(Json(user))
}

pub async fn handle_update_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    if let Some(email) = &req.email {
        validate_email(email)?;
    }

    let store = state.store.clone();
    let user = run_blocking("Failed to update user", move || {
        store
            .update_user(id, &req, Utc::now())
            .or_api("Failed to update user")
    })
    .await?;
    Ok(Json(user))
}

pub async fn handle_delete_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    run_blocking("Failed to delete user", move || {
        store.delete_user(id).or_api("Failed to delete user")
    })
    .await?;

    info!("Deleted user {id}");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
