//! HTTP server initialization and routing

use axum::{middleware, routing::get, Router};
use log::{error, info};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::calendar::configure_calendar_routes;
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::dashboards::configure_dashboard_routes;
use crate::equipment::configure_equipment_routes;
use crate::security::require_auth;
use crate::tasks::configure_task_routes;
use crate::users::configure_user_routes;

use super::{health_check, shutdown_signal};

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Full `/api` surface with auth, CORS and request tracing applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route(ApiUrls::HEALTH, get(health_check))
        .merge(configure_user_routes())
        .merge(configure_equipment_routes())
        .merge(configure_task_routes())
        .merge(configure_calendar_routes())
        .merge(configure_dashboard_routes())
        .fallback(route_not_found);

    api_router
        // auth runs inside CORS so preflight requests never need a token
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(state: Arc<AppState>) -> std::io::Result<()> {
    let addr = state.config.bind_address();
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {addr}: {e} - is another instance running?");
            return Err(e);
        }
    };
    info!("HTTP server listening on {addr}");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::shared::store::MemoryStore;
    use crate::security::{Argon2Config, PasswordHasher, SessionManager};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let sessions = SessionManager::new(&SessionManager::generate_dev_secret(), "gearguard", 60)
            .unwrap();
        let passwords = PasswordHasher::new(Argon2Config::low_memory()).unwrap();
        Arc::new(AppState::new(
            AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(sessions),
            passwords,
        ))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn login(app: &Router) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            ApiUrls::USER_REGISTER,
            None,
            Some(json!({"name": "Ana", "email": "Ana@Plant.io", "password": "wrench-time"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app,
            Method::POST,
            ApiUrls::USER_LOGIN,
            None,
            Some(json!({"email": "ana@plant.io", "password": "wrench-time"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = build_router(test_state());
        let (status, body) = call(&app, Method::GET, ApiUrls::HEALTH, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let app = build_router(test_state());
        let (status, body) = call(&app, Method::GET, ApiUrls::TASKS, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");

        let (status, _) = call(&app, Method::GET, ApiUrls::TASKS, Some("forged"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = build_router(test_state());
        login(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            ApiUrls::USER_LOGIN,
            None,
            Some(json!({"email": "ana@plant.io", "password": "not-the-one"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_status_transition_over_http() {
        let app = build_router(test_state());
        let token = login(&app).await;
        let token = Some(token.as_str());

        let (status, equipment) = call(
            &app,
            Method::POST,
            ApiUrls::EQUIPMENT,
            token,
            Some(json!({"name": "Press", "serialNumber": "PR-7"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, task) = call(
            &app,
            Method::POST,
            ApiUrls::TASKS,
            token,
            Some(json!({"title": "Hydraulic leak", "equipmentId": equipment["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["status"], "New");
        assert!(task["completionDate"].is_null());

        let id = task["id"].as_i64().unwrap() as i32;
        let status_url = ApiUrls::with_id(ApiUrls::TASK_STATUS, id);

        let (status, body) = call(
            &app,
            Method::PATCH,
            &status_url,
            token,
            Some(json!({"status": "Urgent"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid status");

        let (status, body) = call(
            &app,
            Method::PATCH,
            &status_url,
            token,
            Some(json!({"status": "Repaired"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Repaired");
        assert!(body["completionDate"].is_string());
        assert_eq!(body["equipment"]["serialNumber"], "PR-7");

        let (status, _) = call(
            &app,
            Method::PATCH,
            &ApiUrls::with_id(ApiUrls::TASK_STATUS, 999),
            token,
            Some(json!({"status": "Repaired"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    async fn seed_task(app: &Router, token: Option<&str>, serial: &str) -> Value {
        let (_, equipment) = call(
            app,
            Method::POST,
            ApiUrls::EQUIPMENT,
            token,
            Some(json!({"name": "Pump", "serialNumber": serial})),
        )
        .await;
        let (status, task) = call(
            app,
            Method::POST,
            ApiUrls::TASKS,
            token,
            Some(json!({"title": "Seal worn", "equipmentId": equipment["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        task
    }

    #[tokio::test]
    async fn test_empty_filter_params_are_ignored() {
        let app = build_router(test_state());
        let token = login(&app).await;
        let token = Some(token.as_str());
        seed_task(&app, token, "PM-1").await;

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/tasks?status=&priority=&team=&equipmentId=",
            token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (status, body) =
            call(&app, Method::GET, "/api/tasks?status=In%20Progress&team=", token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(0));

        let (status, _) =
            call(&app, Method::GET, "/api/events?month=&year=&eventType=", token, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            call(&app, Method::GET, "/api/equipment?status=&search=", token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (status, _) = call(&app, Method::GET, "/api/tasks?status=Urgent", token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_conflict() {
        let app = build_router(test_state());
        let token = login(&app).await;
        let token = Some(token.as_str());
        let task = seed_task(&app, token, "PM-2").await;
        let id = task["id"].as_i64().unwrap() as i32;

        let (status, body) = call(
            &app,
            Method::PATCH,
            &ApiUrls::with_id(ApiUrls::TASK_STATUS, id),
            token,
            Some(json!({"status": "Repaired", "expectedVersion": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"]
            .as_str()
            .is_some_and(|msg| msg.contains("modified concurrently")));

        let (status, body) = call(
            &app,
            Method::PUT,
            &ApiUrls::with_id(ApiUrls::TASK_BY_ID, id),
            token,
            Some(json!({"title": "Seal replaced", "expectedVersion": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 2);

        let (status, _) = call(
            &app,
            Method::PUT,
            &ApiUrls::with_id(ApiUrls::TASK_BY_ID, id),
            token,
            Some(json!({"status": "Scrap", "expectedVersion": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_fields_and_bad_ids_are_rejected() {
        let app = build_router(test_state());
        let token = login(&app).await;
        let token = Some(token.as_str());

        let (status, body) = call(
            &app,
            Method::POST,
            ApiUrls::EQUIPMENT,
            token,
            Some(json!({"name": "Press", "serialNumber": "PR-8", "colour": "red"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = call(&app, Method::GET, "/api/tasks/abc", token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, "/api/nowhere", token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_dashboard_reports_counts() {
        let app = build_router(test_state());
        let token = login(&app).await;
        let token = Some(token.as_str());

        let (status, body) = call(&app, Method::GET, ApiUrls::DASHBOARD_STATS, token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"]["total"], 1);
        assert_eq!(body["tasks"]["total"], 0);
        assert_eq!(body["metrics"]["avgRepairTime"], "0.0h");

        let (status, body) = call(&app, Method::GET, ApiUrls::DASHBOARD_TEAMS, token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(4));
    }
}
