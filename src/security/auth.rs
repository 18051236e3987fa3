use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::{debug, warn};
use std::sync::Arc;

use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

use super::jwt::{extract_bearer_token, Claims};

/// Identity resolved from a valid session token, stored in request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = anyhow::Error;

    fn try_from(claims: Claims) -> Result<Self> {
        Ok(Self {
            id: claims.user_id()?,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        })
    }
}

pub fn is_public_path(method: &Method, path: &str) -> bool {
    path == ApiUrls::HEALTH
        || (method == Method::POST && (path == ApiUrls::USER_REGISTER || path == ApiUrls::USER_LOGIN))
}

/// Rejects requests without a valid bearer token, except the public
/// health, register and login routes.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_public_path(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let claims = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
    {
        Some(token) => state.sessions.validate(token),
        None => {
            debug!("No bearer token on {}", request.uri().path());
            return ApiError::Unauthorized("Authentication required".to_string()).into_response();
        }
    };

    match claims.and_then(AuthenticatedUser::try_from) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            warn!("Rejected session token: {e}");
            ApiError::Unauthorized("Invalid or expired token".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path(&Method::GET, "/api/health"));
        assert!(is_public_path(&Method::POST, "/api/users/login"));
        assert!(is_public_path(&Method::POST, "/api/users/register"));
        assert!(!is_public_path(&Method::GET, "/api/users"));
        assert!(!is_public_path(&Method::PATCH, "/api/tasks/7/status"));
    }
}
