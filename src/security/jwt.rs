use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::users::types::UserProfile;

pub const MIN_SECRET_LEN: usize = 32;
const LEEWAY_SECONDS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32> {
        self.sub
            .parse()
            .map_err(|e| anyhow!("Invalid subject in token: {e}"))
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until expiry.
    pub expires_in: i64,
}

/// Issues and validates the signed, expiring tokens that replace
/// browser-stored identity.
pub struct SessionManager {
    issuer: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionManager {
    pub fn new(secret: &str, issuer: &str, ttl_minutes: i64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "JWT secret must be at least {MIN_SECRET_LEN} characters"
            ));
        }
        if ttl_minutes <= 0 {
            return Err(anyhow!("Token lifetime must be positive"));
        }
        Ok(Self {
            issuer: issuer.to_string(),
            ttl: Duration::minutes(ttl_minutes),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(&config.jwt_secret, &config.issuer, config.token_ttl_minutes)
    }

    /// Random secret for runs without a configured one. Tokens do not survive
    /// a restart.
    pub fn generate_dev_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    pub fn issue(&self, user: &UserProfile) -> Result<IssuedToken> {
        let now = Utc::now();
        let expiry = now + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            iss: self.issuer.clone(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to encode session token: {e}"))?;
        debug!("Issued session token {} for user {}", claims.jti, user.id);

        Ok(IssuedToken {
            token,
            expires_in: self.ttl.num_seconds(),
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = LEEWAY_SECONDS;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| anyhow!("Token validation failed: {e}"))
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
