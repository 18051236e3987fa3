//! Credential hashing, session tokens and the request guard.

pub mod auth;
pub mod jwt;
pub mod password;

pub use auth::{require_auth, AuthenticatedUser};
pub use jwt::{extract_bearer_token, Claims, IssuedToken, SessionManager};
pub use password::{Argon2Config, PasswordHasher};
