//! Layered configuration.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `gearguard.toml` in the working directory
//! 3. `GEARGUARD_*` environment variables (`__` separates sections, e.g.
//!    `GEARGUARD_SERVER__PORT`)
//! 4. The conventional `DATABASE_URL`, `JWT_SECRET` and `PORT` variables

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "gearguard.toml";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    /// Serve from the in-process store instead of PostgreSQL.
    pub in_memory: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/gearguard".to_string(),
            pool_size: 10,
            in_memory: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Empty means "generate one at start-up".
    pub jwt_secret: String,
    pub issuer: String,
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "gearguard".to_string(),
            token_ttl_minutes: 24 * 60,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let local_path = PathBuf::from(CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
            .merge(Env::prefixed("GEARGUARD_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "auth.jwt_secret".into()))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = &self.auth.jwt_secret;
        if !secret.is_empty() && secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                field: "auth.jwt_secret".to_string(),
                reason: format!("must be at least {MIN_SECRET_LEN} characters"),
            });
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_ttl_minutes".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.pool_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.database.pool_size, 10);
        assert!(!config.database.in_memory);
        assert!(config.auth.jwt_secret.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [server]
                host = "127.0.0.1"
                port = 7000

                [database]
                in_memory = true
                "#,
            )?;
            jail.set_env("GEARGUARD_SERVER__PORT", "7100");
            jail.set_env("DATABASE_URL", "postgres://db.internal/gg");

            let config: AppConfig = AppConfig::figment().extract()?;
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 7100);
            assert!(config.database.in_memory);
            assert_eq!(config.database.url, "postgres://db.internal/gg");
            Ok(())
        });
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "too-short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
