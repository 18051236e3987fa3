use diesel::{
    r2d2::{ConnectionManager, Pool},
    PgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::core::config::DatabaseConfig;
use crate::core::shared::error::ApiError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(config: &DatabaseConfig) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(config.url.clone());
    Pool::builder().max_size(config.pool_size).build(manager)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("Applied migration {version}");
    }
    Ok(())
}

/// Runs blocking store work off the async executor.
pub async fn run_blocking<T, F>(context: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(context, e))?
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

/// Query-string filter where `?key=` means "no filter". Other values go
/// through `FromStr`.
pub fn empty_string_as_none<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    D: serde::Deserializer<'de>,
{
    let raw = <Option<String> as serde::Deserialize>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        id: Option<i32>,
        #[serde(default, deserialize_with = "double_option")]
        note: Option<Option<String>>,
    }

    #[test]
    fn test_empty_string_as_none() {
        let f: Filter = serde_json::from_str(r#"{"id": ""}"#).unwrap();
        assert_eq!(f.id, None);
        let f: Filter = serde_json::from_str(r#"{"id": " 12 "}"#).unwrap();
        assert_eq!(f.id, Some(12));
        let f: Filter = serde_json::from_str("{}").unwrap();
        assert_eq!(f.id, None);
        assert!(serde_json::from_str::<Filter>(r#"{"id": "x"}"#).is_err());
    }

    #[test]
    fn test_double_option_keeps_explicit_null() {
        let f: Filter = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(f.note, Some(None));
        let f: Filter = serde_json::from_str("{}").unwrap();
        assert_eq!(f.note, None);
    }
}
