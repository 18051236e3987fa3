use anyhow::{Context, Result};
use log::{info, warn};
use std::sync::Arc;

use gearguard::core::config::AppConfig;
use gearguard::core::shared::state::AppState;
use gearguard::core::shared::store::{MemoryStore, PgStore, Store};
use gearguard::core::shared::utils::{create_conn, run_migrations};
use gearguard::main_module::run_server;
use gearguard::security::{PasswordHasher, SessionManager};

fn build_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
    if config.database.in_memory {
        warn!("Running on the in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = create_conn(&config.database).context("Failed to create database pool")?;
    run_migrations(&pool).map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    info!("Database ready");
    Ok(Arc::new(PgStore::new(pool)))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let mut config = AppConfig::load_with_dotenv()?;
    if config.auth.jwt_secret.is_empty() {
        warn!("JWT_SECRET not set, using a random development secret - sessions end on restart");
        config.auth.jwt_secret = SessionManager::generate_dev_secret();
    }

    let sessions = SessionManager::from_config(&config.auth)?;
    let passwords = PasswordHasher::with_defaults()?;
    let store = tokio::task::spawn_blocking({
        let config = config.clone();
        move || build_store(&config)
    })
    .await??;

    info!("Starting gearguard {}", env!("CARGO_PKG_VERSION"));
    let state = Arc::new(AppState::new(config, store, Arc::new(sessions), passwords));
    run_server(state).await?;
    info!("Server stopped");
    Ok(())
}
