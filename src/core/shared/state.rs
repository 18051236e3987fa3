use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::shared::store::Store;
use crate::security::jwt::SessionManager;
use crate::security::password::PasswordHasher;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionManager>,
    pub passwords: PasswordHasher,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        sessions: Arc<SessionManager>,
        passwords: PasswordHasher,
    ) -> Self {
        Self {
            config,
            store,
            sessions,
            passwords,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
