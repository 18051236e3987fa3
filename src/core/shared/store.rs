//! Persistence seam shared by every resource module.
//!
//! Each resource module (`tasks`, `equipment`, `calendar`, `users`) defines its
//! own store trait in its `storage.rs` and implements it twice: once for
//! [`PgStore`] (diesel over an r2d2 pool) and once for [`MemoryStore`]
//! (lock-guarded tables used by tests and the in-memory dev mode).

use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::PgConnection;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::calendar::storage::{DbEvent, EventStore};
use crate::core::shared::error::ApiError;
use crate::core::shared::utils::DbPool;
use crate::equipment::storage::{DbEquipment, EquipmentStore};
use crate::tasks::storage::{DbTask, TaskStore};
use crate::users::storage::{DbUser, UserStore};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Constraint(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => Self::NotFound("Record"),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for StoreError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Backend(format!("connection pool: {e}"))
    }
}

impl StoreError {
    /// Maps a store failure onto the HTTP taxonomy. Backend detail is logged
    /// and replaced by `context` in the client-visible message.
    pub fn into_api(self, context: &str) -> ApiError {
        match self {
            Self::NotFound(entity) => ApiError::NotFound(format!("{entity} not found")),
            Self::Conflict(msg) => ApiError::Conflict(msg),
            Self::Constraint(msg) => ApiError::InvalidArgument(msg),
            Self::Backend(detail) => ApiError::internal(context, detail),
        }
    }
}

pub trait StoreResultExt<T> {
    fn or_api(self, context: &str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn or_api(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| e.into_api(context))
    }
}

/// Everything the HTTP layer needs from persistence.
pub trait Store: TaskStore + EquipmentStore + EventStore + UserStore + Send + Sync {}

impl<T> Store for T where T: TaskStore + EquipmentStore + EventStore + UserStore + Send + Sync {}

pub type PgConn = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn conn(&self) -> StoreResult<PgConn> {
        Ok(self.pool.get()?)
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryTables {
    pub users: Vec<DbUser>,
    pub equipment: Vec<DbEquipment>,
    pub tasks: Vec<DbTask>,
    pub events: Vec<DbEvent>,
    user_seq: i32,
    equipment_seq: i32,
    task_seq: i32,
    event_seq: i32,
}

impl MemoryTables {
    pub fn next_user_id(&mut self) -> i32 {
        self.user_seq += 1;
        self.user_seq
    }

    pub fn next_equipment_id(&mut self) -> i32 {
        self.equipment_seq += 1;
        self.equipment_seq
    }

    pub fn next_task_id(&mut self) -> i32 {
        self.task_seq += 1;
        self.task_seq
    }

    pub fn next_event_id(&mut self) -> i32 {
        self.event_seq += 1;
        self.event_seq
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryTables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    pub(crate) fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryTables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}
