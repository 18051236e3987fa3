use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::core::shared::schema::{tasks, users};
use crate::core::shared::store::{MemoryStore, PgStore, StoreError, StoreResult};
use crate::tasks::storage::DbTask;
use crate::tasks::types::TaskRecord;

use super::types::{
    normalize_email, RegisterRequest, UpdateUserRequest, UserCredentials, UserDetail,
    UserProfile, UserRef, UserSummary, DEFAULT_ROLE,
};

const DUPLICATE_EMAIL: &str = "User with this email already exists";

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = users)]
pub struct DbUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewDbUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewDbUser {
    /// `password_hash` must already be an argon2 PHC string.
    pub fn new(req: RegisterRequest, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            password_hash,
            role: req
                .role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn into_row(self, id: i32) -> DbUser {
        DbUser {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<DbUser> for UserProfile {
    fn from(row: DbUser) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

impl From<&DbUser> for UserRef {
    fn from(row: &DbUser) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            role: row.role.clone(),
        }
    }
}

impl From<DbUser> for UserCredentials {
    fn from(row: DbUser) -> Self {
        let password_hash = row.password_hash.clone();
        Self {
            profile: row.into(),
            password_hash,
        }
    }
}

fn apply_user_changes(row: &mut DbUser, req: &UpdateUserRequest, now: DateTime<Utc>) {
    if let Some(name) = &req.name {
        row.name = name.trim().to_string();
    }
    if let Some(email) = &req.email {
        row.email = normalize_email(email);
    }
    if let Some(role) = &req.role {
        row.role = role.clone();
    }
    row.updated_at = now;
}

pub trait UserStore {
    fn register_user(&self, user: NewDbUser) -> StoreResult<UserProfile>;
    /// Looks up an account by normalized email for login.
    fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>>;
    fn list_users(&self) -> StoreResult<Vec<UserSummary>>;
    fn get_user(&self, id: i32) -> StoreResult<UserDetail>;
    fn update_user(
        &self,
        id: i32,
        req: &UpdateUserRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<UserProfile>;
    /// Deletes the account and unassigns its tasks.
    fn delete_user(&self, id: i32) -> StoreResult<()>;
    fn count_users(&self) -> StoreResult<i64>;
}

fn email_taken(conn: &mut PgConnection, email: &str, except: Option<i32>) -> StoreResult<bool> {
    let mut query = users::table
        .filter(users::email.eq(email.to_string()))
        .into_boxed();
    if let Some(id) = except {
        query = query.filter(users::id.ne(id));
    }
    let found: i64 = query.count().get_result(conn)?;
    Ok(found > 0)
}

impl UserStore for PgStore {
    fn register_user(&self, user: NewDbUser) -> StoreResult<UserProfile> {
        let mut conn = self.conn()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            if email_taken(conn, &user.email, None)? {
                return Err(StoreError::Constraint(DUPLICATE_EMAIL.to_string()));
            }
            let row: DbUser = diesel::insert_into(users::table)
                .values(&user)
                .returning(DbUser::as_returning())
                .get_result(conn)?;
            Ok(row.into())
        })
    }

    fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let mut conn = self.conn()?;
        let row: Option<DbUser> = users::table
            .filter(users::email.eq(normalize_email(email)))
            .select(DbUser::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(UserCredentials::from))
    }

    fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let mut conn = self.conn()?;

        let rows: Vec<DbUser> = users::table
            .order(users::id.asc())
            .select(DbUser::as_select())
            .load(&mut conn)?;

        let counts: std::collections::HashMap<i32, i64> = tasks::table
            .filter(tasks::user_id.is_not_null())
            .group_by(tasks::user_id)
            .select((tasks::user_id, diesel::dsl::count_star()))
            .load::<(Option<i32>, i64)>(&mut conn)?
            .into_iter()
            .filter_map(|(user_id, count)| user_id.map(|id| (id, count)))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let task_count = counts.get(&row.id).copied().unwrap_or(0);
                UserSummary {
                    user: row.into(),
                    task_count,
                }
            })
            .collect())
    }

    fn get_user(&self, id: i32) -> StoreResult<UserDetail> {
        let mut conn = self.conn()?;

        let row: DbUser = users::table
            .find(id)
            .select(DbUser::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound("User"))?;

        let assigned: Vec<DbTask> = tasks::table
            .filter(tasks::user_id.eq(id))
            .order((tasks::created_at.desc(), tasks::id.desc()))
            .select(DbTask::as_select())
            .load(&mut conn)?;

        Ok(UserDetail {
            user: row.into(),
            tasks: assigned.into_iter().map(TaskRecord::from).collect(),
        })
    }

    fn update_user(
        &self,
        id: i32,
        req: &UpdateUserRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<UserProfile> {
        let mut conn = self.conn()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let mut row: DbUser = users::table
                .find(id)
                .select(DbUser::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::NotFound("User"))?;

            apply_user_changes(&mut row, req, now);
            if email_taken(conn, &row.email, Some(id))? {
                return Err(StoreError::Constraint(DUPLICATE_EMAIL.to_string()));
            }

            diesel::update(users::table.find(id)).set(&row).execute(conn)?;
            Ok(row.into())
        })
    }

    fn delete_user(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        // tasks.user_id is ON DELETE SET NULL
        let deleted = diesel::delete(users::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    fn count_users(&self) -> StoreResult<i64> {
        let mut conn = self.conn()?;
        Ok(users::table.count().get_result(&mut conn)?)
    }
}

impl UserStore for MemoryStore {
    fn register_user(&self, user: NewDbUser) -> StoreResult<UserProfile> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Constraint(DUPLICATE_EMAIL.to_string()));
        }
        let id = tables.next_user_id();
        let row = user.into_row(id);
        tables.users.push(row.clone());
        Ok(row.into())
    }

    fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let tables = self.read()?;
        let email = normalize_email(email);
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .map(UserCredentials::from))
    }

    fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let tables = self.read()?;
        let mut rows = tables.users.clone();
        rows.sort_by_key(|u| u.id);
        Ok(rows
            .into_iter()
            .map(|row| {
                let task_count = tables
                    .tasks
                    .iter()
                    .filter(|t| t.user_id == Some(row.id))
                    .count() as i64;
                UserSummary {
                    user: row.into(),
                    task_count,
                }
            })
            .collect())
    }

    fn get_user(&self, id: i32) -> StoreResult<UserDetail> {
        let tables = self.read()?;
        let row = tables
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))?;
        let mut assigned: Vec<DbTask> = tables
            .tasks
            .iter()
            .filter(|t| t.user_id == Some(id))
            .cloned()
            .collect();
        assigned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(UserDetail {
            user: row.into(),
            tasks: assigned.into_iter().map(TaskRecord::from).collect(),
        })
    }

    fn update_user(
        &self,
        id: i32,
        req: &UpdateUserRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<UserProfile> {
        let mut tables = self.write()?;
        let mut updated = tables
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))?;
        apply_user_changes(&mut updated, req, now);

        if tables
            .users
            .iter()
            .any(|u| u.id != id && u.email == updated.email)
        {
            return Err(StoreError::Constraint(DUPLICATE_EMAIL.to_string()));
        }
        if let Some(row) = tables.users.iter_mut().find(|u| u.id == id) {
            *row = updated.clone();
        }
        Ok(updated.into())
    }

    fn delete_user(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.write()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(StoreError::NotFound("User"));
        }
        for task in tables.tasks.iter_mut() {
            if task.user_id == Some(id) {
                task.user_id = None;
            }
        }
        Ok(())
    }

    fn count_users(&self) -> StoreResult<i64> {
        Ok(self.read()?.users.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::storage::EquipmentStore;
    use crate::equipment::types::CreateEquipmentRequest;
    use crate::tasks::storage::TaskStore;
    use crate::tasks::types::CreateTaskRequest;

    fn new_user(name: &str, email: &str) -> NewDbUser {
        NewDbUser::new(
            RegisterRequest {
                name: name.into(),
                email: email.into(),
                password: "ignored-here".into(),
                role: None,
            },
            "$argon2id$stub".into(),
            Utc::now(),
        )
    }

    #[test]
    fn test_register_normalizes_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let ana = store.register_user(new_user("Ana", "Ana@Plant.io")).unwrap();
        assert_eq!(ana.email, "ana@plant.io");
        assert_eq!(ana.role, "Technician");

        let err = store
            .register_user(new_user("Ana again", "ana@plant.io "))
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(msg) if msg == DUPLICATE_EMAIL));

        let creds = store.find_credentials("ANA@plant.io").unwrap().unwrap();
        assert_eq!(creds.profile.id, ana.id);
        assert_eq!(creds.password_hash, "$argon2id$stub");
    }

    #[test]
    fn test_delete_unassigns_tasks() {
        let store = MemoryStore::new();
        let ana = store.register_user(new_user("Ana", "ana@plant.io")).unwrap();
        let press = store
            .create_equipment(
                CreateEquipmentRequest {
                    name: "Press".into(),
                    description: None,
                    serial_number: "PR-1".into(),
                    status: None,
                    category: None,
                    location: None,
                },
                Utc::now(),
            )
            .unwrap();
        let task = store
            .create_task(
                CreateTaskRequest {
                    title: "Calibrate".into(),
                    equipment_id: press.id,
                    user_id: Some(ana.id),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(task.user.as_ref().map(|u| u.name.as_str()), Some("Ana"));
        assert_eq!(store.list_users().unwrap()[0].task_count, 1);

        store.delete_user(ana.id).unwrap();
        let detail = store.get_task(task.id()).unwrap();
        assert_eq!(detail.record.user_id, None);
        assert!(detail.user.is_none());
        assert_eq!(store.count_users().unwrap(), 0);
    }
}
