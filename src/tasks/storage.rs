use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::HashMap;

use crate::core::shared::schema::{equipment, tasks, users};
use crate::core::shared::store::{
    MemoryStore, MemoryTables, PgStore, StoreError, StoreResult,
};
use crate::equipment::storage::DbEquipment;
use crate::equipment::types::{Equipment, EquipmentRef};
use crate::users::storage::DbUser;
use crate::users::types::{UserProfile, UserRef};

use super::types::{
    completion_after, CreateTaskRequest, Task, TaskChanges, TaskDetail, TaskPriority, TaskQuery,
    TaskRecord, TaskStatus, TaskTally, DEFAULT_TEAM,
};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = tasks, treat_none_as_null = true)]
pub struct DbTask {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub team: String,
    pub assigned_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub equipment_id: i32,
    pub user_id: Option<i32>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewDbTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub team: String,
    pub assigned_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub equipment_id: i32,
    pub user_id: Option<i32>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewDbTask {
    /// Fills creation defaults: New, Medium, the Maintenance team, version 1.
    pub fn new(req: CreateTaskRequest, now: DateTime<Utc>) -> Self {
        let status = req.status.unwrap_or_default();
        Self {
            title: req.title.trim().to_string(),
            description: req.description.unwrap_or_default(),
            status,
            priority: req.priority.unwrap_or_default(),
            team: req
                .team
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TEAM.to_string()),
            assigned_date: now,
            completion_date: completion_after(status, None, now),
            equipment_id: req.equipment_id,
            user_id: req.user_id,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn into_row(self, id: i32) -> DbTask {
        DbTask {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            team: self.team,
            assigned_date: self.assigned_date,
            completion_date: self.completion_date,
            equipment_id: self.equipment_id,
            user_id: self.user_id,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<DbTask> for TaskRecord {
    fn from(row: DbTask) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            team: row.team,
            assigned_date: row.assigned_date,
            completion_date: row.completion_date,
            equipment_id: row.equipment_id,
            user_id: row.user_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Applies `changes` to a locked row: version check, field updates, the
/// completion rule, then the version bump.
pub fn apply_changes(
    row: &mut DbTask,
    changes: &TaskChanges,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    if let Some(expected) = changes.expected_version {
        if expected != row.version {
            return Err(StoreError::Conflict(format!(
                "Task was modified concurrently (expected version {expected}, found {})",
                row.version
            )));
        }
    }

    if let Some(title) = &changes.title {
        row.title = title.trim().to_string();
    }
    if let Some(description) = &changes.description {
        row.description = description.clone();
    }
    if let Some(priority) = changes.priority {
        row.priority = priority;
    }
    if let Some(team) = &changes.team {
        row.team = team.clone();
    }
    if let Some(equipment_id) = changes.equipment_id {
        row.equipment_id = equipment_id;
    }
    if let Some(user_id) = changes.user_id {
        row.user_id = user_id;
    }
    if let Some(status) = changes.status {
        if changes.force_transition || status != row.status {
            row.completion_date = completion_after(status, row.completion_date, now);
        }
        row.status = status;
    }
    if let Some(completion_date) = changes.completion_date {
        row.completion_date = Some(completion_date);
    }

    row.version += 1;
    row.updated_at = now;
    Ok(())
}

fn assemble_task(
    row: DbTask,
    equipment: &HashMap<i32, EquipmentRef>,
    users: &HashMap<i32, UserRef>,
) -> StoreResult<Task> {
    let equipment_ref = equipment.get(&row.equipment_id).cloned().ok_or_else(|| {
        StoreError::Backend(format!(
            "task {} references missing equipment {}",
            row.id, row.equipment_id
        ))
    })?;
    let user = row.user_id.and_then(|id| users.get(&id).cloned());
    Ok(Task {
        record: row.into(),
        equipment: equipment_ref,
        user,
    })
}

pub trait TaskStore {
    /// Matching tasks, newest first.
    fn list_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;
    fn get_task(&self, id: i32) -> StoreResult<TaskDetail>;
    fn create_task(&self, req: CreateTaskRequest, now: DateTime<Utc>) -> StoreResult<Task>;
    fn update_task(&self, id: i32, changes: &TaskChanges, now: DateTime<Utc>)
        -> StoreResult<Task>;
    fn delete_task(&self, id: i32) -> StoreResult<()>;
    /// Task counts grouped by status, priority and team.
    fn task_tallies(&self) -> StoreResult<Vec<TaskTally>>;
    /// `(assigned, completed)` pairs of every task with a completion date.
    fn completion_spans(&self) -> StoreResult<Vec<(DateTime<Utc>, DateTime<Utc>)>>;
}

fn load_task_refs(conn: &mut PgConnection, rows: Vec<DbTask>) -> StoreResult<Vec<Task>> {
    let equipment_ids: Vec<i32> = rows.iter().map(|t| t.equipment_id).collect();
    let user_ids: Vec<i32> = rows.iter().filter_map(|t| t.user_id).collect();

    let equipment_refs: HashMap<i32, EquipmentRef> = equipment::table
        .filter(equipment::id.eq_any(equipment_ids))
        .select((equipment::id, equipment::name, equipment::serial_number))
        .load::<(i32, String, String)>(conn)?
        .into_iter()
        .map(|(id, name, serial_number)| {
            (
                id,
                EquipmentRef {
                    id,
                    name,
                    serial_number,
                },
            )
        })
        .collect();

    let user_refs: HashMap<i32, UserRef> = users::table
        .filter(users::id.eq_any(user_ids))
        .select((users::id, users::name, users::role))
        .load::<(i32, String, String)>(conn)?
        .into_iter()
        .map(|(id, name, role)| (id, UserRef { id, name, role }))
        .collect();

    rows.into_iter()
        .map(|row| assemble_task(row, &equipment_refs, &user_refs))
        .collect()
}

fn check_task_refs(
    conn: &mut PgConnection,
    equipment_id: Option<i32>,
    user_id: Option<i32>,
) -> StoreResult<()> {
    if let Some(equipment_id) = equipment_id {
        let found: i64 = equipment::table
            .filter(equipment::id.eq(equipment_id))
            .count()
            .get_result(conn)?;
        if found == 0 {
            return Err(StoreError::Constraint("Equipment not found".to_string()));
        }
    }
    if let Some(user_id) = user_id {
        let found: i64 = users::table
            .filter(users::id.eq(user_id))
            .count()
            .get_result(conn)?;
        if found == 0 {
            return Err(StoreError::Constraint("User not found".to_string()));
        }
    }
    Ok(())
}

impl TaskStore for PgStore {
    fn list_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let mut conn = self.conn()?;

        let mut db_query = tasks::table.into_boxed();
        if let Some(status) = query.status {
            db_query = db_query.filter(tasks::status.eq(status));
        }
        if let Some(priority) = query.priority {
            db_query = db_query.filter(tasks::priority.eq(priority));
        }
        if let Some(ref team) = query.team {
            db_query = db_query.filter(tasks::team.eq(team.clone()));
        }
        if let Some(equipment_id) = query.equipment_id {
            db_query = db_query.filter(tasks::equipment_id.eq(equipment_id));
        }
        if let Some(user_id) = query.user_id {
            db_query = db_query.filter(tasks::user_id.eq(user_id));
        }
        if let Some(limit) = query.limit {
            db_query = db_query.limit(limit as i64);
        }

        let rows: Vec<DbTask> = db_query
            .order((tasks::created_at.desc(), tasks::id.desc()))
            .select(DbTask::as_select())
            .load(&mut conn)?;

        load_task_refs(&mut conn, rows)
    }

    fn get_task(&self, id: i32) -> StoreResult<TaskDetail> {
        let mut conn = self.conn()?;

        let row: DbTask = tasks::table
            .find(id)
            .select(DbTask::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound("Task"))?;

        let equipment_row: DbEquipment = equipment::table
            .find(row.equipment_id)
            .select(DbEquipment::as_select())
            .first(&mut conn)?;

        let user = match row.user_id {
            Some(user_id) => users::table
                .find(user_id)
                .select(DbUser::as_select())
                .first(&mut conn)
                .optional()?
                .map(UserProfile::from),
            None => None,
        };

        Ok(TaskDetail {
            record: row.into(),
            equipment: Equipment::from(equipment_row),
            user,
        })
    }

    fn create_task(&self, req: CreateTaskRequest, now: DateTime<Utc>) -> StoreResult<Task> {
        let mut conn = self.conn()?;
        let new_task = NewDbTask::new(req, now);

        conn.transaction::<_, StoreError, _>(|conn| {
            check_task_refs(conn, Some(new_task.equipment_id), new_task.user_id)?;

            let row: DbTask = diesel::insert_into(tasks::table)
                .values(&new_task)
                .returning(DbTask::as_returning())
                .get_result(conn)?;

            load_task_refs(conn, vec![row])?
                .pop()
                .ok_or_else(|| StoreError::Backend("inserted task vanished".to_string()))
        })
    }

    fn update_task(
        &self,
        id: i32,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Task> {
        let mut conn = self.conn()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let mut row: DbTask = tasks::table
                .find(id)
                .select(DbTask::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::NotFound("Task"))?;

            check_task_refs(conn, changes.equipment_id, changes.user_id.flatten())?;
            apply_changes(&mut row, changes, now)?;

            diesel::update(tasks::table.find(id))
                .set(&row)
                .execute(conn)?;

            load_task_refs(conn, vec![row])?
                .pop()
                .ok_or(StoreError::NotFound("Task"))
        })
    }

    fn delete_task(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(tasks::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(StoreError::NotFound("Task"));
        }
        Ok(())
    }

    fn task_tallies(&self) -> StoreResult<Vec<TaskTally>> {
        let mut conn = self.conn()?;
        let rows: Vec<(TaskStatus, TaskPriority, String, i64)> = tasks::table
            .group_by((tasks::status, tasks::priority, tasks::team))
            .select((
                tasks::status,
                tasks::priority,
                tasks::team,
                diesel::dsl::count_star(),
            ))
            .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(status, priority, team, count)| TaskTally {
                status,
                priority,
                team,
                count,
            })
            .collect())
    }

    fn completion_spans(&self) -> StoreResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let mut conn = self.conn()?;
        let rows: Vec<(DateTime<Utc>, Option<DateTime<Utc>>)> = tasks::table
            .filter(tasks::completion_date.is_not_null())
            .select((tasks::assigned_date, tasks::completion_date))
            .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .filter_map(|(assigned, completed)| completed.map(|c| (assigned, c)))
            .collect())
    }
}

impl MemoryTables {
    fn task_refs(&self) -> (HashMap<i32, EquipmentRef>, HashMap<i32, UserRef>) {
        let equipment = self
            .equipment
            .iter()
            .map(|e| (e.id, EquipmentRef::from(e)))
            .collect();
        let users = self
            .users
            .iter()
            .map(|u| (u.id, UserRef::from(u)))
            .collect();
        (equipment, users)
    }

    pub(crate) fn assemble_tasks(&self, rows: Vec<DbTask>) -> StoreResult<Vec<Task>> {
        let (equipment, users) = self.task_refs();
        rows.into_iter()
            .map(|row| assemble_task(row, &equipment, &users))
            .collect()
    }

    fn check_task_refs(&self, equipment_id: Option<i32>, user_id: Option<i32>) -> StoreResult<()> {
        if let Some(equipment_id) = equipment_id {
            if !self.equipment.iter().any(|e| e.id == equipment_id) {
                return Err(StoreError::Constraint("Equipment not found".to_string()));
            }
        }
        if let Some(user_id) = user_id {
            if !self.users.iter().any(|u| u.id == user_id) {
                return Err(StoreError::Constraint("User not found".to_string()));
            }
        }
        Ok(())
    }

    /// Rows matching `query`, newest first.
    pub(crate) fn select_tasks(&self, query: &TaskQuery) -> Vec<DbTask> {
        let mut rows: Vec<DbTask> = self
            .tasks
            .iter()
            .filter(|t| query.matches(&TaskRecord::from((*t).clone())))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        rows
    }
}

impl TaskStore for MemoryStore {
    fn list_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let tables = self.read()?;
        let rows = tables.select_tasks(query);
        tables.assemble_tasks(rows)
    }

    fn get_task(&self, id: i32) -> StoreResult<TaskDetail> {
        let tables = self.read()?;
        let row = tables
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("Task"))?;
        let equipment_row = tables
            .equipment
            .iter()
            .find(|e| e.id == row.equipment_id)
            .cloned()
            .ok_or(StoreError::NotFound("Equipment"))?;
        let user = row.user_id.and_then(|user_id| {
            tables
                .users
                .iter()
                .find(|u| u.id == user_id)
                .cloned()
                .map(UserProfile::from)
        });

        Ok(TaskDetail {
            record: row.into(),
            equipment: Equipment::from(equipment_row),
            user,
        })
    }

    fn create_task(&self, req: CreateTaskRequest, now: DateTime<Utc>) -> StoreResult<Task> {
        let mut tables = self.write()?;
        let new_task = NewDbTask::new(req, now);
        tables.check_task_refs(Some(new_task.equipment_id), new_task.user_id)?;

        let id = tables.next_task_id();
        let row = new_task.into_row(id);
        tables.tasks.push(row.clone());

        tables
            .assemble_tasks(vec![row])?
            .pop()
            .ok_or_else(|| StoreError::Backend("inserted task vanished".to_string()))
    }

    fn update_task(
        &self,
        id: i32,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Task> {
        let mut tables = self.write()?;
        tables.check_task_refs(changes.equipment_id, changes.user_id.flatten())?;

        let row = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound("Task"))?;
        let mut updated = row.clone();
        apply_changes(&mut updated, changes, now)?;
        *row = updated.clone();

        tables
            .assemble_tasks(vec![updated])?
            .pop()
            .ok_or(StoreError::NotFound("Task"))
    }

    fn delete_task(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.write()?;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        if tables.tasks.len() == before {
            return Err(StoreError::NotFound("Task"));
        }
        Ok(())
    }

    fn task_tallies(&self) -> StoreResult<Vec<TaskTally>> {
        let tables = self.read()?;
        let mut groups: HashMap<(TaskStatus, TaskPriority, String), i64> = HashMap::new();
        for task in &tables.tasks {
            *groups
                .entry((task.status, task.priority, task.team.clone()))
                .or_default() += 1;
        }
        Ok(groups
            .into_iter()
            .map(|((status, priority, team), count)| TaskTally {
                status,
                priority,
                team,
                count,
            })
            .collect())
    }

    fn completion_spans(&self) -> StoreResult<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
        let tables = self.read()?;
        Ok(tables
            .tasks
            .iter()
            .filter_map(|t| t.completion_date.map(|c| (t.assigned_date, c)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::storage::EquipmentStore;
    use crate::equipment::types::CreateEquipmentRequest;
    use crate::tasks::types::UpdateTaskRequest;
    use chrono::Duration;

    fn store_with_equipment() -> (MemoryStore, i32) {
        let store = MemoryStore::new();
        let equipment = store
            .create_equipment(
                CreateEquipmentRequest {
                    name: "Conveyor A".into(),
                    description: None,
                    serial_number: "CV-001".into(),
                    status: None,
                    category: None,
                    location: None,
                },
                Utc::now(),
            )
            .unwrap();
        (store, equipment.id)
    }

    fn create(store: &MemoryStore, equipment_id: i32, title: &str) -> Task {
        store
            .create_task(
                CreateTaskRequest {
                    title: title.into(),
                    equipment_id,
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap()
    }

    #[test]
    fn test_create_applies_defaults() {
        let (store, equipment_id) = store_with_equipment();
        let task = create(&store, equipment_id, "Belt slipping");

        assert_eq!(task.record.status, TaskStatus::New);
        assert_eq!(task.record.priority, TaskPriority::Medium);
        assert_eq!(task.record.team, "Maintenance");
        assert_eq!(task.record.completion_date, None);
        assert_eq!(task.record.version, 1);
        assert_eq!(task.equipment.serial_number, "CV-001");
        assert!(task.user.is_none());
    }

    #[test]
    fn test_create_with_unknown_equipment_is_constraint() {
        let store = MemoryStore::new();
        let err = store
            .create_task(
                CreateTaskRequest {
                    title: "x".into(),
                    equipment_id: 42,
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(msg) if msg == "Equipment not found"));
    }

    #[test]
    fn test_transition_sets_and_retains_completion() {
        let (store, equipment_id) = store_with_equipment();
        let task = create(&store, equipment_id, "Motor hum");
        let t1 = Utc::now();

        let repaired = store
            .update_task(task.id(), &TaskChanges::transition(TaskStatus::Repaired, None), t1)
            .unwrap();
        assert_eq!(repaired.record.completion_date, Some(t1));
        assert_eq!(repaired.record.version, 2);

        let t2 = t1 + Duration::hours(1);
        let reopened = store
            .update_task(task.id(), &TaskChanges::transition(TaskStatus::New, None), t2)
            .unwrap();
        assert_eq!(reopened.record.status, TaskStatus::New);
        assert_eq!(reopened.record.completion_date, Some(t1));

        let again = store
            .update_task(task.id(), &TaskChanges::transition(TaskStatus::InProgress, None), t2)
            .unwrap();
        assert_eq!(again.record.completion_date, Some(t1));
    }

    #[test]
    fn test_stale_version_rejected_and_row_untouched() {
        let (store, equipment_id) = store_with_equipment();
        let task = create(&store, equipment_id, "Leak");

        let err = store
            .update_task(
                task.id(),
                &TaskChanges::transition(TaskStatus::Scrap, Some(7)),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = store.get_task(task.id()).unwrap();
        assert_eq!(stored.record.status, TaskStatus::New);
        assert_eq!(stored.record.version, 1);
    }

    #[test]
    fn test_non_status_edit_keeps_completion() {
        let (store, equipment_id) = store_with_equipment();
        let task = create(&store, equipment_id, "Sensor drift");
        let t1 = Utc::now();
        store
            .update_task(task.id(), &TaskChanges::transition(TaskStatus::Repaired, None), t1)
            .unwrap();

        let changes = TaskChanges {
            title: Some("Sensor drift (line 2)".into()),
            status: Some(TaskStatus::Repaired),
            ..Default::default()
        };
        let edited = store
            .update_task(task.id(), &changes, t1 + Duration::hours(2))
            .unwrap();
        assert_eq!(edited.record.title, "Sensor drift (line 2)");
        assert_eq!(edited.record.completion_date, Some(t1));
    }

    #[test]
    fn test_create_with_terminal_status_stamps_completion() {
        let (store, equipment_id) = store_with_equipment();
        let now = Utc::now();
        let task = store
            .create_task(
                CreateTaskRequest {
                    title: "Cracked housing".into(),
                    status: Some(TaskStatus::Scrap),
                    equipment_id,
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        assert_eq!(task.record.status, TaskStatus::Scrap);
        assert_eq!(task.record.completion_date, Some(now));
    }

    #[test]
    fn test_edit_changing_status_restamps_completion() {
        let (store, equipment_id) = store_with_equipment();
        let task = create(&store, equipment_id, "Valve stuck");
        let t1 = Utc::now();
        let edit = |status| {
            TaskChanges::from(UpdateTaskRequest {
                status: Some(status),
                ..Default::default()
            })
        };

        let repaired = store
            .update_task(task.id(), &edit(TaskStatus::Repaired), t1)
            .unwrap();
        assert_eq!(repaired.record.completion_date, Some(t1));

        let t2 = t1 + Duration::hours(3);
        let scrapped = store
            .update_task(task.id(), &edit(TaskStatus::Scrap), t2)
            .unwrap();
        assert_eq!(scrapped.record.status, TaskStatus::Scrap);
        assert_eq!(scrapped.record.completion_date, Some(t2));
    }

    #[test]
    fn test_explicit_completion_date_wins() {
        let (store, equipment_id) = store_with_equipment();
        let task = create(&store, equipment_id, "Gearbox noise");
        let now = Utc::now();
        let reported = now - Duration::days(2);

        let changes = TaskChanges::from(UpdateTaskRequest {
            status: Some(TaskStatus::Repaired),
            completion_date: Some(reported),
            ..Default::default()
        });
        let updated = store.update_task(task.id(), &changes, now).unwrap();
        assert_eq!(updated.record.status, TaskStatus::Repaired);
        assert_eq!(updated.record.completion_date, Some(reported));
    }

    #[test]
    fn test_list_is_newest_first_and_filtered() {
        let (store, equipment_id) = store_with_equipment();
        let first = create(&store, equipment_id, "first");
        let second = create(&store, equipment_id, "second");
        store
            .update_task(
                first.id(),
                &TaskChanges::transition(TaskStatus::InProgress, None),
                Utc::now(),
            )
            .unwrap();

        let all = store.list_tasks(&TaskQuery::default()).unwrap();
        let ids: Vec<i32> = all.iter().map(Task::id).collect();
        assert_eq!(ids, vec![second.id(), first.id()]);

        let in_progress = store
            .list_tasks(&TaskQuery {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id(), first.id());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.delete_task(3), Err(StoreError::NotFound("Task"))));
    }

    #[test]
    fn test_tallies_group_counts() {
        let (store, equipment_id) = store_with_equipment();
        create(&store, equipment_id, "a");
        create(&store, equipment_id, "b");
        let tallies = store.task_tallies().unwrap();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].count, 2);
        assert_eq!(tallies[0].team, "Maintenance");
    }
}
