use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::HashMap;

use crate::core::shared::schema::{equipment, maintenance_events, tasks};
use crate::core::shared::store::{MemoryStore, PgStore, StoreError, StoreResult};
use crate::tasks::storage::DbTask;
use crate::tasks::types::TaskRecord;

use super::types::{
    CreateEquipmentRequest, Equipment, EquipmentDetail, EquipmentQuery, EquipmentRef,
    EquipmentStatus, EquipmentSummary, UpdateEquipmentRequest, DEFAULT_CATEGORY,
};

/// Tasks embedded in an equipment detail view.
pub const RECENT_TASKS: usize = 5;

const DUPLICATE_SERIAL: &str = "Equipment with this serial number already exists";
const HAS_TASKS: &str = "Equipment has maintenance tasks and cannot be deleted";

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = equipment, treat_none_as_null = true)]
pub struct DbEquipment {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub serial_number: String,
    pub status: EquipmentStatus,
    pub category: String,
    pub location: String,
    pub last_maintained: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = equipment)]
pub struct NewDbEquipment {
    pub name: String,
    pub description: String,
    pub serial_number: String,
    pub status: EquipmentStatus,
    pub category: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewDbEquipment {
    pub fn new(req: CreateEquipmentRequest, now: DateTime<Utc>) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description.unwrap_or_default(),
            serial_number: req.serial_number.trim().to_string(),
            status: req.status.unwrap_or_default(),
            category: req
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            location: req.location.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn into_row(self, id: i32) -> DbEquipment {
        DbEquipment {
            id,
            name: self.name,
            description: self.description,
            serial_number: self.serial_number,
            status: self.status,
            category: self.category,
            location: self.location,
            last_maintained: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<DbEquipment> for Equipment {
    fn from(row: DbEquipment) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            serial_number: row.serial_number,
            status: row.status,
            category: row.category,
            location: row.location,
            last_maintained: row.last_maintained,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&DbEquipment> for EquipmentRef {
    fn from(row: &DbEquipment) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            serial_number: row.serial_number.clone(),
        }
    }
}

fn apply_equipment_changes(row: &mut DbEquipment, req: &UpdateEquipmentRequest, now: DateTime<Utc>) {
    if let Some(name) = &req.name {
        row.name = name.trim().to_string();
    }
    if let Some(description) = &req.description {
        row.description = description.clone();
    }
    if let Some(serial_number) = &req.serial_number {
        row.serial_number = serial_number.trim().to_string();
    }
    if let Some(status) = req.status {
        row.status = status;
    }
    if let Some(category) = &req.category {
        row.category = category.clone();
    }
    if let Some(location) = &req.location {
        row.location = location.clone();
    }
    if let Some(last_maintained) = req.last_maintained {
        row.last_maintained = Some(last_maintained);
    }
    row.updated_at = now;
}

pub trait EquipmentStore {
    /// Matching equipment with task counts, newest first.
    fn list_equipment(&self, query: &EquipmentQuery) -> StoreResult<Vec<EquipmentSummary>>;
    fn get_equipment(&self, id: i32) -> StoreResult<EquipmentDetail>;
    fn create_equipment(
        &self,
        req: CreateEquipmentRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Equipment>;
    fn update_equipment(
        &self,
        id: i32,
        req: &UpdateEquipmentRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Equipment>;
    /// Rejected while tasks reference the equipment; linked events are detached.
    fn delete_equipment(&self, id: i32) -> StoreResult<()>;
    fn equipment_status_counts(&self) -> StoreResult<Vec<(EquipmentStatus, i64)>>;
}

fn serial_taken(conn: &mut PgConnection, serial: &str, except: Option<i32>) -> StoreResult<bool> {
    let mut query = equipment::table
        .filter(equipment::serial_number.eq(serial.to_string()))
        .into_boxed();
    if let Some(id) = except {
        query = query.filter(equipment::id.ne(id));
    }
    let found: i64 = query.count().get_result(conn)?;
    Ok(found > 0)
}

/// `ILIKE` pattern matching `search` as a literal substring.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl EquipmentStore for PgStore {
    fn list_equipment(&self, query: &EquipmentQuery) -> StoreResult<Vec<EquipmentSummary>> {
        let mut conn = self.conn()?;

        let mut db_query = equipment::table.into_boxed();
        if let Some(status) = query.status {
            db_query = db_query.filter(equipment::status.eq(status));
        }
        if let Some(ref category) = query.category {
            db_query = db_query.filter(equipment::category.eq(category.clone()));
        }
        if let Some(ref search) = query.search {
            let term = contains_pattern(search);
            db_query = db_query.filter(
                equipment::name
                    .ilike(term.clone())
                    .or(equipment::serial_number.ilike(term)),
            );
        }

        let rows: Vec<DbEquipment> = db_query
            .order((equipment::created_at.desc(), equipment::id.desc()))
            .select(DbEquipment::as_select())
            .load(&mut conn)?;

        let ids: Vec<i32> = rows.iter().map(|e| e.id).collect();
        let counts: HashMap<i32, i64> = tasks::table
            .filter(tasks::equipment_id.eq_any(ids))
            .group_by(tasks::equipment_id)
            .select((tasks::equipment_id, diesel::dsl::count_star()))
            .load::<(i32, i64)>(&mut conn)?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let task_count = counts.get(&row.id).copied().unwrap_or(0);
                EquipmentSummary {
                    equipment: row.into(),
                    task_count,
                }
            })
            .collect())
    }

    fn get_equipment(&self, id: i32) -> StoreResult<EquipmentDetail> {
        let mut conn = self.conn()?;

        let row: DbEquipment = equipment::table
            .find(id)
            .select(DbEquipment::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound("Equipment"))?;

        let recent: Vec<DbTask> = tasks::table
            .filter(tasks::equipment_id.eq(id))
            .order((tasks::created_at.desc(), tasks::id.desc()))
            .limit(RECENT_TASKS as i64)
            .select(DbTask::as_select())
            .load(&mut conn)?;

        Ok(EquipmentDetail {
            equipment: row.into(),
            tasks: recent.into_iter().map(TaskRecord::from).collect(),
        })
    }

    fn create_equipment(
        &self,
        req: CreateEquipmentRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Equipment> {
        let mut conn = self.conn()?;
        let new_equipment = NewDbEquipment::new(req, now);

        conn.transaction::<_, StoreError, _>(|conn| {
            if serial_taken(conn, &new_equipment.serial_number, None)? {
                return Err(StoreError::Constraint(DUPLICATE_SERIAL.to_string()));
            }
            let row: DbEquipment = diesel::insert_into(equipment::table)
                .values(&new_equipment)
                .returning(DbEquipment::as_returning())
                .get_result(conn)?;
            Ok(row.into())
        })
    }

    fn update_equipment(
        &self,
        id: i32,
        req: &UpdateEquipmentRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Equipment> {
        let mut conn = self.conn()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let mut row: DbEquipment = equipment::table
                .find(id)
                .select(DbEquipment::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::NotFound("Equipment"))?;

            apply_equipment_changes(&mut row, req, now);
            if serial_taken(conn, &row.serial_number, Some(id))? {
                return Err(StoreError::Constraint(DUPLICATE_SERIAL.to_string()));
            }

            diesel::update(equipment::table.find(id))
                .set(&row)
                .execute(conn)?;
            Ok(row.into())
        })
    }

    fn delete_equipment(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let referencing: i64 = tasks::table
                .filter(tasks::equipment_id.eq(id))
                .count()
                .get_result(conn)?;
            if referencing > 0 {
                return Err(StoreError::Constraint(HAS_TASKS.to_string()));
            }

            diesel::update(maintenance_events::table.filter(maintenance_events::equipment_id.eq(id)))
                .set(maintenance_events::equipment_id.eq(None::<i32>))
                .execute(conn)?;

            let deleted = diesel::delete(equipment::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(StoreError::NotFound("Equipment"));
            }
            Ok(())
        })
    }

    fn equipment_status_counts(&self) -> StoreResult<Vec<(EquipmentStatus, i64)>> {
        let mut conn = self.conn()?;
        Ok(equipment::table
            .group_by(equipment::status)
            .select((equipment::status, diesel::dsl::count_star()))
            .load(&mut conn)?)
    }
}

impl EquipmentStore for MemoryStore {
    fn list_equipment(&self, query: &EquipmentQuery) -> StoreResult<Vec<EquipmentSummary>> {
        let tables = self.read()?;
        let mut rows: Vec<DbEquipment> = tables
            .equipment
            .iter()
            .filter(|e| query.matches(&Equipment::from((*e).clone())))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .map(|row| {
                let task_count = tables
                    .tasks
                    .iter()
                    .filter(|t| t.equipment_id == row.id)
                    .count() as i64;
                EquipmentSummary {
                    equipment: row.into(),
                    task_count,
                }
            })
            .collect())
    }

    fn get_equipment(&self, id: i32) -> StoreResult<EquipmentDetail> {
        let tables = self.read()?;
        let row = tables
            .equipment
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("Equipment"))?;

        let mut recent: Vec<DbTask> = tables
            .tasks
            .iter()
            .filter(|t| t.equipment_id == id)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        recent.truncate(RECENT_TASKS);

        Ok(EquipmentDetail {
            equipment: row.into(),
            tasks: recent.into_iter().map(TaskRecord::from).collect(),
        })
    }

    fn create_equipment(
        &self,
        req: CreateEquipmentRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Equipment> {
        let mut tables = self.write()?;
        let new_equipment = NewDbEquipment::new(req, now);
        if tables
            .equipment
            .iter()
            .any(|e| e.serial_number == new_equipment.serial_number)
        {
            return Err(StoreError::Constraint(DUPLICATE_SERIAL.to_string()));
        }

        let id = tables.next_equipment_id();
        let row = new_equipment.into_row(id);
        tables.equipment.push(row.clone());
        Ok(row.into())
    }

    fn update_equipment(
        &self,
        id: i32,
        req: &UpdateEquipmentRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<Equipment> {
        let mut tables = self.write()?;
        let mut updated = tables
            .equipment
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("Equipment"))?;
        apply_equipment_changes(&mut updated, req, now);

        if tables
            .equipment
            .iter()
            .any(|e| e.id != id && e.serial_number == updated.serial_number)
        {
            return Err(StoreError::Constraint(DUPLICATE_SERIAL.to_string()));
        }

        if let Some(row) = tables.equipment.iter_mut().find(|e| e.id == id) {
            *row = updated.clone();
        }
        Ok(updated.into())
    }

    fn delete_equipment(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.tasks.iter().any(|t| t.equipment_id == id) {
            return Err(StoreError::Constraint(HAS_TASKS.to_string()));
        }

        let before = tables.equipment.len();
        tables.equipment.retain(|e| e.id != id);
        if tables.equipment.len() == before {
            return Err(StoreError::NotFound("Equipment"));
        }

        for event in tables.events.iter_mut() {
            if event.equipment_id == Some(id) {
                event.equipment_id = None;
            }
        }
        Ok(())
    }

    fn equipment_status_counts(&self) -> StoreResult<Vec<(EquipmentStatus, i64)>> {
        let tables = self.read()?;
        Ok(EquipmentStatus::ALL
            .iter()
            .map(|status| {
                let count = tables
                    .equipment
                    .iter()
                    .filter(|e| e.status == *status)
                    .count() as i64;
                (*status, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}
