use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::HashMap;

use crate::core::shared::schema::{equipment, maintenance_events};
use crate::core::shared::store::{MemoryStore, MemoryTables, PgStore, StoreError, StoreResult};
use crate::equipment::storage::DbEquipment;
use crate::equipment::types::{Equipment, EquipmentRef};

use super::types::{
    CreateEventRequest, EventDetail, EventFilter, EventRecord, EventType, MaintenanceEvent,
    UpdateEventRequest,
};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = maintenance_events, treat_none_as_null = true)]
pub struct DbEvent {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_type: EventType,
    pub equipment_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = maintenance_events)]
pub struct NewDbEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_type: EventType,
    pub equipment_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl NewDbEvent {
    pub fn new(req: CreateEventRequest, now: DateTime<Utc>) -> Self {
        Self {
            title: req.title.trim().to_string(),
            description: req.description.filter(|d| !d.is_empty()),
            event_date: req.event_date,
            event_type: req.event_type.unwrap_or_default(),
            equipment_id: req.equipment_id,
            created_at: now,
        }
    }

    fn into_row(self, id: i32) -> DbEvent {
        DbEvent {
            id,
            title: self.title,
            description: self.description,
            event_date: self.event_date,
            event_type: self.event_type,
            equipment_id: self.equipment_id,
            created_at: self.created_at,
        }
    }
}

impl From<DbEvent> for EventRecord {
    fn from(row: DbEvent) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            event_date: row.event_date,
            event_type: row.event_type,
            equipment_id: row.equipment_id,
            created_at: row.created_at,
        }
    }
}

fn apply_event_changes(row: &mut DbEvent, req: &UpdateEventRequest) {
    if let Some(title) = &req.title {
        row.title = title.trim().to_string();
    }
    if let Some(description) = &req.description {
        row.description = description.clone();
    }
    if let Some(event_date) = req.event_date {
        row.event_date = event_date;
    }
    if let Some(event_type) = req.event_type {
        row.event_type = event_type;
    }
    if let Some(equipment_id) = req.equipment_id {
        row.equipment_id = equipment_id;
    }
}

fn assemble_events(rows: Vec<DbEvent>, refs: &HashMap<i32, EquipmentRef>) -> Vec<MaintenanceEvent> {
    rows.into_iter()
        .map(|row| {
            let equipment = row.equipment_id.and_then(|id| refs.get(&id).cloned());
            MaintenanceEvent {
                record: row.into(),
                equipment,
            }
        })
        .collect()
}

pub trait EventStore {
    /// Matching events in date order.
    fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<MaintenanceEvent>>;
    fn get_event(&self, id: i32) -> StoreResult<EventDetail>;
    fn create_event(&self, req: CreateEventRequest, now: DateTime<Utc>)
        -> StoreResult<MaintenanceEvent>;
    fn update_event(&self, id: i32, req: &UpdateEventRequest) -> StoreResult<MaintenanceEvent>;
    fn delete_event(&self, id: i32) -> StoreResult<()>;
    /// Events dated at or after `now`.
    fn count_upcoming_events(&self, now: DateTime<Utc>) -> StoreResult<i64>;
}

fn load_event_refs(conn: &mut PgConnection, rows: Vec<DbEvent>) -> StoreResult<Vec<MaintenanceEvent>> {
    let ids: Vec<i32> = rows.iter().filter_map(|e| e.equipment_id).collect();
    let refs: HashMap<i32, EquipmentRef> = equipment::table
        .filter(equipment::id.eq_any(ids))
        .select(DbEquipment::as_select())
        .load::<DbEquipment>(conn)?
        .iter()
        .map(|e| (e.id, EquipmentRef::from(e)))
        .collect();
    Ok(assemble_events(rows, &refs))
}

fn check_event_equipment(conn: &mut PgConnection, equipment_id: Option<i32>) -> StoreResult<()> {
    if let Some(equipment_id) = equipment_id {
        let found: i64 = equipment::table
            .filter(equipment::id.eq(equipment_id))
            .count()
            .get_result(conn)?;
        if found == 0 {
            return Err(StoreError::Constraint("Equipment not found".to_string()));
        }
    }
    Ok(())
}

impl EventStore for PgStore {
    fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<MaintenanceEvent>> {
        let mut conn = self.conn()?;

        let mut db_query = maintenance_events::table.into_boxed();
        if let Some(from) = filter.from {
            db_query = db_query.filter(maintenance_events::event_date.ge(from));
        }
        if let Some(until) = filter.until {
            db_query = db_query.filter(maintenance_events::event_date.lt(until));
        }
        if let Some(event_type) = filter.event_type {
            db_query = db_query.filter(maintenance_events::event_type.eq(event_type));
        }

        let rows: Vec<DbEvent> = db_query
            .order((maintenance_events::event_date.asc(), maintenance_events::id.asc()))
            .select(DbEvent::as_select())
            .load(&mut conn)?;

        load_event_refs(&mut conn, rows)
    }

    fn get_event(&self, id: i32) -> StoreResult<EventDetail> {
        let mut conn = self.conn()?;

        let row: DbEvent = maintenance_events::table
            .find(id)
            .select(DbEvent::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound("Event"))?;

        let equipment_row = match row.equipment_id {
            Some(equipment_id) => equipment::table
                .find(equipment_id)
                .select(DbEquipment::as_select())
                .first(&mut conn)
                .optional()?,
            None => None,
        };

        Ok(EventDetail {
            record: row.into(),
            equipment: equipment_row.map(Equipment::from),
        })
    }

    fn create_event(
        &self,
        req: CreateEventRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<MaintenanceEvent> {
        let mut conn = self.conn()?;
        let new_event = NewDbEvent::new(req, now);

        conn.transaction::<_, StoreError, _>(|conn| {
            check_event_equipment(conn, new_event.equipment_id)?;
            let row: DbEvent = diesel::insert_into(maintenance_events::table)
                .values(&new_event)
                .returning(DbEvent::as_returning())
                .get_result(conn)?;
            load_event_refs(conn, vec![row])?
                .pop()
                .ok_or_else(|| StoreError::Backend("inserted event vanished".to_string()))
        })
    }

    fn update_event(&self, id: i32, req: &UpdateEventRequest) -> StoreResult<MaintenanceEvent> {
        let mut conn = self.conn()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let mut row: DbEvent = maintenance_events::table
                .find(id)
                .select(DbEvent::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(StoreError::NotFound("Event"))?;

            check_event_equipment(conn, req.equipment_id.flatten())?;
            apply_event_changes(&mut row, req);

            diesel::update(maintenance_events::table.find(id))
                .set(&row)
                .execute(conn)?;
            load_event_refs(conn, vec![row])?
                .pop()
                .ok_or(StoreError::NotFound("Event"))
        })
    }

    fn delete_event(&self, id: i32) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(maintenance_events::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(StoreError::NotFound("Event"));
        }
        Ok(())
    }

    fn count_upcoming_events(&self, now: DateTime<Utc>) -> StoreResult<i64> {
        let mut conn = self.conn()?;
        Ok(maintenance_events::table
            .filter(maintenance_events::event_date.ge(now))
            .count()
            .get_result(&mut conn)?)
    }
}

impl MemoryTables {
    fn event_refs(&self) -> HashMap<i32, EquipmentRef> {
        self.equipment
            .iter()
            .map(|e| (e.id, EquipmentRef::from(e)))
            .collect()
    }

    fn check_event_equipment(&self, equipment_id: Option<i32>) -> StoreResult<()> {
        match equipment_id {
            Some(id) if !self.equipment.iter().any(|e| e.id == id) => {
                Err(StoreError::Constraint("Equipment not found".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl EventStore for MemoryStore {
    fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<MaintenanceEvent>> {
        let tables = self.read()?;
        let mut rows: Vec<DbEvent> = tables
            .events
            .iter()
            .filter(|e| filter.matches(&EventRecord::from((*e).clone())))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));
        Ok(assemble_events(rows, &tables.event_refs()))
    }

    fn get_event(&self, id: i32) -> StoreResult<EventDetail> {
        let tables = self.read()?;
        let row = tables
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("Event"))?;
        let equipment_row = row
            .equipment_id
            .and_then(|eid| tables.equipment.iter().find(|e| e.id == eid).cloned());

        Ok(EventDetail {
            record: row.into(),
            equipment: equipment_row.map(Equipment::from),
        })
    }

    fn create_event(
        &self,
        req: CreateEventRequest,
        now: DateTime<Utc>,
    ) -> StoreResult<MaintenanceEvent> {
        let mut tables = self.write()?;
        let new_event = NewDbEvent::new(req, now);
        tables.check_event_equipment(new_event.equipment_id)?;

        let id = tables.next_event_id();
        let row = new_event.into_row(id);
        tables.events.push(row.clone());

        assemble_events(vec![row], &tables.event_refs())
            .pop()
            .ok_or_else(|| StoreError::Backend("inserted event vanished".to_string()))
    }

    fn update_event(&self, id: i32, req: &UpdateEventRequest) -> StoreResult<MaintenanceEvent> {
        let mut tables = self.write()?;
        tables.check_event_equipment(req.equipment_id.flatten())?;

        let row = tables
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound("Event"))?;
        apply_event_changes(row, req);
        let updated = row.clone();

        assemble_events(vec![updated], &tables.event_refs())
            .pop()
            .ok_or(StoreError::NotFound("Event"))
    }

    fn delete_event(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.write()?;
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        if tables.events.len() == before {
            return Err(StoreError::NotFound("Event"));
        }
        Ok(())
    }

    fn count_upcoming_events(&self, now: DateTime<Utc>) -> StoreResult<i64> {
        let tables = self.read()?;
        Ok(tables.events.iter().filter(|e| e.event_date >= now).count() as i64)
    }
}
