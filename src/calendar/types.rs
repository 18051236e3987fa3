use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::shared::utils::{double_option, empty_string_as_none};
use crate::equipment::types::{Equipment, EquipmentRef};

pub use crate::core::shared::enums::EventType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_type: EventType,
    pub equipment_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A scheduled maintenance entry with its equipment projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
    #[serde(flatten)]
    pub record: EventRecord,
    pub equipment: Option<EquipmentRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub record: EventRecord,
    pub equipment: Option<Equipment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub month: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub event_type: Option<EventType>,
}

/// Internal filter after query validation: a half-open `[from, until)` window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub event_type: Option<EventType>,
}

impl EventFilter {
    pub fn matches(&self, record: &EventRecord) -> bool {
        self.from.map_or(true, |from| record.event_date >= from)
            && self.until.map_or(true, |until| record.event_date < until)
            && self.event_type.map_or(true, |t| t == record.event_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_type: Option<EventType>,
    pub equipment_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_type: Option<EventType>,
    #[serde(default, deserialize_with = "double_option")]
    pub equipment_id: Option<Option<i32>>,
}
