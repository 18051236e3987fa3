use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::shared::utils::empty_string_as_none;
use crate::tasks::types::TaskRecord;

pub use crate::core::shared::enums::EquipmentStatus;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
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

/// Narrow projection embedded in task and event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRef {
    pub id: i32,
    pub name: String,
    pub serial_number: String,
}

impl From<&Equipment> for EquipmentRef {
    fn from(equipment: &Equipment) -> Self {
        Self {
            id: equipment.id,
            name: equipment.name.clone(),
            serial_number: equipment.serial_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentSummary {
    #[serde(flatten)]
    pub equipment: Equipment,
    pub task_count: i64,
}

/// Equipment with its most recent tasks, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDetail {
    #[serde(flatten)]
    pub equipment: Equipment,
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EquipmentQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<EquipmentStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    /// Case-insensitive substring of the name or serial number.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
}

impl EquipmentQuery {
    pub fn matches(&self, equipment: &Equipment) -> bool {
        if self.status.is_some_and(|s| s != equipment.status) {
            return false;
        }
        if self
            .category
            .as_ref()
            .is_some_and(|c| *c != equipment.category)
        {
            return false;
        }
        match self.search.as_deref().map(str::to_lowercase) {
            Some(term) => {
                equipment.name.to_lowercase().contains(&term)
                    || equipment.serial_number.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateEquipmentRequest {
    pub name: String,
    pub description: Option<String>,
    pub serial_number: String,
    pub status: Option<EquipmentStatus>,
    pub category: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEquipmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub last_maintained: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pump() -> Equipment {
        let now = Utc::now();
        Equipment {
            id: 1,
            name: "Hydraulic Pump".into(),
            description: String::new(),
            serial_number: "HP-2041".into(),
            status: EquipmentStatus::MaintenanceRequired,
            category: "Hydraulics".into(),
            location: "Bay 3".into(),
            last_maintained: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_search_is_case_insensitive_on_name_and_serial() {
        let pump = pump();
        let by_name = EquipmentQuery {
            search: Some("hydraulic".into()),
            ..Default::default()
        };
        let by_serial = EquipmentQuery {
            search: Some("hp-20".into()),
            ..Default::default()
        };
        let miss = EquipmentQuery {
            search: Some("lathe".into()),
            ..Default::default()
        };
        assert!(by_name.matches(&pump));
        assert!(by_serial.matches(&pump));
        assert!(!miss.matches(&pump));
    }

    #[test]
    fn test_status_and_category_filters() {
        let pump = pump();
        let query = EquipmentQuery {
            status: Some(EquipmentStatus::Broken),
            ..Default::default()
        };
        assert!(!query.matches(&pump));
        let query = EquipmentQuery {
            status: Some(EquipmentStatus::MaintenanceRequired),
            category: Some("Hydraulics".into()),
            search: None,
        };
        assert!(query.matches(&pump));
    }

    #[test]
    fn test_summary_serializes_flat() {
        let summary = EquipmentSummary {
            equipment: pump(),
            task_count: 2,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["serialNumber"], "HP-2041");
        assert_eq!(json["status"], "Maintenance Required");
        assert_eq!(json["taskCount"], 2);
    }
}
