//! Closed value sets stored as PostgreSQL `TEXT` columns.
//!
//! Each enum serializes to its display literal (`"In Progress"`, not
//! `"InProgress"`) on the wire and in the database, so rows written by other
//! tools stay readable. Unknown literals fail to parse with [`ParseEnumError`].

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                Ok(value.parse::<Self>()?)
            }
        }
    };
}

text_enum! {
    /// Lifecycle position of a maintenance task. Any status may follow any other.
    pub enum TaskStatus ("status") {
        New => "New",
        InProgress => "In Progress",
        Repaired => "Repaired",
        Scrap => "Scrap",
    }
}

impl TaskStatus {
    /// Repaired and Scrap stamp the completion date. They are not terminal in
    /// the graph sense; a finished task can be re-opened.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Repaired | Self::Scrap)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::New
    }
}

text_enum! {
    pub enum TaskPriority ("priority") {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Critical => "Critical",
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

text_enum! {
    /// Condition of a registered asset. Set by hand, never derived from tasks.
    pub enum EquipmentStatus ("equipment status") {
        Operational => "Operational",
        MaintenanceRequired => "Maintenance Required",
        Broken => "Broken",
    }
}

impl Default for EquipmentStatus {
    fn default() -> Self {
        Self::Operational
    }
}

text_enum! {
    pub enum EventType ("event type") {
        Preventive => "Preventive",
        Corrective => "Corrective",
        Inspection => "Inspection",
    }
}

impl Default for EventType {
    fn default() -> Self {
        Self::Preventive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_literals_parse_back() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(*status));
        }
        assert_eq!(TaskStatus::InProgress.to_string(), "In Progress");
        assert_eq!(
            "Maintenance Required".parse::<EquipmentStatus>(),
            Ok(EquipmentStatus::MaintenanceRequired)
        );
    }

    #[test]
    fn test_unknown_literal_rejected() {
        let err = "Urgent".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid status: Urgent");
        assert!("in progress".parse::<TaskStatus>().is_err());
        assert!("InProgress".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_display_literals() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let parsed: TaskPriority = serde_json::from_str("\"Critical\"").unwrap();
        assert_eq!(parsed, TaskPriority::Critical);
        assert!(serde_json::from_str::<TaskStatus>("\"Urgent\"").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Repaired.is_terminal());
        assert!(TaskStatus::Scrap.is_terminal());
        assert!(!TaskStatus::New.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::New);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(EquipmentStatus::default(), EquipmentStatus::Operational);
        assert_eq!(EventType::default(), EventType::Preventive);
    }
}
