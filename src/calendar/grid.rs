//! Month date grid for the preventive-maintenance calendar.
//!
//! Weeks run Sunday to Saturday. Cells before the first and after the last day
//! of the month are `None`, so every week has exactly seven cells.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::types::MaintenanceEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub events: Vec<MaintenanceEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<Option<CalendarDay>>>,
}

fn first_of_next_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}

/// UTC `[start, end)` of a calendar month, or `None` for an invalid month.
pub fn month_window(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first_of_next_month(year, month)?;
    Some((
        Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?),
    ))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first_of_next_month(year, month)?;
    u32::try_from((next - first).num_days()).ok()
}

/// Lays `events` out on the month grid. Events outside the month are ignored.
pub fn build_month_grid(
    year: i32,
    month: u32,
    events: &[MaintenanceEvent],
) -> Option<MonthGrid> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let total_days = days_in_month(year, month)?;
    let leading = first.weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<Option<CalendarDay>> = vec![None; leading];
    for day in 1..=total_days {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let day_events = events
            .iter()
            .filter(|e| e.record.event_date.date_naive() == date)
            .cloned()
            .collect();
        cells.push(Some(CalendarDay {
            day,
            date,
            events: day_events,
        }));
    }
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    let weeks = cells.chunks(7).map(<[_]>::to_vec).collect();
    Some(MonthGrid { year, month, weeks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::types::{EventRecord, EventType};

    fn event(id: i32, date: DateTime<Utc>) -> MaintenanceEvent {
        MaintenanceEvent {
            record: EventRecord {
                id,
                title: format!("Inspection {id}"),
                description: None,
                event_date: date,
                event_type: EventType::Inspection,
                equipment_id: None,
                created_at: date,
            },
            equipment: None,
        }
    }

    #[test]
    fn test_month_window_wraps_december() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert!(month_window(2024, 13).is_none());
        assert!(month_window(2024, 0).is_none());
    }

    #[test]
    fn test_days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2025, 4), Some(30));
    }

    #[test]
    fn test_grid_is_sunday_first() {
        // March 2025 starts on a Saturday and has 31 days.
        let grid = build_month_grid(2025, 3, &[]).unwrap();
        assert_eq!(grid.weeks.len(), 6);
        assert!(grid.weeks.iter().all(|w| w.len() == 7));
        assert!(grid.weeks[0][..6].iter().all(Option::is_none));
        assert_eq!(grid.weeks[0][6].as_ref().map(|d| d.day), Some(1));
        assert_eq!(grid.weeks[5][1].as_ref().map(|d| d.day), Some(31));
        assert!(grid.weeks[5][2].is_none());
    }

    #[test]
    fn test_grid_exact_four_weeks() {
        // February 2015 starts on a Sunday with 28 days.
        let grid = build_month_grid(2015, 2, &[]).unwrap();
        assert_eq!(grid.weeks.len(), 4);
        assert!(grid.weeks.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn test_events_land_on_their_day() {
        let events = vec![
            event(1, Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap()),
            event(2, Utc.with_ymd_and_hms(2025, 3, 4, 15, 0, 0).unwrap()),
            event(3, Utc.with_ymd_and_hms(2025, 4, 4, 9, 0, 0).unwrap()),
        ];
        let grid = build_month_grid(2025, 3, &events).unwrap();
        let day4 = grid
            .weeks
            .iter()
            .flatten()
            .flatten()
            .find(|d| d.day == 4)
            .unwrap();
        let ids: Vec<i32> = day4.events.iter().map(|e| e.record.id).collect();
        assert_eq!(ids, vec![1, 2]);
        let total: usize = grid
            .weeks
            .iter()
            .flatten()
            .flatten()
            .map(|d| d.events.len())
            .sum();
        assert_eq!(total, 2);
    }
}
