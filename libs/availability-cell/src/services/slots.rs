// libs/availability-cell/src/services/slots.rs
use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::models::{AvailabilityWindow, DayOfWeek, Slot};
use crate::services::time::{normalize_time, to_minutes};

/// Weekday names indexed Sunday-first, matching `num_days_from_sunday`.
pub const DAY_NAMES: [DayOfWeek; 7] = [
    DayOfWeek::Sunday,
    DayOfWeek::Monday,
    DayOfWeek::Tuesday,
    DayOfWeek::Wednesday,
    DayOfWeek::Thursday,
    DayOfWeek::Friday,
    DayOfWeek::Saturday,
];

pub fn weekday_of(date: NaiveDate) -> DayOfWeek {
    DAY_NAMES[date.weekday().num_days_from_sunday() as usize]
}

/// Parse a `YYYY-MM-DD` calendar date, `None` for anything else.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// All candidate slots for `date`, ascending and deduplicated.
///
/// An empty or unparseable date yields no slots.
pub fn generate_slots(windows: &[AvailabilityWindow], date: &str) -> Vec<Slot> {
    match parse_date(date) {
        Some(date) => generate_slots_for_date(windows, date),
        None => {
            debug!("Skipping slot generation for unparseable date {:?}", date);
            Vec::new()
        }
    }
}

pub fn generate_slots_for_date(windows: &[AvailabilityWindow], date: NaiveDate) -> Vec<Slot> {
    let day = weekday_of(date);

    let slots: BTreeSet<Slot> = windows
        .iter()
        .filter(|window| window.day_of_week == day)
        .flat_map(window_slots)
        .collect();

    debug!("Generated {} slots for {} ({})", slots.len(), date, day);
    slots.into_iter().collect()
}

/// Full-duration slots inside one window. Windows with a malformed time or a
/// missing/zero duration produce nothing, as do windows whose end is not after
/// their start (including ones that would cross midnight).
pub fn window_slots(window: &AvailabilityWindow) -> Vec<Slot> {
    let start = to_minutes(&normalize_time(&window.start_time));
    let end = to_minutes(&normalize_time(&window.end_time));
    let duration = window.slot_duration.filter(|duration| *duration > 0);

    let (Some(start), Some(end), Some(duration)) = (start, end, duration) else {
        debug!(
            "Skipping malformed availability window {:?}-{:?} ({:?} min)",
            window.start_time, window.end_time, window.slot_duration
        );
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut current = start;
    while let Some(next) = current.checked_add(duration).filter(|next| *next <= end) {
        slots.push(Slot::from_minutes(current));
        current = next;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_strings(slots: &[Slot]) -> Vec<&str> {
        slots.iter().map(Slot::as_str).collect()
    }

    // 2024-06-03 is a Monday.
    const MONDAY: &str = "2024-06-03";

    #[test]
    fn test_weekday_table_is_sunday_first() {
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()), DayOfWeek::Sunday);
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()), DayOfWeek::Monday);
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2024, 6, 8).unwrap()), DayOfWeek::Saturday);
    }

    #[test]
    fn test_only_full_slots_are_emitted() {
        let windows = vec![AvailabilityWindow::new(DayOfWeek::Monday, "09:00", "10:00", 25)];

        let slots = generate_slots(&windows, MONDAY);
        assert_eq!(slot_strings(&slots), vec!["09:00", "09:25"]);
    }

    #[test]
    fn test_slot_count_matches_floor_division() {
        for (start, end, duration) in [("08:00", "12:00", 30), ("09:00", "09:50", 20), ("13:15", "17:40", 45)] {
            let window = AvailabilityWindow::new(DayOfWeek::Monday, start, end, duration);
            let span = to_minutes(end).unwrap() - to_minutes(start).unwrap();
            assert_eq!(window_slots(&window).len() as u32, span / duration);
        }
    }

    #[test]
    fn test_windows_on_other_days_are_ignored() {
        let windows = vec![
            AvailabilityWindow::new(DayOfWeek::Tuesday, "09:00", "12:00", 30),
            AvailabilityWindow::new(DayOfWeek::Monday, "14:00", "15:00", 30),
        ];

        assert_eq!(slot_strings(&generate_slots(&windows, MONDAY)), vec!["14:00", "14:30"]);
        assert!(generate_slots(&windows, "2024-06-05").is_empty());
    }

    #[test]
    fn test_union_is_deduplicated_and_sorted() {
        let windows = vec![
            AvailabilityWindow::new(DayOfWeek::Monday, "13:00", "14:00", 30),
            AvailabilityWindow::new(DayOfWeek::Monday, "9:00", "10:00", 30),
            AvailabilityWindow::new(DayOfWeek::Monday, "09:30:00", "10:30:00", 30),
        ];

        let slots = generate_slots(&windows, MONDAY);
        assert_eq!(
            slot_strings(&slots),
            vec!["09:00", "09:30", "10:00", "13:00", "13:30"]
        );
    }

    #[test]
    fn test_empty_inputs_yield_nothing() {
        let windows = vec![AvailabilityWindow::new(DayOfWeek::Monday, "09:00", "10:00", 30)];

        assert!(generate_slots(&[], MONDAY).is_empty());
        assert!(generate_slots(&windows, "").is_empty());
        assert!(generate_slots(&windows, "not-a-date").is_empty());
        assert!(generate_slots(&windows, "2024-02-30").is_empty());
    }

    #[test]
    fn test_malformed_windows_are_skipped() {
        let no_duration = AvailabilityWindow::new(DayOfWeek::Monday, "09:00", "10:00", 0);
        let mut null_duration = no_duration.clone();
        null_duration.slot_duration = None;
        let blank_start = AvailabilityWindow::new(DayOfWeek::Monday, "", "10:00", 15);
        let garbage_end = AvailabilityWindow::new(DayOfWeek::Monday, "09:00", "late", 15);

        let windows = vec![
            no_duration,
            null_duration,
            blank_start,
            garbage_end,
            AvailabilityWindow::new(DayOfWeek::Monday, "16:00", "16:30", 15),
        ];

        assert_eq!(slot_strings(&generate_slots(&windows, MONDAY)), vec!["16:00", "16:15"]);
    }

    #[test]
    fn test_inverted_or_midnight_crossing_window_yields_nothing() {
        let inverted = AvailabilityWindow::new(DayOfWeek::Monday, "17:00", "09:00", 30);
        let overnight = AvailabilityWindow::new(DayOfWeek::Monday, "22:00", "02:00", 60);

        assert!(window_slots(&inverted).is_empty());
        assert!(window_slots(&overnight).is_empty());
    }

    #[test]
    fn test_duration_larger_than_window() {
        let window = AvailabilityWindow::new(DayOfWeek::Monday, "09:00", "09:20", 30);
        assert!(window_slots(&window).is_empty());

        let huge = AvailabilityWindow::new(DayOfWeek::Monday, "09:00", "10:00", u32::MAX);
        assert!(window_slots(&huge).is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let windows = vec![
            AvailabilityWindow::new(DayOfWeek::Monday, "09:00", "11:00", 20),
            AvailabilityWindow::new(DayOfWeek::Monday, "10:00", "12:00", 30),
        ];

        assert_eq!(generate_slots(&windows, MONDAY), generate_slots(&windows, MONDAY));
    }
}
