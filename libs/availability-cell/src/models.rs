// libs/availability-cell/src/models.rs
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use shared_remote::RemoteError;

use crate::services::time::{from_minutes, normalize_time, to_minutes};

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOfWeek::Sunday => write!(f, "SUNDAY"),
            DayOfWeek::Monday => write!(f, "MONDAY"),
            DayOfWeek::Tuesday => write!(f, "TUESDAY"),
            DayOfWeek::Wednesday => write!(f, "WEDNESDAY"),
            DayOfWeek::Thursday => write!(f, "THURSDAY"),
            DayOfWeek::Friday => write!(f, "FRIDAY"),
            DayOfWeek::Saturday => write!(f, "SATURDAY"),
        }
    }
}

/// One recurring weekly block during which a doctor accepts appointments.
///
/// Times are kept as the raw strings the hospital service sends (`09:00:00`,
/// `9:0`, ...); they are normalized when slots are generated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    pub day_of_week: DayOfWeek,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_time: String,
    #[serde(default)]
    pub slot_duration: Option<u32>,
}

impl AvailabilityWindow {
    pub fn new(day_of_week: DayOfWeek, start_time: &str, end_time: &str, slot_duration: u32) -> Self {
        Self {
            id: None,
            doctor_id: None,
            day_of_week,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            slot_duration: Some(slot_duration),
        }
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// A bookable start time, always `HH:MM` zero-padded so that string order is
/// chronological order within a day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slot(String);

impl Slot {
    /// Normalize a raw time string; `None` when it is not a valid time of day.
    pub fn parse(raw: &str) -> Option<Slot> {
        to_minutes(raw)?;
        Some(Slot(normalize_time(raw)))
    }

    pub fn from_minutes(minutes: u32) -> Slot {
        Slot(from_minutes(minutes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slot::parse(&value).ok_or_else(|| format!("invalid time of day: {:?}", value))
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotOption {
    pub time: Slot,
    pub selectable: bool,
}

/// The full theoretical grid for one doctor and date, each entry marked selectable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotGrid {
    pub doctor_id: i64,
    pub date: Option<NaiveDate>,
    pub slots: Vec<SlotOption>,
}

impl SlotGrid {
    pub fn empty(doctor_id: i64, date: Option<NaiveDate>) -> Self {
        Self {
            doctor_id,
            date,
            slots: Vec::new(),
        }
    }

    pub fn selectable_count(&self) -> usize {
        self.slots.iter().filter(|option| option.selectable).count()
    }
}

/// Remote response for the bookable slots of one doctor and date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsResponse {
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slots: Vec<Option<String>>,
}

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Selected time {0} is not available")]
    SlotNotSelectable(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::SlotNotSelectable(slot) => {
                AppError::BadRequest(format!("Selected time {} is not available", slot))
            }
            AvailabilityError::Remote(remote) => remote.into(),
        }
    }
}
