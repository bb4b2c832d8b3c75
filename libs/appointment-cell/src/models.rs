// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use availability_cell::{AvailabilityError, Slot};
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_remote::RemoteError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_date: NaiveDate,
    #[serde(alias = "startTime")]
    pub appointment_time: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[serde(alias = "REQUESTED")]
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// No status change or reschedule is possible once an appointment is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "PENDING"),
            AppointmentStatus::Accepted => write!(f, "ACCEPTED"),
            AppointmentStatus::Rejected => write!(f, "REJECTED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==============================================================================
// ACTIONS AND COMMANDS
// ==============================================================================

/// Everything a session may attempt against appointments; each maps to a row
/// of the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Book,
    Accept,
    Reject,
    SetStatus,
    Cancel,
    Reschedule,
    View,
    Search,
    ListOwn,
    ListAssigned,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Book => write!(f, "book appointments"),
            Action::Accept => write!(f, "accept appointments"),
            Action::Reject => write!(f, "reject appointments"),
            Action::SetStatus => write!(f, "set appointment status"),
            Action::Cancel => write!(f, "cancel appointments"),
            Action::Reschedule => write!(f, "reschedule appointments"),
            Action::View => write!(f, "view appointments"),
            Action::Search => write!(f, "search appointments"),
            Action::ListOwn => write!(f, "list own appointments"),
            Action::ListAssigned => write!(f, "list assigned appointments"),
        }
    }
}

/// A lifecycle change requested against an existing appointment.
#[derive(Debug, Clone, PartialEq)]
pub enum AppointmentCommand {
    Accept,
    Reject,
    Cancel,
    SetStatus(AppointmentStatus),
    Reschedule(RescheduleAppointmentRequest),
}

impl AppointmentCommand {
    pub fn action(&self) -> Action {
        match self {
            AppointmentCommand::Accept => Action::Accept,
            AppointmentCommand::Reject => Action::Reject,
            AppointmentCommand::Cancel => Action::Cancel,
            AppointmentCommand::SetStatus(_) => Action::SetStatus,
            AppointmentCommand::Reschedule(_) => Action::Reschedule,
        }
    }

    /// The status this command moves the appointment to, `None` for reschedules.
    pub fn target_status(&self) -> Option<AppointmentStatus> {
        match self {
            AppointmentCommand::Accept => Some(AppointmentStatus::Accepted),
            AppointmentCommand::Reject => Some(AppointmentStatus::Rejected),
            AppointmentCommand::Cancel => Some(AppointmentStatus::Cancelled),
            AppointmentCommand::SetStatus(status) => Some(*status),
            AppointmentCommand::Reschedule(_) => None,
        }
    }

    /// Path segment of the remote endpoint, `PUT /appointments/{id}/{segment}`.
    pub fn remote_segment(&self) -> &'static str {
        match self {
            AppointmentCommand::Accept => "accept",
            AppointmentCommand::Reject => "reject",
            AppointmentCommand::Cancel => "cancel",
            AppointmentCommand::SetStatus(_) => "status",
            AppointmentCommand::Reschedule(_) => "reschedule",
        }
    }
}

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doctor_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

/// One page of the remote appointment search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedAppointments {
    #[serde(default)]
    pub data: Vec<Appointment>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSearchQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub status: Option<AppointmentStatus>,
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

impl AppointmentSearchQuery {
    /// Query pairs in the remote service's parameter names; unset filters are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(doctor_id) = self.doctor_id {
            pairs.push(("doctorId", doctor_id.to_string()));
        }
        if let Some(patient_id) = self.patient_id {
            pairs.push(("patientId", patient_id.to_string()));
        }
        if let Some(date) = self.date {
            pairs.push(("date", date.format("%Y-%m-%d").to_string()));
        }

        pairs
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorAppointmentsQuery {
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment is {0} and can no longer be changed")]
    Terminal(AppointmentStatus),

    #[error("Role {role} is not allowed to {action}")]
    NotPermitted { role: Role, action: Action },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    /// The remote service refused the change; `current` is the authoritative
    /// record fetched afterwards, if the re-read succeeded.
    #[error("{message}")]
    Rejected {
        message: String,
        current: Option<Box<Appointment>>,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl AppointmentError {
    /// True for failures decided locally, before any remote call was made.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppointmentError::InvalidTransition { .. }
                | AppointmentError::Terminal(_)
                | AppointmentError::NotPermitted { .. }
                | AppointmentError::ValidationError(_)
        )
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::InvalidTransition { .. } | AppointmentError::Terminal(_) => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::NotPermitted { .. } => AppError::Forbidden(err.to_string()),
            AppointmentError::ValidationError(message) => AppError::ValidationError(message),
            AppointmentError::Availability(e) => e.into(),
            AppointmentError::Rejected { message, current } => AppError::Rejected {
                message,
                current: current.and_then(|appointment| serde_json::to_value(*appointment).ok()),
            },
            AppointmentError::Remote(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_appointment_deserializes_remote_shape() {
        let appointment: Appointment = serde_json::from_value(json!({
            "id": 12,
            "patientId": 4,
            "doctorId": 7,
            "appointmentDate": "2024-06-03",
            "appointmentTime": "09:30:00",
            "status": "REQUESTED"
        }))
        .unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.appointment_time.as_str(), "09:30");
        assert_eq!(appointment.reason, None);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(AppointmentStatus::Pending).unwrap(), json!("PENDING"));
        assert_eq!(
            serde_json::from_value::<AppointmentStatus>(json!("CANCELLED")).unwrap(),
            AppointmentStatus::Cancelled
        );
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(!AppointmentStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_search_query_pairs_skip_unset_filters() {
        let query = AppointmentSearchQuery {
            page: Some(0),
            status: Some(AppointmentStatus::Accepted),
            doctor_id: Some(7),
            date: NaiveDate::from_ymd_opt(2024, 6, 3),
            ..Default::default()
        };

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("page", "0".to_string()),
                ("status", "ACCEPTED".to_string()),
                ("doctorId", "7".to_string()),
                ("date", "2024-06-03".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_mapping() {
        let local: AppError = AppointmentError::Terminal(AppointmentStatus::Cancelled).into();
        assert_matches!(local, AppError::BadRequest(_));

        let denied: AppError = AppointmentError::NotPermitted {
            role: Role::Patient,
            action: Action::Accept,
        }
        .into();
        assert_matches!(denied, AppError::Forbidden(ref message) if message.contains("PATIENT"));

        let rejected: AppError = AppointmentError::Rejected {
            message: "Time slot is already booked".to_string(),
            current: None,
        }
        .into();
        assert_matches!(rejected, AppError::Rejected { current: None, .. });
    }
}
