// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use availability_cell::Slot;
use shared_models::auth::Role;

use crate::models::{Action, Appointment, AppointmentCommand, AppointmentError, AppointmentStatus};

/// Which roles may attempt each action. Ownership (a doctor's own
/// appointments, a patient's own bookings) is checked by the remote service.
const PERMISSIONS: &[(Action, &[Role])] = &[
    (Action::Book, &[Role::Patient, Role::Receptionist, Role::Admin]),
    (Action::Accept, &[Role::Doctor]),
    (Action::Reject, &[Role::Doctor]),
    (Action::SetStatus, &[Role::Admin]),
    (Action::Cancel, &[Role::Patient, Role::Receptionist, Role::Admin]),
    (Action::Reschedule, &[Role::Patient, Role::Receptionist, Role::Admin]),
    (Action::View, &Role::ALL),
    (Action::Search, &[Role::Admin, Role::Receptionist]),
    (Action::ListOwn, &[Role::Patient]),
    (Action::ListAssigned, &[Role::Doctor]),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn permits(&self, role: Role, action: Action) -> bool {
        PERMISSIONS
            .iter()
            .find(|(entry, _)| *entry == action)
            .is_some_and(|(_, roles)| roles.contains(&role))
    }

    pub fn authorize(&self, role: Role, action: Action) -> Result<(), AppointmentError> {
        if !self.permits(role, action) {
            warn!("Role {} attempted to {} without permission", role, action);
            return Err(AppointmentError::NotPermitted { role, action });
        }
        Ok(())
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status.is_terminal() {
            warn!("Status change attempted on terminal appointment ({})", current_status);
            return Err(AppointmentError::Terminal(*current_status));
        }

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Accepted,
                AppointmentStatus::Rejected,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Accepted => vec![
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            AppointmentStatus::Rejected => vec![],
            // Terminal states - no transitions allowed
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::Completed => vec![],
        }
    }

    /// Date/time changes are allowed on any non-terminal appointment; the
    /// status is left as it is.
    pub fn validate_reschedule(
        &self,
        appointment: &Appointment,
        new_time: &str,
    ) -> Result<Slot, AppointmentError> {
        if appointment.status.is_terminal() {
            warn!(
                "Reschedule attempted on appointment {} in terminal status {}",
                appointment.id, appointment.status
            );
            return Err(AppointmentError::Terminal(appointment.status));
        }

        Slot::parse(new_time)
            .ok_or_else(|| AppointmentError::ValidationError(format!("Invalid appointment time: {:?}", new_time)))
    }

    /// Full local check of a command: role first, then structural legality.
    /// Nothing here touches the network.
    pub fn validate_command(
        &self,
        appointment: &Appointment,
        command: &AppointmentCommand,
        role: Role,
    ) -> Result<(), AppointmentError> {
        self.authorize(role, command.action())?;

        match command {
            AppointmentCommand::Reschedule(request) => {
                self.validate_reschedule(appointment, &request.appointment_time)?;
            }
            other => {
                if let Some(target) = other.target_status() {
                    self.validate_status_transition(&appointment.status, &target)?;
                }
            }
        }

        Ok(())
    }
}
