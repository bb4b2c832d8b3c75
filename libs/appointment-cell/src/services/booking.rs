// libs/appointment-cell/src/services/booking.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, error, info, warn};

use availability_cell::AvailabilityService;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_remote::{HospitalApiClient, RemoteError};

use crate::models::{
    Action, Appointment, AppointmentCommand, AppointmentError, AppointmentSearchQuery,
    BookAppointmentRequest, PagedAppointments,
};
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct AppointmentBookingService {
    api: HospitalApiClient,
    availability: AvailabilityService,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let api = HospitalApiClient::new(config);
        Self {
            availability: AvailabilityService::with_client(api.clone()),
            api,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Create a PENDING appointment. Patients always book for themselves, so any
    /// `patient_id` they send is dropped; staff must name the patient. The time
    /// must be in the latest bookable set for the doctor and date.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        role: Role,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking request from {} for doctor {} on {} at {}",
            role, request.doctor_id, request.appointment_date, request.appointment_time
        );

        self.lifecycle.authorize(role, Action::Book)?;

        let patient_id = match role {
            Role::Patient => None,
            _ => Some(request.patient_id.ok_or_else(|| {
                AppointmentError::ValidationError("Patient id is required when booking for a patient".to_string())
            })?),
        };

        let slot = self
            .availability
            .ensure_bookable(
                request.doctor_id,
                request.appointment_date,
                &request.appointment_time,
                auth_token,
            )
            .await?;

        let body = BookAppointmentRequest {
            patient_id,
            appointment_time: slot.to_string(),
            ..request
        };

        let appointment: Appointment = self
            .api
            .request(Method::POST, "/appointments/book", Some(auth_token), Some(json!(body)))
            .await?;

        info!(
            "Appointment {} booked with doctor {} on {} at {}",
            appointment.id, appointment.doctor_id, appointment.appointment_date, appointment.appointment_time
        );

        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: i64,
        role: Role,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle.authorize(role, Action::View)?;
        Ok(self.fetch_appointment(appointment_id, auth_token).await?)
    }

    pub async fn get_my_appointments(
        &self,
        role: Role,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.lifecycle.authorize(role, Action::ListOwn)?;

        let appointments: Vec<Appointment> = self
            .api
            .request(Method::GET, "/appointments/my", Some(auth_token), None)
            .await?;

        Ok(appointments)
    }

    /// The calling doctor's appointments, narrowed to one date when given.
    pub async fn get_doctor_appointments(
        &self,
        role: Role,
        date: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.lifecycle.authorize(role, Action::ListAssigned)?;

        let appointments: Vec<Appointment> = self
            .api
            .request(Method::GET, "/appointments/doctor", Some(auth_token), None)
            .await?;

        Ok(match date {
            Some(date) => appointments
                .into_iter()
                .filter(|appointment| appointment.appointment_date == date)
                .collect(),
            None => appointments,
        })
    }

    pub async fn search_appointments(
        &self,
        role: Role,
        query: &AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<PagedAppointments, AppointmentError> {
        self.lifecycle.authorize(role, Action::Search)?;

        let page: PagedAppointments = self
            .api
            .request_with_query(Method::GET, "/appointments", &query.to_query_pairs(), Some(auth_token), None)
            .await?;

        debug!(
            "Appointment search returned {} of {} (page {}/{})",
            page.data.len(),
            page.total_items,
            page.current_page,
            page.total_pages
        );

        Ok(page)
    }

    /// Apply a lifecycle command to `appointment`.
    ///
    /// Local validation runs first and fails without any network call. On
    /// success `appointment` becomes the record the remote service returned.
    /// When the remote service refuses, `appointment` is replaced by a fresh
    /// read of the authoritative record and the refusal is returned; transport
    /// failures leave it untouched.
    pub async fn perform(
        &self,
        appointment: &mut Appointment,
        command: AppointmentCommand,
        role: Role,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        debug!("{} requested {:?} on appointment {}", role, command, appointment.id);

        self.lifecycle.validate_command(appointment, &command, role)?;

        let body = match &command {
            AppointmentCommand::Reschedule(request) => {
                let slot = self
                    .availability
                    .ensure_bookable(
                        appointment.doctor_id,
                        request.appointment_date,
                        &request.appointment_time,
                        auth_token,
                    )
                    .await?;

                Some(json!({
                    "appointmentDate": request.appointment_date,
                    "startTime": slot,
                }))
            }
            AppointmentCommand::SetStatus(status) => Some(json!({ "status": status })),
            _ => None,
        };

        let path = format!("/appointments/{}/{}", appointment.id, command.remote_segment());
        let result: Result<Appointment, RemoteError> =
            self.api.request(Method::PUT, &path, Some(auth_token), body).await;

        match result {
            Ok(updated) => {
                info!(
                    "Appointment {} {} -> {} ({} at {})",
                    updated.id,
                    appointment.status,
                    updated.status,
                    updated.appointment_date,
                    updated.appointment_time
                );
                *appointment = updated;
                Ok(())
            }
            Err(e) if e.is_rejection() => {
                let message = e.to_string();
                warn!("Remote service rejected {:?} on appointment {}: {}", command, appointment.id, message);
                let current = self.reconcile_after_rejection(appointment, auth_token).await;
                Err(AppointmentError::Rejected { message, current })
            }
            Err(e) => {
                error!("Failed to apply {:?} to appointment {}: {}", command, appointment.id, e);
                Err(e.into())
            }
        }
    }

    /// Re-read the authoritative record after a refusal and overwrite the local copy.
    async fn reconcile_after_rejection(
        &self,
        appointment: &mut Appointment,
        auth_token: &str,
    ) -> Option<Box<Appointment>> {
        match self.fetch_appointment(appointment.id, auth_token).await {
            Ok(fresh) => {
                debug!("Reconciled appointment {} to status {}", fresh.id, fresh.status);
                *appointment = fresh.clone();
                Some(Box::new(fresh))
            }
            Err(e) => {
                warn!("Could not re-read appointment {} after rejection: {}", appointment.id, e);
                None
            }
        }
    }

    async fn fetch_appointment(&self, appointment_id: i64, auth_token: &str) -> Result<Appointment, RemoteError> {
        let path = format!("/appointments/{}", appointment_id);
        self.api.request::<Appointment>(Method::GET, &path, Some(auth_token), None).await
    }
}
