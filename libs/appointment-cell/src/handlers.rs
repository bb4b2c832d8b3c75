// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{
    AppointmentCommand, AppointmentSearchQuery, BookAppointmentRequest, DoctorAppointmentsQuery,
    RescheduleAppointmentRequest, StatusUpdateRequest,
};
use crate::services::booking::AppointmentBookingService;

// ==============================================================================
// BOOKING AND LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let role = require_role(&user)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.book_appointment(request, role, auth.token()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "appointment": appointment,
            "message": "Appointment requested"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let role = require_role(&user)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.get_appointment(appointment_id, role, auth.token()).await?;

    Ok(Json(json!({ "appointment": appointment })))
}

/// Paged search across all appointments (admin and reception).
#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let role = require_role(&user)?;

    let booking_service = AppointmentBookingService::new(&state);
    let page = booking_service.search_appointments(role, &query, auth.token()).await?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let role = require_role(&user)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service.get_my_appointments(role, auth.token()).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DoctorAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let role = require_role(&user)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .get_doctor_appointments(role, query.date, auth.token())
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
        "date": query.date
    })))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    apply_command(&state, auth.token(), &user, appointment_id, AppointmentCommand::SetStatus(request.status)).await
}

#[axum::debug_handler]
pub async fn accept_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    apply_command(&state, auth.token(), &user, appointment_id, AppointmentCommand::Accept).await
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    apply_command(&state, auth.token(), &user, appointment_id, AppointmentCommand::Reject).await
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    apply_command(&state, auth.token(), &user, appointment_id, AppointmentCommand::Cancel).await
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    apply_command(&state, auth.token(), &user, appointment_id, AppointmentCommand::Reschedule(request)).await
}

/// Load the current record, then run the command against it.
async fn apply_command(
    state: &AppConfig,
    token: &str,
    user: &User,
    appointment_id: i64,
    command: AppointmentCommand,
) -> Result<Json<Value>, AppError> {
    let role = require_role(user)?;

    let booking_service = AppointmentBookingService::new(state);
    let mut appointment = booking_service.get_appointment(appointment_id, role, token).await?;

    booking_service.perform(&mut appointment, command, role, token).await?;

    Ok(Json(json!({ "appointment": appointment })))
}
