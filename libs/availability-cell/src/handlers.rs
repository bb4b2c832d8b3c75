// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::SlotGrid;
use crate::services::slots::parse_date;
use crate::services::AvailabilityService;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
}

/// Weekly availability windows for a doctor. Open to every signed-in role.
#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_role(&user)?;

    let service = AvailabilityService::new(&state);
    let windows = service.get_doctor_availability(doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "doctorId": doctor_id,
        "windows": windows,
        "total": windows.len()
    })))
}

/// Full slot grid for a doctor and date, each slot marked selectable or not.
/// Without a usable date the grid is empty and nothing is fetched.
#[axum::debug_handler]
pub async fn get_slot_grid(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotGrid>, AppError> {
    require_role(&user)?;

    let Some(date) = query.date.as_deref().and_then(parse_date) else {
        debug!("No usable date for doctor {} slot grid: {:?}", doctor_id, query.date);
        return Ok(Json(SlotGrid::empty(doctor_id, None)));
    };

    let service = AvailabilityService::new(&state);
    let grid = service.get_slot_grid(doctor_id, date, auth.token()).await?;

    Ok(Json(grid))
}
