use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::models::AvailabilityReason;
use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, ChangeStatusRequest, CreateAppointmentRequest,
    DateRangeQuery,
};
use crate::services::AppointmentBookingService;

fn status_for_reason(reason: AvailabilityReason) -> StatusCode {
    match reason {
        AvailabilityReason::PastDatetime | AvailabilityReason::NoWorkingHours => {
            StatusCode::BAD_REQUEST
        }
        AvailabilityReason::DoctorUnavailable => StatusCode::NOT_FOUND,
        AvailabilityReason::SlotTaken => StatusCode::CONFLICT,
    }
}

fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        AppointmentError::NotBookable(reason, message) => {
            AppError::coded(status_for_reason(reason), reason.code(), message)
        }
        AppointmentError::InvalidStatusTransition { .. } => {
            AppError::ValidationError(err.to_string())
        }
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn ok(message: &str, data: Value) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data
    }))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .create_appointment(request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok((StatusCode::CREATED, ok("Appointment booked", json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(ok("Appointment retrieved", json!(appointment)))
}

#[axum::debug_handler]
pub async fn change_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .change_status(appointment_id, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(ok("Appointment status updated", json!(appointment)))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AppointmentSearchQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentBookingService::new(&state)
        .search(query, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(ok("Appointments retrieved", json!(appointments)))
}

#[axum::debug_handler]
pub async fn appointments_in_range(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DateRangeQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentBookingService::new(&state)
        .in_date_range(query, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(ok("Appointments retrieved", json!(appointments)))
}
