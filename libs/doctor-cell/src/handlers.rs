use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{
    CreateExceptionRequest, CreateScheduleRequest, DoctorError, RegisterDoctorRequest,
    UpdateScheduleRequest,
};
use crate::services::{AvailabilityService, DoctorService, ScheduleService};

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
    pub branch_id: Option<i32>,
}

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound(msg) => AppError::NotFound(msg),
        DoctorError::Validation(msg) => AppError::ValidationError(msg),
        DoctorError::Conflict(msg) => AppError::Conflict(msg),
        DoctorError::Database(msg) => AppError::Database(msg),
    }
}

fn require_staff(user: &User) -> Result<(), AppError> {
    if user.role == UserRole::Patient {
        return Err(AppError::Auth("Staff access required".to_string()));
    }
    Ok(())
}

fn ok(message: &str, data: Value) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data
    }))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state)
        .list_doctors(auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Doctors retrieved", json!(doctors)))
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.role != UserRole::Admin {
        return Err(AppError::Auth("Only administrators can register doctors".to_string()));
    }

    let doctor = DoctorService::new(&state)
        .register_doctor(request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok((StatusCode::CREATED, ok("Doctor registered", json!(doctor))))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let specialties = DoctorService::new(&state)
        .list_specialties(auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Specialties retrieved", json!(specialties)))
}

#[axum::debug_handler]
pub async fn get_doctor_by_document(
    State(state): State<Arc<AppConfig>>,
    Path(national_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state)
        .find_by_national_id(&national_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Doctor retrieved", json!(doctor)))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_staff(&user)?;

    let block = ScheduleService::new(&state)
        .create_schedule(request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok((StatusCode::CREATED, ok("Schedule created", json!(block))))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;

    let block = ScheduleService::new(&state)
        .update_schedule(schedule_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Schedule updated", json!(block)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;

    let block = ScheduleService::new(&state)
        .deactivate_schedule(schedule_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Schedule deactivated", json!(block)))
}

#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let blocks = ScheduleService::new(&state)
        .list_for_doctor(doctor_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Schedule retrieved", json!(blocks)))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let slots = AvailabilityService::new(&state)
        .available_slots(doctor_id, query.date, query.branch_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Available slots retrieved", json!(slots)))
}

#[axum::debug_handler]
pub async fn create_exception(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateExceptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_staff(&user)?;

    let exception = ScheduleService::new(&state)
        .create_exception(doctor_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok((StatusCode::CREATED, ok("Exception created", json!(exception))))
}

#[axum::debug_handler]
pub async fn delete_exception(
    State(state): State<Arc<AppConfig>>,
    Path((_doctor_id, exception_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;

    let exception = ScheduleService::new(&state)
        .deactivate_exception(exception_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(ok("Exception deactivated", json!(exception)))
}
