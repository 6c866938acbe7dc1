use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{PatientError, RegisterPatientRequest};
use crate::services::PatientService;

fn map_patient_error(err: PatientError) -> AppError {
    match err {
        PatientError::NotFound(msg) => AppError::NotFound(msg),
        PatientError::Validation(msg) => AppError::ValidationError(msg),
        PatientError::Conflict(msg) => AppError::Conflict(msg),
        PatientError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.role == UserRole::Doctor {
        return Err(AppError::Auth("Doctors cannot register patients".to_string()));
    }

    let patient = PatientService::new(&state)
        .register_patient(request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Patient registered",
            "data": patient
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_patient_by_document(
    State(state): State<Arc<AppConfig>>,
    Path(national_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let profile = PatientService::new(&state)
        .find_by_national_id(&national_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient retrieved",
        "data": profile
    })))
}
