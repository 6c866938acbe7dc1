use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::RecordError;
use crate::services::MedicalRecordService;

fn map_record_error(err: RecordError) -> AppError {
    match err {
        RecordError::NotFound(msg) => AppError::NotFound(msg),
        RecordError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_history_by_document(
    State(state): State<Arc<AppConfig>>,
    Path(national_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let history = MedicalRecordService::new(&state)
        .history_by_national_id(&national_id, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Clinical history retrieved",
        "data": history
    })))
}

#[axum::debug_handler]
pub async fn get_patient_consultations(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let consultations = MedicalRecordService::new(&state)
        .consultations_for_patient(patient_id, auth.token())
        .await
        .map_err(map_record_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Consultations retrieved",
        "data": consultations
    })))
}
