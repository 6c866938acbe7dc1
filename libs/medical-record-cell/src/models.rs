use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

/// Record header together with the patient it belongs to and the
/// consultations performed so far, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalHistory {
    pub record: MedicalRecord,
    pub patient_name: String,
    pub national_id: String,
    pub consultations: Vec<Consultation>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for RecordError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => RecordError::NotFound(msg),
            other => RecordError::Database(other.to_string()),
        }
    }
}
