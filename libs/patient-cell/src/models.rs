use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub birth_date: NaiveDate,
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

/// Patient joined with its user row, as returned by lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub blood_type: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub password: String,
    pub birth_date: NaiveDate,
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for PatientError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => PatientError::NotFound(msg),
            DbError::Conflict(msg) => PatientError::Conflict(msg),
            other => PatientError::Database(other.to_string()),
        }
    }
}
