use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::models::AvailabilityReason;
use shared_database::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub branch_id: i32,
    pub appointment_type_id: i32,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub modality: Modality,
    pub reason: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn scheduled_end_time(&self) -> DateTime<Utc> {
        self.scheduled_at + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Virtual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub branch_id: i32,
    pub appointment_type_id: i32,
    /// "YYYY-MM-DD HH:MM:SS", a "T" separator is also accepted.
    pub scheduled_at: String,
    pub modality: Option<Modality>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentSearchQuery {
    pub specialty_id: Option<i32>,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("{1}")]
    NotBookable(AvailabilityReason, String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for AppointmentError {
    fn from(err: DbError) -> Self {
        match err {
            // A uniqueness violation on insert means we lost the booking race.
            DbError::Conflict(_) => AppointmentError::NotBookable(
                AvailabilityReason::SlotTaken,
                "Time slot was taken by a concurrent booking".to_string(),
            ),
            DbError::NotFound(_) => AppointmentError::NotFound,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}
