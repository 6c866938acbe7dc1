use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialty_id: i32,
    pub professional_title: Option<String>,
}

/// Doctor row joined with its user and specialty, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorListing {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub specialty: String,
    pub professional_title: Option<String>,
}

impl DoctorListing {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: i32,
    pub name: String,
}

/// One recurring block of working hours. `day_of_week` uses ISO numbering,
/// 1 = Monday through 7 = Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScheduleBlock {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub branch_id: i32,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: i32,
    pub is_active: bool,
}

/// Full-day unavailability for a doctor on a concrete date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleException {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub reason: String,
    pub is_active: bool,
}

/// Compact view of a booked appointment, enough to report a conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictingAppointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityReason {
    PastDatetime,
    NoWorkingHours,
    DoctorUnavailable,
    SlotTaken,
}

impl AvailabilityReason {
    pub fn code(&self) -> &'static str {
        match self {
            AvailabilityReason::PastDatetime => "PAST_DATETIME",
            AvailabilityReason::NoWorkingHours => "NO_WORKING_HOURS",
            AvailabilityReason::DoctorUnavailable => "DOCTOR_UNAVAILABLE",
            AvailabilityReason::SlotTaken => "SLOT_TAKEN",
        }
    }
}

/// Outcome of an availability check. Computed fresh on every query and
/// never cached; a positive answer is point-in-time only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityDecision {
    pub bookable: bool,
    pub reason: Option<AvailabilityReason>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting: Option<ConflictingAppointment>,
    /// Slot length of the governing schedule block, present when bookable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_minutes: Option<i32>,
}

impl AvailabilityDecision {
    pub fn bookable(slot_minutes: i32) -> Self {
        Self {
            bookable: true,
            reason: None,
            message: "Time slot is available".to_string(),
            conflicting: None,
            slot_minutes: Some(slot_minutes),
        }
    }

    pub fn blocked(reason: AvailabilityReason, message: impl Into<String>) -> Self {
        Self {
            bookable: false,
            reason: Some(reason),
            message: message.into(),
            conflicting: None,
            slot_minutes: None,
        }
    }

    pub fn taken(conflicting: ConflictingAppointment) -> Self {
        Self {
            bookable: false,
            reason: Some(AvailabilityReason::SlotTaken),
            message: "Time slot is already taken".to_string(),
            conflicting: Some(conflicting),
            slot_minutes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub branch_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub password: String,
    pub specialty_id: i32,
    pub professional_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub doctor_id: Uuid,
    pub branch_id: i32,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub slot_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub branch_id: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub slot_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExceptionRequest {
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schedule conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbError> for DoctorError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => DoctorError::NotFound(msg),
            DbError::Conflict(msg) => DoctorError::Conflict(msg),
            other => DoctorError::Database(other.to_string()),
        }
    }
}
