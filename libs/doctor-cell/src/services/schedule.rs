use chrono::NaiveTime;
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_utils::validation::parse_time;

use crate::models::{
    CreateExceptionRequest, CreateScheduleRequest, DoctorError, ScheduleException,
    UpdateScheduleRequest, WeeklyScheduleBlock,
};

pub struct ScheduleService {
    db: PostgrestClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<WeeklyScheduleBlock, DoctorError> {
        debug!("Creating schedule block for doctor {}", request.doctor_id);

        let start_time = parse_time(&request.start_time).map_err(DoctorError::Validation)?;
        let end_time = parse_time(&request.end_time).map_err(DoctorError::Validation)?;
        validate_block(request.day_of_week, start_time, end_time, request.slot_minutes)?;

        self.check_overlap(request.doctor_id, request.day_of_week, start_time, end_time, None, auth_token)
            .await?;

        let body = json!({
            "doctor_id": request.doctor_id,
            "branch_id": request.branch_id,
            "day_of_week": request.day_of_week,
            "start_time": start_time.format("%H:%M:%S").to_string(),
            "end_time": end_time.format("%H:%M:%S").to_string(),
            "slot_minutes": request.slot_minutes,
            "is_active": true
        });

        let row = self
            .db
            .insert_returning("/rest/v1/doctor_schedules", auth_token, body)
            .await?;

        let block: WeeklyScheduleBlock = serde_json::from_value(row)
            .map_err(|e| DoctorError::Database(e.to_string()))?;
        debug!("Schedule block created with ID: {}", block.id);

        Ok(block)
    }

    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<WeeklyScheduleBlock, DoctorError> {
        debug!("Updating schedule block {}", schedule_id);

        let current = self.get_schedule(schedule_id, auth_token).await?;

        let start_time = match &request.start_time {
            Some(raw) => parse_time(raw).map_err(DoctorError::Validation)?,
            None => current.start_time,
        };
        let end_time = match &request.end_time {
            Some(raw) => parse_time(raw).map_err(DoctorError::Validation)?,
            None => current.end_time,
        };
        let slot_minutes = request.slot_minutes.unwrap_or(current.slot_minutes);
        validate_block(current.day_of_week, start_time, end_time, slot_minutes)?;

        self.check_overlap(
            current.doctor_id,
            current.day_of_week,
            start_time,
            end_time,
            Some(schedule_id),
            auth_token,
        )
        .await?;

        let mut update = serde_json::Map::new();
        update.insert(
            "start_time".to_string(),
            json!(start_time.format("%H:%M:%S").to_string()),
        );
        update.insert(
            "end_time".to_string(),
            json!(end_time.format("%H:%M:%S").to_string()),
        );
        update.insert("slot_minutes".to_string(), json!(slot_minutes));
        if let Some(branch_id) = request.branch_id {
            update.insert("branch_id".to_string(), json!(branch_id));
        }
        if let Some(is_active) = request.is_active {
            update.insert("is_active".to_string(), json!(is_active));
        }

        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        let row = self
            .db
            .update_returning(&path, auth_token, serde_json::Value::Object(update))
            .await?;

        serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string()))
    }

    pub async fn deactivate_schedule(
        &self,
        schedule_id: Uuid,
        auth_token: &str,
    ) -> Result<WeeklyScheduleBlock, DoctorError> {
        debug!("Deactivating schedule block {}", schedule_id);

        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        let row = self
            .db
            .update_returning(&path, auth_token, json!({ "is_active": false }))
            .await?;

        serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string()))
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<WeeklyScheduleBlock>, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&is_active=eq.true&order=day_of_week.asc,start_time.asc",
            doctor_id
        );
        let blocks = self.db.request(Method::GET, &path, Some(auth_token), None).await?;
        Ok(blocks)
    }

    pub async fn create_exception(
        &self,
        doctor_id: Uuid,
        request: CreateExceptionRequest,
        auth_token: &str,
    ) -> Result<ScheduleException, DoctorError> {
        debug!("Creating schedule exception for doctor {} on {}", doctor_id, request.date);

        if request.reason.trim().is_empty() {
            return Err(DoctorError::Validation("Exception reason is required".to_string()));
        }

        let existing_path = format!(
            "/rest/v1/doctor_schedule_exceptions?doctor_id=eq.{}&date=eq.{}&is_active=eq.true",
            doctor_id, request.date
        );
        let existing: Vec<ScheduleException> =
            self.db.request(Method::GET, &existing_path, Some(auth_token), None).await?;

        if !existing.is_empty() {
            return Err(DoctorError::Conflict(format!(
                "An exception already exists for {}",
                request.date
            )));
        }

        let body = json!({
            "doctor_id": doctor_id,
            "date": request.date,
            "reason": request.reason,
            "is_active": true
        });

        let row = self
            .db
            .insert_returning("/rest/v1/doctor_schedule_exceptions", auth_token, body)
            .await?;

        serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string()))
    }

    pub async fn deactivate_exception(
        &self,
        exception_id: Uuid,
        auth_token: &str,
    ) -> Result<ScheduleException, DoctorError> {
        debug!("Deactivating schedule exception {}", exception_id);

        let path = format!("/rest/v1/doctor_schedule_exceptions?id=eq.{}", exception_id);
        let row = self
            .db
            .update_returning(&path, auth_token, json!({ "is_active": false }))
            .await?;

        serde_json::from_value(row).map_err(|e| DoctorError::Database(e.to_string()))
    }

    async fn get_schedule(
        &self,
        schedule_id: Uuid,
        auth_token: &str,
    ) -> Result<WeeklyScheduleBlock, DoctorError> {
        let path = format!("/rest/v1/doctor_schedules?id=eq.{}", schedule_id);
        let rows: Vec<WeeklyScheduleBlock> =
            self.db.request(Method::GET, &path, Some(auth_token), None).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DoctorError::NotFound(format!("Schedule block {} not found", schedule_id)))
    }

    async fn check_overlap(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), DoctorError> {
        let mut path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&day_of_week=eq.{}&is_active=eq.true",
            doctor_id, day_of_week
        );
        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let existing: Vec<WeeklyScheduleBlock> =
            self.db.request(Method::GET, &path, Some(auth_token), None).await?;

        for block in existing {
            if start_time < block.end_time && end_time > block.start_time {
                return Err(DoctorError::Conflict(format!(
                    "Schedule overlaps existing block {}-{}",
                    block.start_time, block.end_time
                )));
            }
        }

        Ok(())
    }
}

fn validate_block(
    day_of_week: u8,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_minutes: i32,
) -> Result<(), DoctorError> {
    if !(1..=7).contains(&day_of_week) {
        return Err(DoctorError::Validation(
            "Day of week must be between 1 (Monday) and 7 (Sunday)".to_string(),
        ));
    }
    if start_time >= end_time {
        return Err(DoctorError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }
    if slot_minutes <= 0 {
        return Err(DoctorError::Validation(
            "Slot length must be a positive number of minutes".to_string(),
        ));
    }
    Ok(())
}
