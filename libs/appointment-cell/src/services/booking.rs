use chrono::{Duration, NaiveTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use doctor_cell::services::AvailabilityService;
use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_utils::validation::parse_datetime;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    ChangeStatusRequest, CreateAppointmentRequest, DateRangeQuery, Modality,
};
use crate::services::lifecycle::{append_status_note, AppointmentLifecycleService};
use crate::services::notifications::NotificationService;

pub struct AppointmentBookingService {
    db: PostgrestClient,
    availability_service: AvailabilityService,
    lifecycle_service: AppointmentLifecycleService,
    notification_service: NotificationService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            availability_service: AvailabilityService::new(config),
            lifecycle_service: AppointmentLifecycleService::new(),
            notification_service: NotificationService::new(config),
        }
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Appointment reason is required".to_string(),
            ));
        }
        let scheduled_at = parse_datetime(&request.scheduled_at)
            .map_err(AppointmentError::ValidationError)?
            .and_utc();

        self.verify_patient_exists(request.patient_id, auth_token).await?;

        let decision = self
            .availability_service
            .check_availability(request.doctor_id, scheduled_at, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if !decision.bookable {
            let reason = decision.reason.ok_or_else(|| {
                AppointmentError::DatabaseError("Availability decision without reason".to_string())
            })?;
            return Err(AppointmentError::NotBookable(reason, decision.message));
        }

        let duration_minutes = decision.slot_minutes.ok_or_else(|| {
            AppointmentError::DatabaseError("Bookable decision without slot length".to_string())
        })?;

        let now = Utc::now();
        let body = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "branch_id": request.branch_id,
            "appointment_type_id": request.appointment_type_id,
            "scheduled_at": scheduled_at.to_rfc3339(),
            "duration_minutes": duration_minutes,
            "status": AppointmentStatus::Pending,
            "modality": request.modality.unwrap_or(Modality::InPerson),
            "reason": request.reason,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        // The partial unique index on (doctor_id, scheduled_at) closes the
        // window between the check above and this insert; its violation
        // comes back as a conflict and maps to SlotTaken.
        let row = self
            .db
            .insert_returning("/rest/v1/appointments", auth_token, body)
            .await?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        self.notification_service.notify_booked(&appointment);

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    pub async fn change_status(
        &self,
        appointment_id: Uuid,
        request: ChangeStatusRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Changing status of appointment {} to {}", appointment_id, request.status);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(current.status, request.status)?;

        let mut update = serde_json::Map::new();
        update.insert("status".to_string(), json!(request.status));
        update.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        if let Some(note) = request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            let notes = append_status_note(current.notes.as_deref(), request.status, note, Utc::now());
            update.insert("notes".to_string(), json!(notes));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let row = self
            .db
            .update_returning(&path, auth_token, Value::Object(update))
            .await?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        self.notification_service.notify_status_changed(&appointment);

        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> =
            self.db.request(Method::GET, &path, Some(auth_token), None).await?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    pub async fn search(
        &self,
        query: AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = String::from(
            "/rest/v1/appointments?select=*,doctors!inner(specialty_id)&order=scheduled_at.asc",
        );
        if let Some(specialty_id) = query.specialty_id {
            path.push_str(&format!("&doctors.specialty_id=eq.{}", specialty_id));
        }
        if let Some(doctor_id) = query.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }

        let appointments = self.db.request(Method::GET, &path, Some(auth_token), None).await?;
        Ok(appointments)
    }

    pub async fn in_date_range(
        &self,
        query: DateRangeQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if query.from > query.to {
            return Err(AppointmentError::ValidationError(
                "Range start must not be after range end".to_string(),
            ));
        }

        let from = query.from.and_time(NaiveTime::MIN).and_utc();
        let to = query.to.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);

        let mut path = format!(
            "/rest/v1/appointments?scheduled_at=gte.{}&scheduled_at=lt.{}&order=scheduled_at.asc",
            from.to_rfc3339_opts(SecondsFormat::Secs, true),
            to.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        if let Some(doctor_id) = query.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }

        let appointments = self.db.request(Method::GET, &path, Some(auth_token), None).await?;
        Ok(appointments)
    }

    async fn verify_patient_exists(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/patients?id=eq.{}&select=id", patient_id);
        let rows: Vec<Value> = self.db.request(Method::GET, &path, Some(auth_token), None).await?;

        if rows.is_empty() {
            return Err(AppointmentError::PatientNotFound);
        }
        Ok(())
    }
}
