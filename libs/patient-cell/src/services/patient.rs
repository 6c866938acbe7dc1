use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{DbError, PostgrestClient};
use shared_utils::password::hash_password;
use shared_utils::validation::{
    validate_document_number, validate_email, validate_password_strength, validate_phone,
};

use crate::models::{Patient, PatientError, PatientProfile, RegisterPatientRequest};

pub struct PatientService {
    db: PostgrestClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Registers a patient. User and patient rows are created by one data
    /// API function call so there is no partial state.
    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        debug!("Registering patient {} {}", request.first_name, request.last_name);

        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(PatientError::Validation("First and last name are required".to_string()));
        }
        if !validate_email(&request.email) {
            return Err(PatientError::Validation("Invalid email address".to_string()));
        }
        if !validate_document_number(&request.national_id) {
            return Err(PatientError::Validation("Invalid national ID".to_string()));
        }
        validate_password_strength(&request.password).map_err(PatientError::Validation)?;
        for phone in [request.phone.as_deref(), request.emergency_phone.as_deref()]
            .into_iter()
            .flatten()
        {
            if !validate_phone(phone) {
                return Err(PatientError::Validation(format!("Invalid phone number: {}", phone)));
            }
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| PatientError::Database(e.to_string()))?;
        let username = generate_username(&request.first_name, &request.last_name);

        let body = json!({
            "p_first_name": request.first_name,
            "p_last_name": request.last_name,
            "p_national_id": request.national_id,
            "p_email": request.email,
            "p_username": username,
            "p_password_hash": password_hash,
            "p_birth_date": request.birth_date,
            "p_blood_type": request.blood_type,
            "p_phone": request.phone,
            "p_emergency_contact": request.emergency_contact,
            "p_emergency_phone": request.emergency_phone
        });

        let patient: Patient = self
            .db
            .request(Method::POST, "/rest/v1/rpc/register_patient", Some(auth_token), Some(body))
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => PatientError::Conflict(
                    "A user with this national ID or email already exists".to_string(),
                ),
                other => other.into(),
            })?;

        debug!("Patient registered with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn find_by_national_id(
        &self,
        national_id: &str,
        auth_token: &str,
    ) -> Result<PatientProfile, PatientError> {
        let path = format!(
            "/rest/v1/patients?select=id,birth_date,blood_type,phone,\
             users!inner(first_name,last_name,national_id,email)&users.national_id=eq.{}",
            national_id
        );

        let rows: Vec<Value> = self.db.request(Method::GET, &path, Some(auth_token), None).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PatientError::NotFound(format!("No patient with national ID {}", national_id)))
            .and_then(profile_from_row)
    }
}

fn profile_from_row(row: Value) -> Result<PatientProfile, PatientError> {
    let malformed = || PatientError::Database("Malformed patient row from data API".to_string());

    let user = row.get("users").ok_or_else(malformed)?;

    Ok(PatientProfile {
        id: serde_json::from_value(row.get("id").cloned().ok_or_else(malformed)?)
            .map_err(|_| malformed())?,
        first_name: user["first_name"].as_str().ok_or_else(malformed)?.to_string(),
        last_name: user["last_name"].as_str().ok_or_else(malformed)?.to_string(),
        national_id: user["national_id"].as_str().ok_or_else(malformed)?.to_string(),
        email: user["email"].as_str().ok_or_else(malformed)?.to_string(),
        birth_date: serde_json::from_value(row.get("birth_date").cloned().ok_or_else(malformed)?)
            .map_err(|_| malformed())?,
        blood_type: row["blood_type"].as_str().map(|s| s.to_string()),
        phone: row["phone"].as_str().map(|s| s.to_string()),
    })
}

fn generate_username(first_name: &str, last_name: &str) -> String {
    let first = first_name.split_whitespace().next().unwrap_or(first_name);
    let last = last_name.split_whitespace().next().unwrap_or(last_name);
    format!("{}.{}.paciente", first.to_lowercase(), last.to_lowercase())
}
