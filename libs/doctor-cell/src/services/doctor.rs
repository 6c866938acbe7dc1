use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{DbError, PostgrestClient};
use shared_utils::password::hash_password;
use shared_utils::validation::{validate_document_number, validate_email, validate_password_strength};

use crate::models::{Doctor, DoctorError, DoctorListing, RegisterDoctorRequest, Specialty};

pub struct DoctorService {
    db: PostgrestClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Registers a doctor. The user row and the doctor row are created by a
    /// single data API function call so there is no partial state.
    pub async fn register_doctor(
        &self,
        request: RegisterDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Registering doctor {} {}", request.first_name, request.last_name);

        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(DoctorError::Validation("First and last name are required".to_string()));
        }
        if !validate_email(&request.email) {
            return Err(DoctorError::Validation("Invalid email address".to_string()));
        }
        if !validate_document_number(&request.national_id) {
            return Err(DoctorError::Validation("Invalid national ID".to_string()));
        }
        validate_password_strength(&request.password).map_err(DoctorError::Validation)?;

        let password_hash = hash_password(&request.password)
            .map_err(|e| DoctorError::Database(e.to_string()))?;
        let username = generate_username(&request.first_name, &request.last_name);

        let body = json!({
            "p_first_name": request.first_name,
            "p_last_name": request.last_name,
            "p_national_id": request.national_id,
            "p_email": request.email,
            "p_username": username,
            "p_password_hash": password_hash,
            "p_specialty_id": request.specialty_id,
            "p_professional_title": request.professional_title
        });

        let doctor: Doctor = self
            .db
            .request(Method::POST, "/rest/v1/rpc/register_doctor", Some(auth_token), Some(body))
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => DoctorError::Conflict(
                    "A user with this national ID or email already exists".to_string(),
                ),
                other => other.into(),
            })?;

        debug!("Doctor registered with ID: {}", doctor.id);
        Ok(doctor)
    }

    pub async fn list_doctors(&self, auth_token: &str) -> Result<Vec<DoctorListing>, DoctorError> {
        let path = "/rest/v1/doctors?select=id,professional_title,\
                    users!inner(first_name,last_name,national_id,is_active),\
                    specialties!inner(name)&users.is_active=eq.true&order=id.asc";

        let rows: Vec<Value> = self.db.request(Method::GET, path, Some(auth_token), None).await?;

        rows.into_iter().map(listing_from_row).collect()
    }

    pub async fn find_by_national_id(
        &self,
        national_id: &str,
        auth_token: &str,
    ) -> Result<DoctorListing, DoctorError> {
        let path = format!(
            "/rest/v1/doctors?select=id,professional_title,\
             users!inner(first_name,last_name,national_id,is_active),\
             specialties!inner(name)&users.national_id=eq.{}",
            national_id
        );

        let rows: Vec<Value> = self.db.request(Method::GET, &path, Some(auth_token), None).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DoctorError::NotFound(format!("No doctor with national ID {}", national_id)))
            .and_then(listing_from_row)
    }

    pub async fn list_specialties(&self, auth_token: &str) -> Result<Vec<Specialty>, DoctorError> {
        let specialties = self
            .db
            .request(Method::GET, "/rest/v1/specialties?order=name.asc", Some(auth_token), None)
            .await?;
        Ok(specialties)
    }
}

fn listing_from_row(row: Value) -> Result<DoctorListing, DoctorError> {
    let malformed = || DoctorError::Database("Malformed doctor row from data API".to_string());

    let user = row.get("users").ok_or_else(malformed)?;
    let specialty = row.get("specialties").ok_or_else(malformed)?;

    Ok(DoctorListing {
        id: serde_json::from_value(row.get("id").cloned().ok_or_else(malformed)?)
            .map_err(|_| malformed())?,
        first_name: user["first_name"].as_str().ok_or_else(malformed)?.to_string(),
        last_name: user["last_name"].as_str().ok_or_else(malformed)?.to_string(),
        national_id: user["national_id"].as_str().ok_or_else(malformed)?.to_string(),
        specialty: specialty["name"].as_str().ok_or_else(malformed)?.to_string(),
        professional_title: row["professional_title"].as_str().map(|s| s.to_string()),
    })
}

fn generate_username(first_name: &str, last_name: &str) -> String {
    let first = first_name.split_whitespace().next().unwrap_or(first_name);
    let last = last_name.split_whitespace().next().unwrap_or(last_name);
    format!("{}.{}", first.to_lowercase(), last.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_uses_first_tokens_lowercased() {
        assert_eq!(generate_username("Ana Maria", "Lopez Vega"), "ana.lopez");
        assert_eq!(generate_username("Juan", "Perez"), "juan.perez");
    }

    #[test]
    fn listing_parses_embedded_row() {
        let row = json!({
            "id": uuid::Uuid::new_v4(),
            "professional_title": "MD",
            "users": {
                "first_name": "Ana",
                "last_name": "Lopez",
                "national_id": "1712345678",
                "is_active": true
            },
            "specialties": { "name": "Cardiology" }
        });

        let listing = listing_from_row(row).unwrap();
        assert_eq!(listing.full_name(), "Ana Lopez");
        assert_eq!(listing.specialty, "Cardiology");
    }
}
