use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::{ClinicalHistory, Consultation, MedicalRecord, RecordError};

pub struct MedicalRecordService {
    db: PostgrestClient,
}

impl MedicalRecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn history_by_national_id(
        &self,
        national_id: &str,
        auth_token: &str,
    ) -> Result<ClinicalHistory, RecordError> {
        debug!("Looking up clinical history for national ID {}", national_id);

        let patient_path = format!(
            "/rest/v1/patients?select=id,users!inner(first_name,last_name,national_id)&users.national_id=eq.{}",
            national_id
        );
        let rows: Vec<Value> =
            self.db.request(Method::GET, &patient_path, Some(auth_token), None).await?;

        let patient = rows.into_iter().next().ok_or_else(|| {
            RecordError::NotFound(format!("No patient with national ID {}", national_id))
        })?;

        let malformed = || RecordError::Database("Malformed patient row from data API".to_string());
        let patient_id: Uuid =
            serde_json::from_value(patient.get("id").cloned().ok_or_else(malformed)?)
                .map_err(|_| malformed())?;
        let user = patient.get("users").ok_or_else(malformed)?;
        let patient_name = format!(
            "{} {}",
            user["first_name"].as_str().ok_or_else(malformed)?,
            user["last_name"].as_str().ok_or_else(malformed)?
        );

        let record_path = format!("/rest/v1/medical_records?patient_id=eq.{}", patient_id);
        let records: Vec<MedicalRecord> =
            self.db.request(Method::GET, &record_path, Some(auth_token), None).await?;
        let record = records.into_iter().next().ok_or_else(|| {
            RecordError::NotFound(format!("No medical record for patient {}", patient_id))
        })?;

        let consultations = self.consultations_for_patient(patient_id, auth_token).await?;

        Ok(ClinicalHistory {
            record,
            patient_name,
            national_id: national_id.to_string(),
            consultations,
        })
    }

    pub async fn consultations_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Consultation>, RecordError> {
        let path = format!(
            "/rest/v1/consultations?patient_id=eq.{}&order=performed_at.desc",
            patient_id
        );
        let consultations = self.db.request(Method::GET, &path, Some(auth_token), None).await?;
        Ok(consultations)
    }
}
