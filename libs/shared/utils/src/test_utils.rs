use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};

pub struct TestConfig {
    pub jwt_secret: String,
    pub data_api_url: String,
    pub data_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            data_api_url: "http://localhost:54321".to_string(),
            data_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            data_api_url: self.data_api_url.clone(),
            data_api_key: self.data_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            notification_url: String::new(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// Config pointed at a mock data API server.
    pub fn with_data_api(url: &str) -> Self {
        Self {
            data_api_url: url.to_string(),
            ..Self::default()
        }
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: UserRole::Patient,
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, UserRole::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserRole::Patient)
    }

    pub fn staff(email: &str) -> Self {
        Self::new(email, UserRole::Staff)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, UserRole::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned rows in the shape the data API returns, for wiremock bodies.
pub struct MockApiRows;

impl MockApiRows {
    pub fn schedule_row(doctor_id: Uuid, day_of_week: u8, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "branch_id": 1,
            "day_of_week": day_of_week,
            "start_time": start,
            "end_time": end,
            "slot_minutes": 30,
            "is_active": true
        })
    }

    pub fn appointment_row(
        patient_id: Uuid,
        doctor_id: Uuid,
        scheduled_at: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "branch_id": 1,
            "appointment_type_id": 1,
            "scheduled_at": scheduled_at,
            "duration_minutes": 30,
            "status": status,
            "modality": "in_person",
            "reason": "checkup",
            "notes": null,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn user_row(id: Uuid, email: &str, role: &str, password_hash: &str) -> serde_json::Value {
        json!({
            "id": id,
            "first_name": "Test",
            "last_name": "User",
            "national_id": "1712345678",
            "email": email,
            "username": "test.user",
            "role": role,
            "password_hash": password_hash,
            "is_active": true,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }
}
