use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::handlers;
use patient_cell::models::RegisterPatientRequest;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::{TestConfig, TestUser};

fn config_for(server: &MockServer) -> Arc<AppConfig> {
    TestConfig::with_data_api(&server.uri()).to_arc()
}

fn auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer("test-token").unwrap())
}

fn register_request() -> RegisterPatientRequest {
    RegisterPatientRequest {
        first_name: "Juan".to_string(),
        last_name: "Perez".to_string(),
        national_id: "1712345678".to_string(),
        email: "juan@example.com".to_string(),
        password: "s3curepass1".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 2).unwrap(),
        blood_type: Some("O+".to_string()),
        phone: None,
        emergency_contact: None,
        emergency_phone: None,
    }
}

#[tokio::test]
async fn registration_creates_user_and_patient_in_one_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/register_patient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "birth_date": "1990-05-02",
            "blood_type": "O+",
            "phone": null,
            "emergency_contact": null,
            "emergency_phone": null
        })))
        .mount(&server)
        .await;

    let (status, Json(body)) = handlers::register_patient(
        State(config_for(&server)),
        auth_header(),
        Extension(TestUser::admin("admin@example.com").to_user()),
        Json(register_request()),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["blood_type"], json!("O+"));
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/register_patient"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let result = handlers::register_patient(
        State(config_for(&server)),
        auth_header(),
        Extension(TestUser::admin("admin@example.com").to_user()),
        Json(register_request()),
    )
    .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn weak_password_fails_validation() {
    let server = MockServer::start().await;

    let mut request = register_request();
    request.password = "short".to_string();

    let result = handlers::register_patient(
        State(config_for(&server)),
        auth_header(),
        Extension(TestUser::admin("admin@example.com").to_user()),
        Json(request),
    )
    .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn lookup_by_document_returns_profile() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "birth_date": "1990-05-02",
            "blood_type": "O+",
            "phone": "0991234567",
            "users": {
                "first_name": "Juan",
                "last_name": "Perez",
                "national_id": "1712345678",
                "email": "juan@example.com"
            }
        }])))
        .mount(&server)
        .await;

    let Json(body) = handlers::get_patient_by_document(
        State(config_for(&server)),
        Path("1712345678".to_string()),
        auth_header(),
    )
    .await
    .unwrap();

    assert_eq!(body["data"]["national_id"], json!("1712345678"));
    assert_eq!(body["data"]["first_name"], json!("Juan"));
}

#[tokio::test]
async fn lookup_of_unknown_document_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = handlers::get_patient_by_document(
        State(config_for(&server)),
        Path("9999999999".to_string()),
        auth_header(),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
