use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medical_record_cell::handlers;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::TestConfig;

fn config_for(server: &MockServer) -> Arc<AppConfig> {
    TestConfig::with_data_api(&server.uri()).to_arc()
}

fn auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer("test-token").unwrap())
}

fn consultation_row(patient_id: Uuid, performed_at: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "appointment_id": Uuid::new_v4(),
        "patient_id": patient_id,
        "doctor_id": Uuid::new_v4(),
        "performed_at": performed_at,
        "diagnosis": "Seasonal allergy",
        "treatment": "Antihistamines",
        "notes": null
    })
}

#[tokio::test]
async fn history_lookup_joins_patient_record_and_consultations() {
    let server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": patient_id,
            "users": {
                "first_name": "Juan",
                "last_name": "Perez",
                "national_id": "1712345678"
            }
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            consultation_row(patient_id, "2026-03-10T14:00:00Z"),
            consultation_row(patient_id, "2026-01-05T09:00:00Z")
        ])))
        .mount(&server)
        .await;

    let Json(body) = handlers::get_history_by_document(
        State(config_for(&server)),
        Path("1712345678".to_string()),
        auth_header(),
    )
    .await
    .unwrap();

    assert_eq!(body["data"]["patient_name"], json!("Juan Perez"));
    assert_eq!(body["data"]["consultations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn history_for_unknown_document_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = handlers::get_history_by_document(
        State(config_for(&server)),
        Path("9999999999".to_string()),
        auth_header(),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn consultations_endpoint_returns_rows() {
    let server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            consultation_row(patient_id, "2026-03-10T14:00:00Z")
        ])))
        .mount(&server)
        .await;

    let Json(body) = handlers::get_patient_consultations(
        State(config_for(&server)),
        Path(patient_id),
        auth_header(),
    )
    .await
    .unwrap();

    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["diagnosis"], json!("Seasonal allergy"));
}
