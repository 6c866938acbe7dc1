use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::handlers::{self, ChangePasswordRequest, LoginRequest};
use shared_config::AppConfig;
use shared_models::auth::UserRole;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;
use shared_utils::password::hash_password;
use shared_utils::test_utils::{MockApiRows, TestConfig};

fn config_for(server: &MockServer) -> Arc<AppConfig> {
    TestConfig::with_data_api(&server.uri()).to_arc()
}

async fn mount_user(server: &MockServer, id: Uuid, password: &str, active: bool) {
    let mut row = MockApiRows::user_row(id, "ana@example.com", "doctor", &hash_password(password).unwrap());
    row["is_active"] = json!(active);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(server)
        .await;
}

fn login_request(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
    }
}

#[tokio::test]
async fn login_returns_a_valid_token() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    mount_user(&server, user_id, "s3curepass1", true).await;

    let config = config_for(&server);
    let Json(body) = handlers::login(
        State(config.clone()),
        Json(login_request("ana.lopez", "s3curepass1")),
    )
    .await
    .unwrap();

    assert_eq!(body["success"], json!(true));
    let token = body["data"]["token"].as_str().unwrap();

    let user = validate_token(token, &config.jwt_secret).unwrap();
    assert_eq!(user.id, user_id);
    assert_eq!(user.email, "ana@example.com");
}

#[tokio::test]
async fn staff_users_can_log_in() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    let row = MockApiRows::user_row(
        user_id,
        "reception@example.com",
        "staff",
        &hash_password("s3curepass1").unwrap(),
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let Json(body) = handlers::login(
        State(config.clone()),
        Json(login_request("reception.desk", "s3curepass1")),
    )
    .await
    .unwrap();

    let token = body["data"]["token"].as_str().unwrap();
    let user = validate_token(token, &config.jwt_secret).unwrap();
    assert_eq!(user.role, UserRole::Staff);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let server = MockServer::start().await;
    mount_user(&server, Uuid::new_v4(), "s3curepass1", true).await;

    let result = handlers::login(
        State(config_for(&server)),
        Json(login_request("ana.lopez", "wrongpass1")),
    )
    .await;

    assert!(matches!(
        result,
        Err(AppError::Coded {
            status: StatusCode::UNAUTHORIZED,
            code: "INVALID_CREDENTIALS",
            ..
        })
    ));
}

#[tokio::test]
async fn inactive_user_cannot_log_in() {
    let server = MockServer::start().await;
    mount_user(&server, Uuid::new_v4(), "s3curepass1", false).await;

    let result = handlers::login(
        State(config_for(&server)),
        Json(login_request("ana.lopez", "s3curepass1")),
    )
    .await;

    assert!(matches!(result, Err(AppError::Coded { code: "INVALID_CREDENTIALS", .. })));
}

#[tokio::test]
async fn missing_credentials_are_rejected_without_io() {
    let server = MockServer::start().await;

    let result = handlers::login(
        State(config_for(&server)),
        Json(LoginRequest {
            username: Some("ana.lopez".to_string()),
            password: None,
        }),
    )
    .await;

    assert!(matches!(
        result,
        Err(AppError::Coded {
            status: StatusCode::BAD_REQUEST,
            code: "MISSING_CREDENTIALS",
            ..
        })
    ));
}

#[tokio::test]
async fn password_change_requires_matching_confirmation() {
    let server = MockServer::start().await;

    let result = handlers::change_password(
        State(config_for(&server)),
        Json(ChangePasswordRequest {
            username: Some("ana.lopez".to_string()),
            password: Some("newpass12".to_string()),
            confirmation: Some("different12".to_string()),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Coded { code: "PASSWORD_MISMATCH", .. })));
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let server = MockServer::start().await;

    let result = handlers::change_password(
        State(config_for(&server)),
        Json(ChangePasswordRequest {
            username: Some("ana.lopez".to_string()),
            password: Some("letters".to_string()),
            confirmation: Some("letters".to_string()),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Coded { code: "WEAK_PASSWORD", .. })));
}

#[tokio::test]
async fn password_change_for_unknown_user_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = handlers::change_password(
        State(config_for(&server)),
        Json(ChangePasswordRequest {
            username: Some("ghost".to_string()),
            password: Some("newpass12".to_string()),
            confirmation: Some("newpass12".to_string()),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Coded { code: "USER_NOT_FOUND", .. })));
}
