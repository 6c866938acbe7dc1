use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_models::auth::{TokenResponse, User, UserRole};
use shared_models::error::AppError;
use shared_utils::jwt::{issue_token, TOKEN_TTL_HOURS};
use shared_utils::password::{hash_password, verify_password};
use shared_utils::validation::validate_password_strength;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    id: Uuid,
    email: String,
    role: UserRole,
    password_hash: String,
    is_active: bool,
}

async fn fetch_user_by_username(
    db: &PostgrestClient,
    username: &str,
) -> Result<Option<UserRow>, AppError> {
    let path = format!(
        "/rest/v1/users?username=eq.{}&select=id,email,role,password_hash,is_active",
        username
    );
    let rows: Vec<UserRow> = db
        .request(Method::GET, &path, None, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(rows.into_iter().next())
}

fn invalid_credentials() -> AppError {
    AppError::coded(
        StatusCode::UNAUTHORIZED,
        "INVALID_CREDENTIALS",
        "Invalid username or password",
    )
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let (username, password) = match (request.username, request.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(AppError::coded(
                StatusCode::BAD_REQUEST,
                "MISSING_CREDENTIALS",
                "Username and password are required",
            ));
        }
    };

    debug!("Login attempt for username {}", username);

    let db = PostgrestClient::new(&config);
    let row = fetch_user_by_username(&db, &username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !row.is_active {
        warn!("Login attempt for inactive user {}", username);
        return Err(invalid_credentials());
    }

    let matches = verify_password(&password, &row.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !matches {
        return Err(invalid_credentials());
    }

    let (token, _exp) = issue_token(row.id, &row.email, row.role, &config.jwt_secret)
        .map_err(AppError::Internal)?;

    let response = TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: (TOKEN_TTL_HOURS * 3600) as u64,
        user: User {
            id: row.id,
            email: row.email,
            role: row.role,
        },
    };

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "data": response
    })))
}

#[axum::debug_handler]
pub async fn change_password(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let (username, password, confirmation) =
        match (request.username, request.password, request.confirmation) {
            (Some(u), Some(p), Some(c)) if !u.is_empty() && !p.is_empty() => (u, p, c),
            _ => {
                return Err(AppError::coded(
                    StatusCode::BAD_REQUEST,
                    "MISSING_CREDENTIALS",
                    "Username, password and confirmation are required",
                ));
            }
        };

    if password != confirmation {
        return Err(AppError::coded(
            StatusCode::BAD_REQUEST,
            "PASSWORD_MISMATCH",
            "Password and confirmation do not match",
        ));
    }

    if let Err(msg) = validate_password_strength(&password) {
        return Err(AppError::coded(StatusCode::BAD_REQUEST, "WEAK_PASSWORD", msg));
    }

    let db = PostgrestClient::new(&config);
    let row = fetch_user_by_username(&db, &username).await?.ok_or_else(|| {
        AppError::coded(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found")
    })?;

    let password_hash = hash_password(&password).map_err(|e| AppError::Internal(e.to_string()))?;

    let path = format!("/rest/v1/users?id=eq.{}", row.id);
    db.update_returning(&path, &config.data_api_key, json!({ "password_hash": password_hash }))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    debug!("Password changed for user {}", row.id);

    Ok(Json(json!({
        "success": true,
        "message": "Password updated",
        "data": null
    })))
}
