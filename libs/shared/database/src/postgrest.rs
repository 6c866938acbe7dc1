use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Typed error surface of the data API. Persistence-time uniqueness
/// violations arrive as `Conflict` so callers can treat a lost booking race
/// as an expected outcome rather than an internal failure.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Authentication rejected by data API: {0}")]
    Auth(String),

    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Constraint conflict: {0}")]
    Conflict(String),

    #[error("Data API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.data_api_url.clone(),
            api_key: config.data_api_key.clone(),
        }
    }

    fn headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, bearer);
            }
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Data API request: {} {}", method, url);

        let mut headers = self.headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            error!("Data API error ({}): {}", status, body_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DbError::Auth(body_text),
                StatusCode::NOT_FOUND => DbError::NotFound(body_text),
                StatusCode::CONFLICT => DbError::Conflict(body_text),
                _ => DbError::Api {
                    status: status.as_u16(),
                    body: body_text,
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DbError::Decode(e.to_string()))
    }

    /// POST a row and return the created representation. PostgREST returns
    /// an array even for a single insert.
    pub async fn insert_returning(
        &self,
        path: &str,
        auth_token: &str,
        body: Value,
    ) -> Result<Value, DbError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Value> = self
            .request_with_headers(Method::POST, path, Some(auth_token), Some(body), Some(headers))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::Decode("insert returned no rows".to_string()))
    }

    /// PATCH matching rows and return the first updated representation.
    /// An empty result means the filter matched nothing.
    pub async fn update_returning(
        &self,
        path: &str,
        auth_token: &str,
        body: Value,
    ) -> Result<Value, DbError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Value> = self
            .request_with_headers(Method::PATCH, path, Some(auth_token), Some(body), Some(headers))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound("update matched no rows".to_string()))
    }
}
