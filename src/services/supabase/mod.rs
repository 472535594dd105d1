//! Supabase REST plumbing shared by the auth and storage gateways.
//!
//! Relational data does not go through here: the server talks to the
//! project's Postgres directly (see `db::PgStore`).

use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::{AppError, AppResult};

pub mod auth;
pub mod storage;

pub use auth::{AuthGateway, SupabaseAuth};
pub use storage::{ObjectStorage, SupabaseStorage};

/// Which key a request is sent with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Public anon key, optionally with a user's access token
    Anon,
    /// Service-role key; bypasses row level security
    Service,
}

/// Thin authenticated client for one Supabase project
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: HttpClient,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

/// The error shapes returned by GoTrue and Storage
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: String, service_role_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            service_role_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a request with `apikey` and a bearer token set.
    /// `bearer` overrides the key as the Authorization token (user sessions).
    pub fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        role: KeyRole,
        bearer: Option<&str>,
    ) -> RequestBuilder {
        let key = match role {
            KeyRole::Anon => &self.anon_key,
            KeyRole::Service => &self.service_role_key,
        };

        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", key)
            .bearer_auth(bearer.unwrap_or(key))
    }

    /// Sends and decodes a JSON response
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Sends and checks the status, discarding the body
    pub async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        tracing::warn!(status = %status, message = %message, "Supabase request failed");

        Err(error_for_status(status, message))
    }
}

/// Best-guess mapping of a backend status to an application error
pub fn error_for_status(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::InvalidInput(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => AppError::QuotaExceeded(message),
        _ => AppError::ExternalApi(format!("Supabase returned status {}: {}", status, message)),
    }
}
