use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{KeyRole, SupabaseClient};
use crate::{
    error::{AppError, AppResult},
    models::{AuthAccount, Credentials, Session, SignupOutcome},
};

/// Account lifecycle operations delegated to the auth backend
#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    /// Registers a user. No session is returned while email confirmation is pending.
    async fn sign_up(&self, email: &str, password: &str, username: &str)
        -> AppResult<SignupOutcome>;

    /// Password grant. Bad credentials yield `AppError::Unauthorized`.
    async fn sign_in(&self, credentials: &Credentials) -> AppResult<Session>;

    async fn refresh(&self, refresh_token: &str) -> AppResult<Session>;

    /// Revokes the refresh tokens of the session behind `access_token`
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;

    /// Emails a recovery link
    async fn send_password_reset(&self, email: &str, redirect_to: Option<&str>) -> AppResult<()>;

    /// Changes the password of the user behind `access_token`
    async fn update_password(&self, access_token: &str, password: &str) -> AppResult<AuthAccount>;

    /// Admin delete; requires the service-role key
    async fn delete_user(&self, user_id: Uuid) -> AppResult<()>;
}

/// GoTrue signup answers with a session when auto-confirm is on, a bare user otherwise
#[derive(Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Session(Session),
    User(AuthAccount),
}

impl From<SignupResponse> for SignupOutcome {
    fn from(response: SignupResponse) -> Self {
        match response {
            SignupResponse::Session(session) => SignupOutcome {
                user: session.user.clone(),
                session: Some(session),
            },
            SignupResponse::User(user) => SignupOutcome {
                user,
                session: None,
            },
        }
    }
}

/// Supabase Auth (GoTrue) over REST
#[derive(Clone)]
pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl AuthGateway for SupabaseAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> AppResult<SignupOutcome> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/signup", KeyRole::Anon, None)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "username": username },
            }));

        let response: SignupResponse = self.client.send_json(request).await?;
        let outcome = SignupOutcome::from(response);

        tracing::info!(
            user_id = %outcome.user.id,
            confirmed = outcome.session.is_some(),
            "Auth user created"
        );

        Ok(outcome)
    }

    async fn sign_in(&self, credentials: &Credentials) -> AppResult<Session> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token", KeyRole::Anon, None)
            .query(&[("grant_type", "password")])
            .json(credentials);

        // GoTrue answers bad credentials with 400 invalid_grant.
        self.client
            .send_json(request)
            .await
            .map_err(|e| match e {
                AppError::InvalidInput(msg) => AppError::Unauthorized(msg),
                other => other,
            })
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token", KeyRole::Anon, None)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        self.client
            .send_json(request)
            .await
            .map_err(|e| match e {
                AppError::InvalidInput(msg) => AppError::Unauthorized(msg),
                other => other,
            })
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let request = self.client.request(
            Method::POST,
            "/auth/v1/logout",
            KeyRole::Anon,
            Some(access_token),
        );

        self.client.send(request).await?;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, redirect_to: Option<&str>) -> AppResult<()> {
        let mut request = self
            .client
            .request(Method::POST, "/auth/v1/recover", KeyRole::Anon, None)
            .json(&json!({ "email": email }));

        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        self.client.send(request).await?;
        tracing::info!("Password reset email requested");
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> AppResult<AuthAccount> {
        let request = self
            .client
            .request(Method::PUT, "/auth/v1/user", KeyRole::Anon, Some(access_token))
            .json(&json!({ "password": password }));

        self.client.send_json(request).await
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        let path = format!("/auth/v1/admin/users/{}", user_id);
        let request = self
            .client
            .request(Method::DELETE, &path, KeyRole::Service, None);

        self.client.send(request).await?;
        tracing::info!(user_id = %user_id, "Auth user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_response_with_session() {
        let response: SignupResponse = serde_json::from_value(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {"id": "7c9e6679-7425-40de-944b-e07fc1f90ae7", "email": "ada@example.com"}
        }))
        .unwrap();

        let outcome = SignupOutcome::from(response);
        assert!(outcome.session.is_some());
        assert_eq!(outcome.user.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_signup_response_pending_confirmation() {
        let response: SignupResponse = serde_json::from_value(json!({
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "email": "ada@example.com",
            "confirmation_sent_at": "2026-10-15T10:00:00Z"
        }))
        .unwrap();

        let outcome = SignupOutcome::from(response);
        assert!(outcome.session.is_none());
        assert_eq!(
            outcome.user.id.to_string(),
            "7c9e6679-7425-40de-944b-e07fc1f90ae7"
        );
    }
}
