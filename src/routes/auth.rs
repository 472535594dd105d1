use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{AuthUser, RequestId},
    models::{
        auth::{validate_email, validate_password},
        AuthAccount, Credentials, Profile, Session, SignupOutcome, SignupRequest,
    },
    routes::{extract::AppJson, AppState},
};

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    #[serde(flatten)]
    pub outcome: SignupOutcome,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordUpdateRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: uuid::Uuid,
    pub email: Option<String>,
    pub profile: Option<Profile>,
}

/// Registers an auth user and creates their profile
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let request = request.normalized()?;

    // Checked up front so a taken name does not leave an orphaned auth user.
    if state
        .store
        .find_profile_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("username is already taken".to_string()));
    }

    let outcome = state
        .auth
        .sign_up(&request.email, &request.password, &request.username)
        .await?;
    let profile = state
        .store
        .create_profile(outcome.user.id, &request.username)
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %profile.id,
        "User signed up"
    );

    Ok((StatusCode::CREATED, Json(SignupResponse { outcome, profile })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<Json<Session>> {
    let credentials = credentials.normalized()?;
    let session = state.auth.sign_in(&credentials).await?;
    Ok(Json(session))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<RefreshRequest>,
) -> AppResult<Json<Session>> {
    if request.refresh_token.trim().is_empty() {
        return Err(AppError::InvalidInput("refresh_token is required".to_string()));
    }
    let session = state.auth.refresh(request.refresh_token.trim()).await?;
    Ok(Json(session))
}

pub async fn logout(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<StatusCode> {
    state.auth.sign_out(&user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Always answers the same way for known and unknown emails
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<PasswordResetRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let email = validate_email(&request.email)?;
    state
        .auth
        .send_password_reset(&email, request.redirect_to.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "message": "If an account exists for that email, a reset link has been sent"
    })))
}

pub async fn update_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<PasswordUpdateRequest>,
) -> AppResult<Json<AuthAccount>> {
    validate_password(&request.password)?;
    let account = state
        .auth
        .update_password(&user.token, &request.password)
        .await?;

    tracing::info!(user_id = %user.id, "Password updated");
    Ok(Json(account))
}

pub async fn me(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<Json<MeResponse>> {
    let profile = state.store.get_profile(user.id).await?;
    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        profile,
    }))
}
