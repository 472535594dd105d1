use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{Profile, ProfileUpdate},
    routes::{
        extract::{AppJson, AppPath},
        AppState,
    },
    services::account,
};

/// Multipart field carrying the image
const AVATAR_FIELD: &str = "avatar";

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Profile>> {
    state
        .store
        .get_profile(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("profile {} not found", id)))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(update): AppJson<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    let update = update.normalized()?;

    if let Some(username) = &update.username {
        if let Some(existing) = state.store.find_profile_by_username(username).await? {
            if existing.id != user.id {
                return Err(AppError::Conflict("username is already taken".to_string()));
            }
        }
    }

    state
        .store
        .update_profile(user.id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))
}

/// Handler for avatar uploads (multipart field `avatar`)
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Profile>> {
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput("avatar content type is required".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("failed to read avatar: {}", e)))?;

        let profile = account::upload_avatar(
            state.store.as_ref(),
            state.storage.as_ref(),
            &state.avatar_bucket,
            user.id,
            &content_type,
            data,
        )
        .await?;

        return Ok(Json(profile));
    }

    Err(AppError::InvalidInput(format!(
        "multipart field '{}' is required",
        AVATAR_FIELD
    )))
}
