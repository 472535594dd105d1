use axum::body::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::Profile,
    services::supabase::{AuthGateway, ObjectStorage},
};

pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Accepted avatar content types and the extension they are stored under
const AVATAR_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Extension for an accepted avatar content type
pub fn avatar_extension(content_type: &str) -> AppResult<&'static str> {
    let content_type = content_type.trim().to_ascii_lowercase();
    AVATAR_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| {
            AppError::InvalidInput("avatar must be a PNG, JPEG, WebP or GIF image".to_string())
        })
}

/// Stores a new avatar and points the profile at it.
///
/// Objects left under the user's folder with another extension are removed
/// best-effort once the profile is updated.
pub async fn upload_avatar(
    store: &dyn Store,
    storage: &dyn ObjectStorage,
    bucket: &str,
    user_id: Uuid,
    content_type: &str,
    data: Bytes,
) -> AppResult<Profile> {
    if data.is_empty() {
        return Err(AppError::InvalidInput("avatar file is empty".to_string()));
    }
    if data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::InvalidInput(format!(
            "avatar must be at most {} bytes",
            MAX_AVATAR_BYTES
        )));
    }
    let extension = avatar_extension(content_type)?;

    if store.get_profile(user_id).await?.is_none() {
        return Err(AppError::NotFound("profile not found".to_string()));
    }

    let file_name = format!("avatar.{}", extension);
    let path = format!("{}/{}", user_id, file_name);
    storage.upload(bucket, &path, data, content_type).await?;

    // The object path is stable, so bust CDN caches with a version parameter.
    let url = format!(
        "{}?v={}",
        storage.public_url(bucket, &path),
        Utc::now().timestamp()
    );
    let profile = store
        .set_avatar_url(user_id, &url)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))?;

    match storage.list(bucket, &user_id.to_string()).await {
        Ok(names) => {
            let stale: Vec<String> = names
                .into_iter()
                .filter(|name| *name != file_name)
                .map(|name| format!("{}/{}", user_id, name))
                .collect();
            if let Err(e) = storage.remove(bucket, &stale).await {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to remove stale avatars");
            }
        }
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Failed to list avatars"),
    }

    tracing::info!(user_id = %user_id, path = %path, "Avatar updated");

    Ok(profile)
}

/// Deletes every trace of the user: rows, avatar objects, then the auth account.
pub async fn delete_account(
    store: &dyn Store,
    storage: &dyn ObjectStorage,
    auth: &dyn AuthGateway,
    bucket: &str,
    user_id: Uuid,
) -> AppResult<()> {
    store.delete_user_data(user_id).await?;

    match storage.list(bucket, &user_id.to_string()).await {
        Ok(names) => {
            let paths: Vec<String> = names
                .into_iter()
                .map(|name| format!("{}/{}", user_id, name))
                .collect();
            if let Err(e) = storage.remove(bucket, &paths).await {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to remove avatar objects");
            }
        }
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Failed to list avatar objects"),
    }

    auth.delete_user(user_id).await?;

    tracing::info!(user_id = %user_id, "Account deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_extension() {
        assert_eq!(avatar_extension("image/png").unwrap(), "png");
        assert_eq!(avatar_extension("IMAGE/JPEG").unwrap(), "jpg");
        assert!(avatar_extension("image/svg+xml").is_err());
        assert!(avatar_extension("application/pdf").is_err());
    }
}
