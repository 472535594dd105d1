use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{Comment, CommentWithAuthor, MediaRef, NewComment},
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        AppState,
    },
};

pub async fn list(
    State(state): State<Arc<AppState>>,
    AppQuery(media): AppQuery<MediaRef>,
) -> AppResult<Json<Vec<CommentWithAuthor>>> {
    let comments = state
        .store
        .list_comments(media.media_id, media.media_type)
        .await?;
    Ok(Json(comments))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(comment): AppJson<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = comment.normalized()?;
    let created = state.store.create_comment(user.id, &comment).await?;

    tracing::info!(
        user_id = %user.id,
        comment_id = %created.id,
        media_id = created.media_id,
        "Comment posted"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// Only the author may delete a comment
pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let comment = state
        .store
        .get_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {} not found", id)))?;

    if comment.user_id != user.id {
        return Err(AppError::Forbidden(
            "you can only delete your own comments".to_string(),
        ));
    }

    if !state.store.delete_comment(id).await? {
        return Err(AppError::NotFound(format!("comment {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
