use axum::{extract::State, http::StatusCode, Extension};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{AuthUser, RequestId},
    routes::AppState,
    services::account,
};

/// Handler for account deletion
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
) -> AppResult<StatusCode> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user.id,
        "Processing account deletion"
    );

    account::delete_account(
        state.store.as_ref(),
        state.storage.as_ref(),
        state.auth.as_ref(),
        &state.avatar_bucket,
        user.id,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
