use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{ConversationSummary, Message, NewMessage},
    routes::{
        extract::{AppJson, AppQuery},
        AppState,
    },
    services::messaging,
};

#[derive(Debug, Deserialize)]
pub struct ThreadParams {
    pub with: Uuid,
}

pub async fn conversations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    let conversations = messaging::list_conversations(state.store.as_ref(), user.id).await?;
    Ok(Json(conversations))
}

/// Thread with one user, oldest first. Opening it marks incoming messages read.
pub async fn thread(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(params): AppQuery<ThreadParams>,
) -> AppResult<Json<Vec<Message>>> {
    let messages = messaging::open_thread(state.store.as_ref(), user.id, params.with).await?;
    Ok(Json(messages))
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(message): AppJson<NewMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let sent = messaging::send(state.store.as_ref(), user.id, message).await?;
    Ok((StatusCode::CREATED, Json(sent)))
}
