use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        search_history::{clamp_limit, normalize_query},
        NewSearch, SearchHistoryEntry,
    },
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(params): AppQuery<HistoryParams>,
) -> AppResult<Json<Vec<SearchHistoryEntry>>> {
    let entries = state
        .store
        .list_search_history(user.id, clamp_limit(params.limit))
        .await?;
    Ok(Json(entries))
}

pub async fn record(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(search): AppJson<NewSearch>,
) -> AppResult<(StatusCode, Json<SearchHistoryEntry>)> {
    let query = normalize_query(&search.query)?;
    let entry = state.store.add_search_history(user.id, &query).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn clear(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<StatusCode> {
    let removed = state.store.clear_search_history(user.id).await?;
    tracing::debug!(user_id = %user.id, removed, "Search history cleared");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if !state.store.delete_search_history_entry(user.id, id).await? {
        return Err(AppError::NotFound(format!("search history entry {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
