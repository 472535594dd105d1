use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{NewWatchlistItem, WatchlistFilter, WatchlistItem, WatchlistUpdate},
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        AppState,
    },
};

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppQuery(filter): AppQuery<WatchlistFilter>,
) -> AppResult<Json<Vec<WatchlistItem>>> {
    let items = state.store.list_watchlist(user.id, &filter).await?;
    Ok(Json(items))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(item): AppJson<NewWatchlistItem>,
) -> AppResult<(StatusCode, Json<WatchlistItem>)> {
    item.validate()?;
    let item = NewWatchlistItem {
        title: item.title.trim().to_string(),
        ..item
    };

    let created = state.store.add_watchlist_item(user.id, &item).await?;
    tracing::info!(user_id = %user.id, item_id = %created.id, "Watchlist item added");

    Ok((StatusCode::CREATED, Json(created)))
}

/// Rows owned by another user answer 404, same as missing rows
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<WatchlistUpdate>,
) -> AppResult<Json<WatchlistItem>> {
    update.validate()?;

    state
        .store
        .update_watchlist_item(user.id, id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("watchlist item {} not found", id)))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if !state.store.delete_watchlist_item(user.id, id).await? {
        return Err(AppError::NotFound(format!("watchlist item {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
