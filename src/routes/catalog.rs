use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{AuthUser, RequestId},
    models::{search_history::normalize_query, MediaDetails, MediaSummary, MediaType, Page, TimeWindow},
    routes::{
        extract::{AppPath, AppQuery},
        AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub window: TimeWindow,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

/// Handler for catalog search.
///
/// Signed-in callers get the query recorded in their search history.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: Option<AuthUser>,
    AppQuery(params): AppQuery<SearchParams>,
) -> AppResult<Json<Page<MediaSummary>>> {
    let query = normalize_query(&params.q)?;
    let page = params.page.unwrap_or(1);

    tracing::info!(
        request_id = %request_id,
        query = %query,
        page,
        provider = state.catalog.name(),
        "Processing catalog search"
    );

    let results = state.catalog.search(&query, page).await?;

    if let Some(user) = user {
        if page == 1 {
            if let Err(e) = state.store.add_search_history(user.id, &query).await {
                tracing::warn!(
                    request_id = %request_id,
                    user_id = %user.id,
                    error = %e,
                    "Failed to record search history"
                );
            }
        }
    }

    Ok(Json(results))
}

pub async fn details(
    State(state): State<Arc<AppState>>,
    AppPath((media_type, id)): AppPath<(String, u64)>,
) -> AppResult<Json<MediaDetails>> {
    let media_type: MediaType = media_type
        .parse()
        .map_err(|e: crate::models::UnknownVariant| AppError::InvalidInput(e.to_string()))?;

    let details = state.catalog.details(media_type, id).await?;
    Ok(Json(details))
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<TrendingParams>,
) -> AppResult<Json<Page<MediaSummary>>> {
    let results = state
        .catalog
        .trending(params.media_type, params.window)
        .await?;
    Ok(Json(results))
}

pub async fn anime(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<PageParams>,
) -> AppResult<Json<Page<MediaSummary>>> {
    let results = state.catalog.anime(params.page.unwrap_or(1)).await?;
    Ok(Json(results))
}
