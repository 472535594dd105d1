use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::VodResult,
    routes::{extract::AppQuery, AppState},
};

#[derive(Debug, Deserialize)]
pub struct VodParams {
    #[serde(default)]
    pub title: String,
}

/// Handler for streaming offer lookup
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppQuery(params): AppQuery<VodParams>,
) -> AppResult<Json<VodResult>> {
    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        "Looking up streaming offers"
    );

    let result = state.vod.lookup(&params.title).await?;

    tracing::debug!(
        request_id = %request_id,
        offers = result.offers.len(),
        source_url = %result.source_url,
        "Streaming offers found"
    );

    Ok(Json(result))
}
