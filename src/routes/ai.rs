use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResponse, SummaryRequest, SummaryResponse},
    routes::{extract::AppJson, AppState},
    services::ai,
};

/// Handler for mood-based recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppJson(request): AppJson<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        media_type = ?request.media_type,
        count = ?request.count,
        "Processing recommendation request"
    );

    let response = ai::recommend(state.llm.as_ref(), request).await?;

    tracing::info!(
        request_id = %request_id,
        results = response.recommendations.len(),
        mock = response.mock,
        "Recommendations generated"
    );

    Ok(Json(response))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SummaryRequest>,
) -> AppResult<Json<SummaryResponse>> {
    let response = ai::summarize(state.llm.as_ref(), request).await?;
    Ok(Json(response))
}
