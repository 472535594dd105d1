use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::Store,
    middleware::{make_span_with_request_id, request_id_middleware, TokenVerifier},
    services::{
        account::MAX_AVATAR_BYTES, AuthGateway, CatalogProvider, LanguageModel, ObjectStorage,
        VodLookup,
    },
};

pub mod account;
pub mod ai;
pub mod auth;
pub mod catalog;
pub mod comments;
pub mod extract;
pub mod messages;
pub mod profiles;
pub mod search_history;
pub mod vod;
pub mod watchlist;

/// Shared handles to every downstream the handlers call
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub auth: Arc<dyn AuthGateway>,
    pub storage: Arc<dyn ObjectStorage>,
    pub store: Arc<dyn Store>,
    pub llm: Arc<dyn LanguageModel>,
    pub vod: Arc<dyn VodLookup>,
    pub tokens: Arc<TokenVerifier>,
    pub avatar_bucket: String,
}

/// Creates the application router with all routes and layers
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        // Outermost first: the request id must exist before the trace span is built.
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Account lifecycle
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/password-reset", post(auth::request_password_reset))
        .route("/auth/password-update", post(auth::update_password))
        .route("/auth/me", get(auth::me))
        .route("/delete-account", delete(account::delete_account))
        // Profiles
        .route("/profiles/me", patch(profiles::update_me))
        .route(
            "/profiles/me/avatar",
            post(profiles::upload_avatar).layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + 64 * 1024)),
        )
        .route("/profiles/:id", get(profiles::get_profile))
        // Catalog
        .route("/catalog/search", get(catalog::search))
        .route("/catalog/trending", get(catalog::trending))
        .route("/catalog/anime", get(catalog::anime))
        .route("/catalog/:media_type/:id", get(catalog::details))
        .route("/vod", get(vod::lookup))
        // Watchlist
        .route("/watchlist", get(watchlist::list).post(watchlist::add))
        .route(
            "/watchlist/:id",
            patch(watchlist::update).delete(watchlist::remove),
        )
        // Comments
        .route("/comments", get(comments::list).post(comments::create))
        .route("/comments/:id", delete(comments::remove))
        // Messages
        .route("/messages", get(messages::thread).post(messages::send))
        .route("/messages/conversations", get(messages::conversations))
        // Search history
        .route(
            "/search-history",
            get(search_history::list)
                .post(search_history::record)
                .delete(search_history::clear),
        )
        .route("/search-history/:id", delete(search_history::remove))
        // AI
        .route("/ai/recommend", post(ai::recommend))
        .route("/ai/summary", post(ai::summary))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
