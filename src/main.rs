use std::sync::Arc;

use moodreel_api::{
    config::Config,
    db::{self, create_pool, create_redis_client, Cache, PgStore},
    middleware::TokenVerifier,
    routes::{create_router, AppState},
    services::{OpenAiClient, SupabaseAuth, SupabaseClient, SupabaseStorage, TmdbProvider, VodScraper},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodreel_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    if config.run_migrations {
        db::postgres::run_migrations(&pool).await?;
    }

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client);

    let supabase = SupabaseClient::new(
        &config.supabase_url,
        config.supabase_anon_key.clone(),
        config.supabase_service_role_key.clone(),
    );

    let state = Arc::new(AppState {
        catalog: Arc::new(TmdbProvider::new(
            cache,
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
        )),
        auth: Arc::new(SupabaseAuth::new(supabase.clone())),
        storage: Arc::new(SupabaseStorage::new(supabase)),
        store: Arc::new(PgStore::new(pool)),
        llm: Arc::new(OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_api_url.clone(),
            config.openai_model.clone(),
        )),
        vod: Arc::new(VodScraper::new(&config.vod_base_url, &config.vod_country)?),
        tokens: Arc::new(TokenVerifier::new(&config.supabase_jwt_secret)),
        avatar_bucket: config.avatar_bucket.clone(),
    });

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
