use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use std::{fmt::Display, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, OnceCell},
    task::JoinHandle,
};

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::MediaType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Multi-search results for a query and page
    Search(String, u32),
    /// Title details for a media type and TMDB id
    Details(MediaType, u64),
    /// Trending list for an optional media type and a time window
    Trending(Option<MediaType>, String),
    /// Discover page of Japanese animation
    Anime(u32),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search(query, page) => {
                write!(f, "tmdb:search:{}:{}", query.trim().to_lowercase(), page)
            }
            CacheKey::Details(media_type, id) => write!(f, "tmdb:details:{}:{}", media_type, id),
            CacheKey::Trending(Some(media_type), window) => {
                write!(f, "tmdb:trending:{}:{}", media_type, window)
            }
            CacheKey::Trending(None, window) => write!(f, "tmdb:trending:all:{}", window),
            CacheKey::Anime(page) => write!(f, "tmdb:anime:{}", page),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Upper bound on writes sent in one pipeline
const MAX_WRITE_BATCH: usize = 64;

/// Bounds how long an unreachable Redis can stall a read or the final flush
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_RETRIES: usize = 1;

struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// One managed connection shared by readers and the writer, opened on first use
struct SharedConnection {
    client: Client,
    manager: OnceCell<ConnectionManager>,
}

impl SharedConnection {
    async fn get(&self) -> AppResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(CONNECT_RETRIES)
                    .set_connection_timeout(CONNECT_TIMEOUT)
                    .set_response_timeout(RESPONSE_TIMEOUT);
                ConnectionManager::new_with_config(self.client.clone(), config)
            })
            .await?;
        Ok(manager.clone())
    }
}

/// Read-through cache for catalog responses
#[derive(Clone)]
pub struct Cache {
    connection: Arc<SharedConnection>,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once pending writes are flushed
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    writer: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer and waits until its final flush has finished.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");

        if let Err(e) = self.writer.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl Cache {
    /// Creates the cache and spawns its writer. No connection is opened until
    /// the first read or write.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let connection = Arc::new(SharedConnection {
            client: redis_client,
            manager: OnceCell::new(),
        });

        let writer = tokio::spawn(Self::run_writer(connection.clone(), write_rx, shutdown_rx));

        let cache = Self {
            connection,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, writer })
    }

    async fn run_writer(
        connection: Arc<SharedConnection>,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");

        loop {
            tokio::select! {
                Some(first) = write_rx.recv() => {
                    // Whatever queued up meanwhile goes out in the same pipeline.
                    let mut batch = vec![first];
                    while batch.len() < MAX_WRITE_BATCH {
                        match write_rx.try_recv() {
                            Ok(next) => batch.push(next),
                            Err(_) => break,
                        }
                    }
                    Self::flush(&connection, &batch).await;
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut remaining = Vec::new();
                    while let Some(write) = write_rx.recv().await {
                        remaining.push(write);
                    }

                    let flushed = remaining.len();
                    for batch in remaining.chunks(MAX_WRITE_BATCH) {
                        Self::flush(&connection, batch).await;
                    }

                    tracing::info!(flushed, "Cache writer stopped");
                    break;
                }
            }
        }
    }

    async fn flush(connection: &SharedConnection, batch: &[PendingWrite]) {
        let count = batch.len();
        if let Err(e) = Self::write_batch(connection, batch).await {
            tracing::error!(error = %e, count, "Failed to write cache entries");
        }
    }

    async fn write_batch(connection: &SharedConnection, batch: &[PendingWrite]) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for write in batch {
            pipe.set_ex(&write.key, &write.value, write.ttl).ignore();
        }

        let mut conn = connection.get().await?;
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    /// Retrieves and deserializes a cached value, `None` on a miss.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.connection.get().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        let Some(json) = cached else {
            tracing::debug!(key = %key, "Cache miss");
            return Ok(None);
        };

        let data = serde_json::from_str(&json)
            .map_err(|e| AppError::Internal(format!("Corrupt cache entry {}: {}", key, e)))?;
        tracing::debug!(key = %key, "Cache hit");
        Ok(Some(data))
    }

    /// Queues a write for the background writer and returns immediately.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone, dropping write");
        }
    }
}
