/// Read-through caching around an async block.
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues the result for a background write with `$ttl` seconds
/// to live, and returns it. A failed cache read counts as a miss. Must be
/// used inside a function returning `AppResult`.
///
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Anime(page), LIST_CACHE_TTL, async move {
///     self.fetch_anime(page).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, fetching upstream");
                None
            }
        };

        match hit {
            Some(cached) => Ok(cached),
            None => {
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
