/// Media catalog abstraction
///
/// The catalog supplies everything users browse: search, title details,
/// trending lists and the anime shelf. TMDB is the only backing source today.
use crate::{
    error::AppResult,
    models::{MediaDetails, MediaSummary, MediaType, Page, TimeWindow},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// TMDB genre id for animation
pub const ANIMATION_GENRE_ID: u32 = 16;

#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search movies and shows by free text. People are filtered out.
    async fn search(&self, query: &str, page: u32) -> AppResult<Page<MediaSummary>>;

    /// Full details of a single title
    async fn details(&self, media_type: MediaType, id: u64) -> AppResult<MediaDetails>;

    /// Trending titles; `None` mixes movies and shows
    async fn trending(
        &self,
        media_type: Option<MediaType>,
        window: TimeWindow,
    ) -> AppResult<Page<MediaSummary>>;

    /// Japanese animated series ordered by popularity
    async fn anime(&self, page: u32) -> AppResult<Page<MediaSummary>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
