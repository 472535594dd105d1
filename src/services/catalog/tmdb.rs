/// TMDB catalog provider
///
/// API Flow:
/// 1. Search: /search/multi -> mixed movie/tv/person results (people dropped)
/// 2. Details: /{movie|tv}/{id}
/// 3. Trending: /trending/{all|movie|tv}/{day|week}
/// 4. Anime: /discover/tv with the animation genre and Japanese origin
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        MediaDetails, MediaSummary, MediaType, Page, TimeWindow, TmdbDetails, TmdbErrorBody,
        TmdbListItem, TmdbPage,
    },
    services::catalog::{CatalogProvider, ANIMATION_GENRE_ID},
};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const LIST_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 86400; // 1 day
const MAX_PAGE: u32 = 500;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// GETs a TMDB path and decodes the body, mapping TMDB errors
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await?;

        Self::check_status(path, response).await?.json().await.map_err(AppError::from)
    }

    async fn check_status(path: &str, response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<TmdbErrorBody>(&body)
            .ok()
            .and_then(|b| b.status_message)
            .unwrap_or(body);

        tracing::warn!(path = %path, status = %status, message = %message, "TMDB request failed");

        Err(match status {
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::UNAUTHORIZED => {
                AppError::ExternalApi(format!("TMDB rejected the API key: {}", message))
            }
            _ => AppError::ExternalApi(format!("TMDB returned status {}: {}", status, message)),
        })
    }
}

fn validate_page(page: u32) -> AppResult<u32> {
    if page == 0 || page > MAX_PAGE {
        return Err(AppError::InvalidInput(format!(
            "page must be between 1 and {}",
            MAX_PAGE
        )));
    }
    Ok(page)
}

/// Converts a TMDB page, dropping entries that are not movies or shows
fn into_page(raw: TmdbPage<TmdbListItem>, fallback: Option<MediaType>) -> Page<MediaSummary> {
    let results = raw
        .results
        .into_iter()
        .filter_map(|item| item.into_summary(fallback))
        .collect();

    Page {
        page: raw.page,
        total_pages: raw.total_pages,
        total_results: raw.total_results,
        results,
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn search(&self, query: &str, page: u32) -> AppResult<Page<MediaSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        let page = validate_page(page)?;

        cached!(
            self.cache,
            CacheKey::Search(query.to_string(), page),
            SEARCH_CACHE_TTL,
            async move {
                let raw: TmdbPage<TmdbListItem> = self
                    .get_json(
                        "/search/multi",
                        &[
                            ("query", query.to_string()),
                            ("page", page.to_string()),
                            ("include_adult", "false".to_string()),
                        ],
                    )
                    .await?;

                let results = into_page(raw, None);

                tracing::info!(
                    query = %query,
                    page,
                    results = results.results.len(),
                    provider = "tmdb",
                    "Catalog search completed"
                );

                Ok::<_, AppError>(results)
            }
        )
    }

    async fn details(&self, media_type: MediaType, id: u64) -> AppResult<MediaDetails> {
        cached!(
            self.cache,
            CacheKey::Details(media_type, id),
            DETAILS_CACHE_TTL,
            async move {
                let path = format!("/{}/{}", media_type, id);
                let raw: TmdbDetails = self.get_json(&path, &[]).await?;
                let details = raw.into_details(media_type);

                tracing::info!(
                    media_type = %media_type,
                    id,
                    title = %details.title,
                    provider = "tmdb",
                    "Details fetched"
                );

                Ok::<_, AppError>(details)
            }
        )
    }

    async fn trending(
        &self,
        media_type: Option<MediaType>,
        window: TimeWindow,
    ) -> AppResult<Page<MediaSummary>> {
        cached!(
            self.cache,
            CacheKey::Trending(media_type, window.to_string()),
            LIST_CACHE_TTL,
            async move {
                let segment = media_type.map(|m| m.as_str()).unwrap_or("all");
                let path = format!("/trending/{}/{}", segment, window);
                let raw: TmdbPage<TmdbListItem> = self.get_json(&path, &[]).await?;

                Ok::<_, AppError>(into_page(raw, media_type))
            }
        )
    }

    async fn anime(&self, page: u32) -> AppResult<Page<MediaSummary>> {
        let page = validate_page(page)?;

        cached!(
            self.cache,
            CacheKey::Anime(page),
            LIST_CACHE_TTL,
            async move {
                let raw: TmdbPage<TmdbListItem> = self
                    .get_json(
                        "/discover/tv",
                        &[
                            ("with_genres", ANIMATION_GENRE_ID.to_string()),
                            ("with_original_language", "ja".to_string()),
                            ("sort_by", "popularity.desc".to_string()),
                            ("page", page.to_string()),
                        ],
                    )
                    .await?;

                Ok::<_, AppError>(into_page(raw, Some(MediaType::Tv)))
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
