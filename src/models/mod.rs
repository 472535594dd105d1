use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod ai;
pub mod auth;
pub mod comment;
pub mod message;
pub mod profile;
pub mod search_history;
pub mod vod;
pub mod watchlist;

pub use ai::{
    Recommendation, RecommendationRequest, RecommendationResponse, SummaryRequest,
    SummaryResponse,
};
pub use auth::{AuthAccount, Credentials, Session, SignupOutcome, SignupRequest};
pub use comment::{Comment, CommentWithAuthor, MediaRef, NewComment};
pub use message::{ConversationSummary, Message, NewMessage};
pub use profile::{Profile, ProfileUpdate};
pub use search_history::{NewSearch, SearchHistoryEntry};
pub use vod::{VodOffer, VodResult};
pub use watchlist::{NewWatchlistItem, WatchStatus, WatchlistFilter, WatchlistItem, WatchlistUpdate};

/// A stored enum column held a value this build does not know
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Kind of catalog entry. Anime is a catalog filter, not a separate kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(UnknownVariant {
                kind: "media_type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for MediaType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Trending window supported by TMDB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeWindow::Day => f.write_str("day"),
            TimeWindow::Week => f.write_str("week"),
        }
    }
}

/// One entry of a search, trending or discover listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaSummary {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub original_language: Option<String>,
    pub genre_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Full record for a single movie or show
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaDetails {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    /// Minutes; for shows, the first listed episode runtime
    pub runtime: Option<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub genres: Vec<Genre>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub status: Option<String>,
    pub homepage: Option<String>,
    pub imdb_id: Option<String>,
}

/// Paged listing returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results: Vec<T>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged envelope used by every TMDB list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// List entry from /search/multi, /trending and /discover.
/// Movies carry `title`/`release_date`, shows carry `name`/`first_air_date`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbListItem {
    pub id: u64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl TmdbListItem {
    /// Converts to a summary. `fallback` is used by endpoints that do not tag
    /// results (discover); entries that are neither movie nor tv (people) are dropped.
    pub fn into_summary(self, fallback: Option<MediaType>) -> Option<MediaSummary> {
        let media_type = match self.media_type.as_deref() {
            Some(tag) => tag.parse().ok()?,
            None => fallback?,
        };

        let title = self.title.or(self.name)?;

        Some(MediaSummary {
            id: self.id,
            media_type,
            title,
            overview: non_empty(self.overview),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date: non_empty(self.release_date.or(self.first_air_date)),
            vote_average: self.vote_average,
            original_language: self.original_language,
            genre_ids: self.genre_ids,
        })
    }
}

/// Response of /movie/{id} and /tv/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

impl TmdbDetails {
    pub fn into_details(self, media_type: MediaType) -> MediaDetails {
        let title = self
            .title
            .or(self.name)
            .unwrap_or_else(|| format!("#{}", self.id));

        MediaDetails {
            id: self.id,
            media_type,
            title,
            original_title: self.original_title.or(self.original_name),
            overview: non_empty(self.overview),
            tagline: non_empty(self.tagline),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date: non_empty(self.release_date.or(self.first_air_date)),
            runtime: self.runtime.or(self.episode_run_time.first().copied()),
            number_of_seasons: self.number_of_seasons,
            number_of_episodes: self.number_of_episodes,
            genres: self.genres,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            status: self.status,
            homepage: non_empty(self.homepage),
            imdb_id: non_empty(self.imdb_id),
        }
    }
}

/// Error body TMDB returns alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorBody {
    #[serde(default)]
    pub status_code: Option<u32>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// TMDB sends "" for unknown dates and blank text fields
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
