use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::{MediaType, UnknownVariant};
use crate::error::{AppError, AppResult};

/// Where a title sits in the user's viewing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watched,
    #[default]
    ToWatch,
    Watching,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Watched => "watched",
            WatchStatus::ToWatch => "to_watch",
            WatchStatus::Watching => "watching",
        }
    }
}

impl Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watched" => Ok(WatchStatus::Watched),
            "to_watch" => Ok(WatchStatus::ToWatch),
            "watching" => Ok(WatchStatus::Watching),
            other => Err(UnknownVariant {
                kind: "watch_status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for WatchStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A row of `watchlist_items`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: i64,
    #[sqlx(try_from = "String")]
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: WatchStatus,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/watchlist`
#[derive(Debug, Clone, Deserialize)]
pub struct NewWatchlistItem {
    pub media_id: i64,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub status: WatchStatus,
    #[serde(default)]
    pub favorite: bool,
}

impl NewWatchlistItem {
    pub fn validate(&self) -> AppResult<()> {
        if self.media_id <= 0 {
            return Err(AppError::InvalidInput(
                "media_id must be a positive TMDB id".to_string(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("title is required".to_string()));
        }
        Ok(())
    }
}

/// Body of `PATCH /api/watchlist/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchlistUpdate {
    pub status: Option<WatchStatus>,
    pub favorite: Option<bool>,
}

impl WatchlistUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if self.status.is_none() && self.favorite.is_none() {
            return Err(AppError::InvalidInput(
                "nothing to update: provide status and/or favorite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Query of `GET /api/watchlist`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchlistFilter {
    pub status: Option<WatchStatus>,
    pub favorite: Option<bool>,
}
