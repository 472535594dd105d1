use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const QUERY_MAX: usize = 200;
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/search-history`
#[derive(Debug, Clone, Deserialize)]
pub struct NewSearch {
    pub query: String,
}

/// Trims a search query and enforces 1..=200 characters.
pub fn normalize_query(raw: &str) -> AppResult<String> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("query cannot be empty".to_string()));
    }
    if query.chars().count() > QUERY_MAX {
        return Err(AppError::InvalidInput(format!(
            "query must be at most {} characters",
            QUERY_MAX
        )));
    }
    Ok(query.to_string())
}

/// Applies the default and clamps to the maximum page size.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}
