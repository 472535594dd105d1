use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MediaType;
use crate::error::{AppError, AppResult};

const COMMENT_MAX: usize = 1000;

/// A row of `comments`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: i64,
    #[sqlx(try_from = "String")]
    pub media_type: MediaType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's public profile fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub comment: Comment,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Identifies a catalog title in query strings
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MediaRef {
    pub media_id: i64,
    pub media_type: MediaType,
}

/// Body of `POST /api/comments`
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub media_id: i64,
    pub media_type: MediaType,
    pub content: String,
}

impl NewComment {
    /// Trims content and enforces 1..=1000 characters.
    pub fn normalized(self) -> AppResult<Self> {
        let content = self.content.trim().to_string();

        if content.is_empty() {
            return Err(AppError::InvalidInput("comment cannot be empty".to_string()));
        }
        if content.chars().count() > COMMENT_MAX {
            return Err(AppError::InvalidInput(format!(
                "comment must be at most {} characters",
                COMMENT_MAX
            )));
        }
        if self.media_id <= 0 {
            return Err(AppError::InvalidInput(
                "media_id must be a positive TMDB id".to_string(),
            ));
        }

        Ok(Self { content, ..self })
    }
}
