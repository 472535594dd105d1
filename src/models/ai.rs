use serde::{Deserialize, Serialize};

use super::MediaType;
use crate::error::{AppError, AppResult};

const MOOD_MAX: usize = 300;
const DEFAULT_COUNT: i64 = 5;
const MAX_COUNT: i64 = 10;

/// Body of `POST /api/ai/recommend`
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub mood: String,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    /// Any integer is accepted and clamped, so 300 asks for 10
    #[serde(default)]
    pub count: Option<i64>,
}

impl RecommendationRequest {
    /// Trims the mood and clamps the count to 1..=10.
    pub fn normalized(self) -> AppResult<Self> {
        let mood = self.mood.trim().to_string();
        if mood.is_empty() {
            return Err(AppError::InvalidInput("mood is required".to_string()));
        }
        if mood.chars().count() > MOOD_MAX {
            return Err(AppError::InvalidInput(format!(
                "mood must be at most {} characters",
                MOOD_MAX
            )));
        }

        Ok(Self {
            mood,
            media_type: self.media_type,
            count: Some(self.clamped_count()),
        })
    }

    /// Number of recommendations to ask for, within 1..=10
    pub fn result_count(&self) -> usize {
        // Clamped to a small positive range, so the cast cannot truncate.
        self.clamped_count() as usize
    }

    fn clamped_count(&self) -> i64 {
        self.count.unwrap_or(DEFAULT_COUNT).clamp(1, MAX_COUNT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    /// True when the canned fallback was served because the LLM quota is exhausted
    #[serde(default)]
    pub mock: bool,
}

/// Body of `POST /api/ai/summary`
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryResponse {
    pub summary: String,
    #[serde(default)]
    pub mock: bool,
}
