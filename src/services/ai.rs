/// LLM-backed recommendations and summaries
///
/// The model sits behind `LanguageModel`; `OpenAiClient` talks to the Chat
/// Completions API. When the account's quota is exhausted the handlers serve
/// a canned response flagged `mock: true` instead of failing.
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{
        MediaType, Recommendation, RecommendationRequest, RecommendationResponse,
        SummaryRequest, SummaryResponse,
    },
};

const RECOMMEND_MAX_TOKENS: u32 = 800;
const SUMMARY_MAX_TOKENS: u32 = 300;

/// A single-turn chat completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the model for a JSON object response
    pub json_mode: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("LLM quota exhausted: {0}")]
    InsufficientQuota(String),
    #[error(transparent)]
    Other(#[from] AppError),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the assistant message content
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

// ============================================================================
// OpenAI client
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiErrorEnvelope {
    #[serde(default)]
    error: OpenAiError,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl OpenAiError {
    fn is_insufficient_quota(&self) -> bool {
        self.code.as_deref() == Some("insufficient_quota")
            || self.error_type.as_deref() == Some("insufficient_quota")
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

/// Classifies a failed completion call
fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    let error = serde_json::from_str::<OpenAiErrorEnvelope>(body)
        .map(|e| e.error)
        .unwrap_or_default();
    let message = if error.message.is_empty() {
        body.to_string()
    } else {
        error.message.clone()
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS if error.is_insufficient_quota() => {
            CompletionError::InsufficientQuota(message)
        }
        StatusCode::TOO_MANY_REQUESTS => AppError::QuotaExceeded(message).into(),
        StatusCode::UNAUTHORIZED => {
            AppError::ExternalApi(format!("OpenAI rejected the API key: {}", message)).into()
        }
        StatusCode::BAD_REQUEST => AppError::InvalidInput(message).into(),
        _ => AppError::ExternalApi(format!("OpenAI returned status {}: {}", status, message)).into(),
    }
}

#[async_trait::async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(AppError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_failure(status, &body);
            tracing::warn!(status = %status, error = %error, "Chat completion failed");
            return Err(error);
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(AppError::from)?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::ExternalApi("OpenAI returned an empty completion".to_string()))?;

        tracing::debug!(model = %self.model, chars = content.len(), "Chat completion received");

        Ok(content)
    }
}

// ============================================================================
// Recommendations and summaries
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecommendationPayload {
    Wrapped { recommendations: Vec<Recommendation> },
    Bare(Vec<Recommendation>),
}

/// Strips a surrounding ```json fence if the model added one
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses the model's answer into at most `count` recommendations
pub fn parse_recommendations(text: &str, count: usize) -> AppResult<Vec<Recommendation>> {
    let payload: RecommendationPayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AppError::ExternalApi(format!("Unreadable recommendations from model: {}", e)))?;

    let mut recommendations = match payload {
        RecommendationPayload::Wrapped { recommendations } => recommendations,
        RecommendationPayload::Bare(recommendations) => recommendations,
    };
    recommendations.retain(|r| !r.title.trim().is_empty());
    recommendations.truncate(count);

    if recommendations.is_empty() {
        return Err(AppError::ExternalApi(
            "Model returned no recommendations".to_string(),
        ));
    }

    Ok(recommendations)
}

fn recommendation_prompt(request: &RecommendationRequest, count: usize) -> CompletionRequest {
    let kind = match request.media_type {
        Some(MediaType::Movie) => "movies",
        Some(MediaType::Tv) => "TV shows or anime series",
        None => "movies, TV shows or anime",
    };

    CompletionRequest {
        system: "You are a film and television expert who recommends titles that fit a viewer's mood. \
                 Answer with a JSON object of the form \
                 {\"recommendations\":[{\"title\":string,\"year\":number,\"media_type\":\"movie\"|\"tv\",\"reason\":string}]}."
            .to_string(),
        user: format!(
            "Recommend {} {} for someone who feels: {}. Keep each reason to one sentence.",
            count, kind, request.mood
        ),
        json_mode: true,
        max_tokens: RECOMMEND_MAX_TOKENS,
        temperature: 0.8,
    }
}

fn summary_prompt(request: &SummaryRequest) -> CompletionRequest {
    let user = match request.overview.as_deref().map(str::trim) {
        Some(overview) if !overview.is_empty() => format!(
            "Summarize \"{}\" in three spoiler-free sentences. Synopsis: {}",
            request.title.trim(),
            overview
        ),
        _ => format!(
            "Summarize \"{}\" in three spoiler-free sentences.",
            request.title.trim()
        ),
    };

    CompletionRequest {
        system: "You write short, spoiler-free summaries of movies, TV shows and anime.".to_string(),
        user,
        json_mode: false,
        max_tokens: SUMMARY_MAX_TOKENS,
        temperature: 0.5,
    }
}

/// Canned list served when the LLM quota is exhausted
fn mock_recommendations(media_type: Option<MediaType>, count: usize) -> Vec<Recommendation> {
    let canned = [
        ("Spirited Away", 2001, MediaType::Movie, "A gentle, wondrous escape for any mood."),
        ("Paddington 2", 2017, MediaType::Movie, "Pure warmth and kindness, impossible not to smile."),
        ("Cowboy Bebop", 1998, MediaType::Tv, "Cool, melancholic and endlessly rewatchable."),
        ("The Grand Budapest Hotel", 2014, MediaType::Movie, "Witty and whimsical with a bittersweet heart."),
        ("Planet Earth II", 2016, MediaType::Tv, "Calming, awe-inspiring nature at its best."),
        ("Mushishi", 2005, MediaType::Tv, "Quiet, meditative episodes to slow down with."),
    ];

    canned
        .into_iter()
        .filter(|(_, _, kind, _)| media_type.map_or(true, |m| m == *kind))
        .take(count)
        .map(|(title, year, kind, reason)| Recommendation {
            title: title.to_string(),
            year: Some(year),
            media_type: Some(kind),
            reason: reason.to_string(),
        })
        .collect()
}

/// Mood-based recommendations
pub async fn recommend(
    model: &dyn LanguageModel,
    request: RecommendationRequest,
) -> AppResult<RecommendationResponse> {
    let request = request.normalized()?;
    let count = request.result_count();

    match model.complete(recommendation_prompt(&request, count)).await {
        Ok(text) => Ok(RecommendationResponse {
            recommendations: parse_recommendations(&text, count)?,
            mock: false,
        }),
        Err(CompletionError::InsufficientQuota(message)) => {
            tracing::warn!(error = %message, "LLM quota exhausted, serving canned recommendations");
            Ok(RecommendationResponse {
                recommendations: mock_recommendations(request.media_type, count),
                mock: true,
            })
        }
        Err(CompletionError::Other(e)) => Err(e),
    }
}

/// Short spoiler-free summary of a title
pub async fn summarize(
    model: &dyn LanguageModel,
    request: SummaryRequest,
) -> AppResult<SummaryResponse> {
    if request.title.trim().is_empty() {
        return Err(AppError::InvalidInput("title is required".to_string()));
    }

    match model.complete(summary_prompt(&request)).await {
        Ok(text) => Ok(SummaryResponse {
            summary: text.trim().to_string(),
            mock: false,
        }),
        Err(CompletionError::InsufficientQuota(message)) => {
            tracing::warn!(error = %message, "LLM quota exhausted, serving canned summary");
            Ok(SummaryResponse {
                summary: format!(
                    "AI summaries are temporarily unavailable. {}",
                    request
                        .overview
                        .as_deref()
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .unwrap_or("Check back soon for a summary of this title.")
                ),
                mock: true,
            })
        }
        Err(CompletionError::Other(e)) => Err(e),
    }
}
