#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use moodreel_api::{
    db::Store,
    error::{AppError, AppResult},
    middleware::{auth::Claims, TokenVerifier},
    models::{
        AuthAccount, Comment, CommentWithAuthor, Credentials, MediaDetails, MediaSummary,
        MediaType, Message, NewComment, NewMessage, NewWatchlistItem, Page, Profile,
        ProfileUpdate, SearchHistoryEntry, Session, SignupOutcome, TimeWindow, VodOffer,
        VodResult, WatchlistFilter, WatchlistItem, WatchlistUpdate,
    },
    routes::{create_router, AppState},
    services::{
        ai::{CompletionError, CompletionRequest},
        AuthGateway, CatalogProvider, LanguageModel, ObjectStorage, VodLookup,
    },
};

pub const JWT_SECRET: &str = "test-jwt-secret-with-at-least-32-characters";
pub const GOOD_PASSWORD: &str = "correct-horse";
pub const AVATAR_BUCKET: &str = "avatars";

// ============================================================================
// Store
// ============================================================================

/// Same predicate as PgStore's optional `status` / `favorite` conditions
fn passes_filter(filter: &WatchlistFilter, item: &WatchlistItem) -> bool {
    filter.status.map_or(true, |s| item.status == s)
        && filter.favorite.map_or(true, |f| item.favorite == f)
}

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    watchlist: Vec<WatchlistItem>,
    comments: Vec<Comment>,
    messages: Vec<Message>,
    history: Vec<SearchHistoryEntry>,
}

/// Rows kept in insertion order; "newest first" reads them backwards
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn history_len(&self, user_id: Uuid) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.history.iter().filter(|h| h.user_id == user_id).count()
    }

    pub fn row_count(&self, user_id: Uuid) -> usize {
        let t = self.tables.lock().unwrap();
        t.profiles.iter().filter(|p| p.id == user_id).count()
            + t.watchlist.iter().filter(|w| w.user_id == user_id).count()
            + t.comments.iter().filter(|c| c.user_id == user_id).count()
            + t.messages
                .iter()
                .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
                .count()
            + t.history.iter().filter(|h| h.user_id == user_id).count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_profile(&self, id: Uuid, username: &str) -> AppResult<Profile> {
        let mut t = self.tables.lock().unwrap();
        if t
            .profiles
            .iter()
            .any(|p| p.username.eq_ignore_ascii_case(username))
        {
            return Err(AppError::Conflict("username is already taken".to_string()));
        }
        let now = Utc::now();
        let profile = Profile {
            id,
            username: username.to_string(),
            avatar_url: None,
            bio: None,
            created_at: now,
            updated_at: now,
        };
        t.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let t = self.tables.lock().unwrap();
        Ok(t.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn find_profile_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .profiles
            .iter()
            .find(|p| p.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<Option<Profile>> {
        let mut t = self.tables.lock().unwrap();
        let Some(profile) = t.profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(username) = &update.username {
            profile.username = username.clone();
        }
        if let Some(bio) = &update.bio {
            profile.bio = if bio.is_empty() { None } else { Some(bio.clone()) };
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> AppResult<Option<Profile>> {
        let mut t = self.tables.lock().unwrap();
        let Some(profile) = t.profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        profile.avatar_url = Some(avatar_url.to_string());
        Ok(Some(profile.clone()))
    }

    async fn list_watchlist(
        &self,
        user_id: Uuid,
        filter: &WatchlistFilter,
    ) -> AppResult<Vec<WatchlistItem>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .watchlist
            .iter()
            .rev()
            .filter(|w| w.user_id == user_id && passes_filter(filter, w))
            .cloned()
            .collect())
    }

    async fn add_watchlist_item(
        &self,
        user_id: Uuid,
        item: &NewWatchlistItem,
    ) -> AppResult<WatchlistItem> {
        let mut t = self.tables.lock().unwrap();
        if t.watchlist.iter().any(|w| {
            w.user_id == user_id && w.media_id == item.media_id && w.media_type == item.media_type
        }) {
            return Err(AppError::Conflict(
                "title is already on your watchlist".to_string(),
            ));
        }
        let now = Utc::now();
        let row = WatchlistItem {
            id: Uuid::new_v4(),
            user_id,
            media_id: item.media_id,
            media_type: item.media_type,
            title: item.title.clone(),
            poster_path: item.poster_path.clone(),
            status: item.status,
            favorite: item.favorite,
            created_at: now,
            updated_at: now,
        };
        t.watchlist.push(row.clone());
        Ok(row)
    }

    async fn update_watchlist_item(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &WatchlistUpdate,
    ) -> AppResult<Option<WatchlistItem>> {
        let mut t = self.tables.lock().unwrap();
        let Some(row) = t
            .watchlist
            .iter_mut()
            .find(|w| w.id == id && w.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            row.status = status;
        }
        if let Some(favorite) = update.favorite {
            row.favorite = favorite;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_watchlist_item(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.watchlist.len();
        t.watchlist.retain(|w| !(w.id == id && w.user_id == user_id));
        Ok(t.watchlist.len() < before)
    }

    async fn list_comments(
        &self,
        media_id: i64,
        media_type: MediaType,
    ) -> AppResult<Vec<CommentWithAuthor>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .comments
            .iter()
            .filter(|c| c.media_id == media_id && c.media_type == media_type)
            .map(|c| {
                let author = t.profiles.iter().find(|p| p.id == c.user_id);
                CommentWithAuthor {
                    comment: c.clone(),
                    username: author.map(|p| p.username.clone()),
                    avatar_url: author.and_then(|p| p.avatar_url.clone()),
                }
            })
            .collect())
    }

    async fn create_comment(&self, user_id: Uuid, comment: &NewComment) -> AppResult<Comment> {
        let mut t = self.tables.lock().unwrap();
        let row = Comment {
            id: Uuid::new_v4(),
            user_id,
            media_id: comment.media_id,
            media_type: comment.media_type,
            content: comment.content.clone(),
            created_at: Utc::now(),
        };
        t.comments.push(row.clone());
        Ok(row)
    }

    async fn get_comment(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let t = self.tables.lock().unwrap();
        Ok(t.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_comment(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.comments.len();
        t.comments.retain(|c| c.id != id);
        Ok(t.comments.len() < before)
    }

    async fn send_message(&self, sender_id: Uuid, message: &NewMessage) -> AppResult<Message> {
        let mut t = self.tables.lock().unwrap();
        let row = Message {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            read: false,
            created_at: Utc::now(),
        };
        t.messages.push(row.clone());
        Ok(row)
    }

    async fn messages_between(&self, user_id: Uuid, other_id: Uuid) -> AppResult<Vec<Message>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_id && m.receiver_id == other_id)
                    || (m.sender_id == other_id && m.receiver_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn messages_for_user(&self, user_id: Uuid) -> AppResult<Vec<Message>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .messages
            .iter()
            .rev()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> AppResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let mut marked = 0;
        for m in t
            .messages
            .iter_mut()
            .filter(|m| m.receiver_id == receiver_id && m.sender_id == sender_id && !m.read)
        {
            m.read = true;
            marked += 1;
        }
        Ok(marked)
    }

    async fn list_search_history(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<SearchHistoryEntry>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .history
            .iter()
            .rev()
            .filter(|h| h.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn add_search_history(
        &self,
        user_id: Uuid,
        query: &str,
    ) -> AppResult<SearchHistoryEntry> {
        let mut t = self.tables.lock().unwrap();
        let row = SearchHistoryEntry {
            id: Uuid::new_v4(),
            user_id,
            query: query.to_string(),
            created_at: Utc::now(),
        };
        t.history.push(row.clone());
        Ok(row)
    }

    async fn delete_search_history_entry(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.history.len();
        t.history.retain(|h| !(h.id == id && h.user_id == user_id));
        Ok(t.history.len() < before)
    }

    async fn clear_search_history(&self, user_id: Uuid) -> AppResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let before = t.history.len();
        t.history.retain(|h| h.user_id != user_id);
        Ok((before - t.history.len()) as u64)
    }

    async fn delete_user_data(&self, user_id: Uuid) -> AppResult<()> {
        let mut t = self.tables.lock().unwrap();
        t.history.retain(|h| h.user_id != user_id);
        t.comments.retain(|c| c.user_id != user_id);
        t.messages
            .retain(|m| m.sender_id != user_id && m.receiver_id != user_id);
        t.watchlist.retain(|w| w.user_id != user_id);
        t.profiles.retain(|p| p.id != user_id);
        Ok(())
    }
}

// ============================================================================
// Auth and storage
// ============================================================================

#[derive(Default)]
pub struct FakeAuth {
    pub deleted: Mutex<Vec<Uuid>>,
}

fn session_for(user: AuthAccount) -> Session {
    Session {
        access_token: mint_token(user.id),
        refresh_token: "refresh-token".to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        user,
    }
}

#[async_trait]
impl AuthGateway for FakeAuth {
    async fn sign_up(&self, email: &str, _password: &str, _username: &str) -> AppResult<SignupOutcome> {
        let user = AuthAccount {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        Ok(SignupOutcome {
            session: Some(session_for(user.clone())),
            user,
        })
    }

    async fn sign_in(&self, credentials: &Credentials) -> AppResult<Session> {
        if credentials.password != GOOD_PASSWORD {
            return Err(AppError::Unauthorized("Invalid login credentials".to_string()));
        }
        Ok(session_for(AuthAccount {
            id: Uuid::new_v4(),
            email: Some(credentials.email.clone()),
        }))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        if refresh_token != "refresh-token" {
            return Err(AppError::Unauthorized("Invalid Refresh Token".to_string()));
        }
        Ok(session_for(AuthAccount {
            id: Uuid::new_v4(),
            email: None,
        }))
    }

    async fn sign_out(&self, _access_token: &str) -> AppResult<()> {
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str, _redirect_to: Option<&str>) -> AppResult<()> {
        Ok(())
    }

    async fn update_password(&self, _access_token: &str, _password: &str) -> AppResult<AuthAccount> {
        Ok(AuthAccount {
            id: Uuid::new_v4(),
            email: None,
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        self.deleted.lock().unwrap().push(user_id);
        Ok(())
    }
}

/// Objects keyed by `bucket/path`
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, bucket: &str, path: &str, data: Bytes, _content_type: &str) -> AppResult<()> {
        let mut objects = self.objects.lock().unwrap();
        objects.retain(|(b, p, _)| !(b == bucket && p == path));
        objects.push((bucket.to_string(), path.to_string(), data.len()));
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>> {
        let folder = format!("{}/", prefix.trim_end_matches('/'));
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .iter()
            .filter(|(b, _, _)| b == bucket)
            .filter_map(|(_, p, _)| p.strip_prefix(&folder).map(str::to_string))
            .collect())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> AppResult<()> {
        let mut objects = self.objects.lock().unwrap();
        objects.retain(|(b, p, _)| !(b == bucket && paths.contains(p)));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.test/{}/{}", bucket, path)
    }
}

// ============================================================================
// Catalog, LLM and VOD
// ============================================================================

pub fn summary(id: u64, title: &str, media_type: MediaType) -> MediaSummary {
    MediaSummary {
        id,
        media_type,
        title: title.to_string(),
        overview: None,
        poster_path: None,
        backdrop_path: None,
        release_date: None,
        vote_average: None,
        original_language: Some("en".to_string()),
        genre_ids: vec![],
    }
}

fn page(results: Vec<MediaSummary>) -> Page<MediaSummary> {
    Page {
        page: 1,
        total_pages: 1,
        total_results: results.len() as u32,
        results,
    }
}

pub struct FakeCatalog;

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn search(&self, query: &str, _page: u32) -> AppResult<Page<MediaSummary>> {
        if query.eq_ignore_ascii_case("matrix") {
            return Ok(page(vec![summary(603, "The Matrix", MediaType::Movie)]));
        }
        Ok(page(vec![]))
    }

    async fn details(&self, media_type: MediaType, id: u64) -> AppResult<MediaDetails> {
        if id != 603 || media_type != MediaType::Movie {
            return Err(AppError::NotFound(format!("{} {} not found", media_type, id)));
        }
        Ok(MediaDetails {
            id,
            media_type,
            title: "The Matrix".to_string(),
            original_title: None,
            overview: Some("A hacker learns the truth.".to_string()),
            tagline: None,
            poster_path: None,
            backdrop_path: None,
            release_date: Some("1999-03-30".to_string()),
            runtime: Some(136),
            number_of_seasons: None,
            number_of_episodes: None,
            genres: vec![],
            vote_average: Some(8.2),
            vote_count: None,
            status: None,
            homepage: None,
            imdb_id: None,
        })
    }

    async fn trending(
        &self,
        media_type: Option<MediaType>,
        _window: TimeWindow,
    ) -> AppResult<Page<MediaSummary>> {
        let all = vec![
            summary(603, "The Matrix", MediaType::Movie),
            summary(1396, "Breaking Bad", MediaType::Tv),
        ];
        Ok(page(
            all.into_iter()
                .filter(|s| media_type.map_or(true, |m| m == s.media_type))
                .collect(),
        ))
    }

    async fn anime(&self, _page: u32) -> AppResult<Page<MediaSummary>> {
        Ok(page(vec![summary(31910, "Naruto Shippuden", MediaType::Tv)]))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Canned model behaviour
#[derive(Clone)]
pub enum LlmReply {
    Text(String),
    QuotaExhausted,
    RateLimited,
}

pub struct FakeLlm {
    pub reply: LlmReply,
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        match &self.reply {
            LlmReply::Text(text) => Ok(text.clone()),
            LlmReply::QuotaExhausted => Err(CompletionError::InsufficientQuota(
                "You exceeded your current quota".to_string(),
            )),
            LlmReply::RateLimited => Err(CompletionError::Other(AppError::QuotaExceeded(
                "Rate limit reached".to_string(),
            ))),
        }
    }
}

pub struct FakeVod;

#[async_trait]
impl VodLookup for FakeVod {
    async fn lookup(&self, title: &str) -> AppResult<VodResult> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("title is required".to_string()));
        }
        if title != "The Matrix" {
            return Err(AppError::NotFound(format!(
                "No streaming results found for \"{}\"",
                title
            )));
        }
        Ok(VodResult {
            title: title.to_string(),
            source_url: "https://vod.test/us/movie/the-matrix".to_string(),
            offers: vec![VodOffer {
                service: "Max".to_string(),
                url: "https://play.max.com/movie/the-matrix".to_string(),
                price: None,
                currency: None,
            }],
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub auth: Arc<FakeAuth>,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_llm(LlmReply::Text(
            r#"{"recommendations":[{"title":"Paddington 2","year":2017,"media_type":"movie","reason":"Warm and funny"}]}"#
                .to_string(),
        ))
    }

    pub fn with_llm(reply: LlmReply) -> Self {
        let store = Arc::new(MemoryStore::default());
        let auth = Arc::new(FakeAuth::default());
        let storage = Arc::new(MemoryStorage::default());

        let state = Arc::new(AppState {
            catalog: Arc::new(FakeCatalog),
            auth: auth.clone(),
            storage: storage.clone(),
            store: store.clone(),
            llm: Arc::new(FakeLlm { reply }),
            vod: Arc::new(FakeVod),
            tokens: Arc::new(TokenVerifier::new(JWT_SECRET)),
            avatar_bucket: AVATAR_BUCKET.to_string(),
        });

        let server = TestServer::new(create_router(state)).unwrap();

        Self {
            server,
            store,
            auth,
            storage,
        }
    }

    /// Creates a profile directly and returns its id with a valid token
    pub async fn user(&self, username: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        self.store.create_profile(id, username).await.unwrap();
        (id, mint_token(id))
    }
}

pub fn mint_token(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id,
        email: Some(format!("{}@example.com", user_id.simple())),
        role: Some("authenticated".to_string()),
        aud: "authenticated".to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}
