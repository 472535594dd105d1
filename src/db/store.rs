/// Relational persistence seam
///
/// Every user-owned operation takes the caller's id and scopes the query to
/// it, so a row owned by someone else behaves exactly like a missing row.
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Comment, CommentWithAuthor, MediaType, Message, NewComment, NewMessage,
        NewWatchlistItem, Profile, ProfileUpdate, SearchHistoryEntry, WatchlistFilter,
        WatchlistItem, WatchlistUpdate,
    },
};

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // Profiles

    /// Inserts a profile; a taken username yields `AppError::Conflict`.
    async fn create_profile(&self, id: Uuid, username: &str) -> AppResult<Profile>;

    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;

    async fn find_profile_by_username(&self, username: &str) -> AppResult<Option<Profile>>;

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<Option<Profile>>;

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> AppResult<Option<Profile>>;

    // Watchlist

    /// Newest first
    async fn list_watchlist(
        &self,
        user_id: Uuid,
        filter: &WatchlistFilter,
    ) -> AppResult<Vec<WatchlistItem>>;

    /// A second entry for the same title yields `AppError::Conflict`.
    async fn add_watchlist_item(
        &self,
        user_id: Uuid,
        item: &NewWatchlistItem,
    ) -> AppResult<WatchlistItem>;

    async fn update_watchlist_item(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &WatchlistUpdate,
    ) -> AppResult<Option<WatchlistItem>>;

    /// Returns false when nothing owned by `user_id` matched
    async fn delete_watchlist_item(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;

    // Comments

    /// Oldest first
    async fn list_comments(
        &self,
        media_id: i64,
        media_type: MediaType,
    ) -> AppResult<Vec<CommentWithAuthor>>;

    async fn create_comment(&self, user_id: Uuid, comment: &NewComment) -> AppResult<Comment>;

    async fn get_comment(&self, id: Uuid) -> AppResult<Option<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> AppResult<bool>;

    // Messages

    async fn send_message(&self, sender_id: Uuid, message: &NewMessage) -> AppResult<Message>;

    /// Both directions, oldest first
    async fn messages_between(&self, user_id: Uuid, other_id: Uuid) -> AppResult<Vec<Message>>;

    /// Everything sent or received by the user, newest first
    async fn messages_for_user(&self, user_id: Uuid) -> AppResult<Vec<Message>>;

    /// Marks unread messages from `sender_id` to `receiver_id` as read
    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> AppResult<u64>;

    // Search history

    /// Newest first
    async fn list_search_history(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<SearchHistoryEntry>>;

    async fn add_search_history(&self, user_id: Uuid, query: &str)
        -> AppResult<SearchHistoryEntry>;

    async fn delete_search_history_entry(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;

    async fn clear_search_history(&self, user_id: Uuid) -> AppResult<u64>;

    // Account

    /// Removes every row belonging to the user, profile last
    async fn delete_user_data(&self, user_id: Uuid) -> AppResult<()>;
}
