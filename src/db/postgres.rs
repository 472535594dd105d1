use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        Comment, CommentWithAuthor, MediaType, Message, NewComment, NewMessage,
        NewWatchlistItem, Profile, ProfileUpdate, SearchHistoryEntry, WatchlistFilter,
        WatchlistItem, WatchlistUpdate,
    },
};

/// Creates a PostgreSQL connection pool against the project database
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Turns a unique-constraint violation into a 409 with `message`
fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// `Store` backed by the Supabase Postgres instance
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_profile(&self, id: Uuid, username: &str) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, username)
            VALUES ($1, $2)
            RETURNING id, username, avatar_url, bio, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username is already taken"))
    }

    async fn get_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, username, avatar_url, bio, created_at, updated_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn find_profile_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, username, avatar_url, bio, created_at, updated_at
            FROM profiles
            WHERE lower(username) = lower($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, username, avatar_url, bio, created_at, updated_at
            FROM profiles
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<Option<Profile>> {
        // An empty bio clears the column; NULL leaves it untouched.
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET username = COALESCE($2, username),
                bio = CASE
                    WHEN $3::text IS NULL THEN bio
                    WHEN $3::text = '' THEN NULL
                    ELSE $3::text
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, username, avatar_url, bio, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.username.as_deref())
        .bind(update.bio.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username is already taken"))
    }

    async fn set_avatar_url(&self, id: Uuid, avatar_url: &str) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET avatar_url = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, username, avatar_url, bio, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn list_watchlist(
        &self,
        user_id: Uuid,
        filter: &WatchlistFilter,
    ) -> AppResult<Vec<WatchlistItem>> {
        let items = sqlx::query_as::<_, WatchlistItem>(
            r#"
            SELECT id, user_id, media_id, media_type, title, poster_path, status, favorite,
                   created_at, updated_at
            FROM watchlist_items
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2::text)
              AND ($3::bool IS NULL OR favorite = $3::bool)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.favorite)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn add_watchlist_item(
        &self,
        user_id: Uuid,
        item: &NewWatchlistItem,
    ) -> AppResult<WatchlistItem> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            INSERT INTO watchlist_items
                (id, user_id, media_id, media_type, title, poster_path, status, favorite)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, media_id, media_type, title, poster_path, status, favorite,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(item.media_id)
        .bind(item.media_type.as_str())
        .bind(item.title.trim())
        .bind(item.poster_path.as_deref())
        .bind(item.status.as_str())
        .bind(item.favorite)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "title is already on the watchlist"))
    }

    async fn update_watchlist_item(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &WatchlistUpdate,
    ) -> AppResult<Option<WatchlistItem>> {
        let item = sqlx::query_as::<_, WatchlistItem>(
            r#"
            UPDATE watchlist_items
            SET status = COALESCE($3, status),
                favorite = COALESCE($4, favorite),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, media_id, media_type, title, poster_path, status, favorite,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.favorite)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn delete_watchlist_item(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watchlist_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(
        &self,
        media_id: i64,
        media_type: MediaType,
    ) -> AppResult<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.user_id, c.media_id, c.media_type, c.content, c.created_at,
                   p.username, p.avatar_url
            FROM comments c
            LEFT JOIN profiles p ON p.id = c.user_id
            WHERE c.media_id = $1 AND c.media_type = $2
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(media_id)
        .bind(media_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn create_comment(&self, user_id: Uuid, comment: &NewComment) -> AppResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, user_id, media_id, media_type, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, media_id, media_type, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(comment.media_id)
        .bind(comment.media_type.as_str())
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, user_id, media_id, media_type, content, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn send_message(&self, sender_id: Uuid, message: &NewMessage) -> AppResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, receiver_id, content, read, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(message.receiver_id)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn messages_between(&self, user_id: Uuid, other_id: Uuid) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_id, receiver_id, content, read, created_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn messages_for_user(&self, user_id: Uuid) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_id, receiver_id, content, read, created_at
            FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn mark_read(&self, receiver_id: Uuid, sender_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read = true
            WHERE receiver_id = $1 AND sender_id = $2 AND read = false
            "#,
        )
        .bind(receiver_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_search_history(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<SearchHistoryEntry>> {
        let entries = sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            SELECT id, user_id, query, created_at
            FROM search_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn add_search_history(
        &self,
        user_id: Uuid,
        query: &str,
    ) -> AppResult<SearchHistoryEntry> {
        let entry = sqlx::query_as::<_, SearchHistoryEntry>(
            r#"
            INSERT INTO search_history (id, user_id, query)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, query, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(query)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn delete_search_history_entry(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM search_history WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_search_history(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM search_history WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_user_data(&self, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let deleted_history = sqlx::query("DELETE FROM search_history WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted_comments = sqlx::query("DELETE FROM comments WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted_messages =
            sqlx::query("DELETE FROM messages WHERE sender_id = $1 OR receiver_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        let deleted_watchlist = sqlx::query("DELETE FROM watchlist_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            deleted_history,
            deleted_comments,
            deleted_messages,
            deleted_watchlist,
            "User data deleted"
        );

        Ok(())
    }
}
