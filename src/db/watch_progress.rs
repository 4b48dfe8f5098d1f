use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{NewWatchProgress, WatchProgress, WatchStats},
};

/// Persistent store of watch progress, one row per (user, movie)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchProgressStore: Send + Sync {
    async fn find(&self, user_id: &str, movie_slug: &str) -> AppResult<Option<WatchProgress>>;

    /// Inserts a row. If a concurrent request already created the
    /// (user, movie) row, that row is updated instead; `first_watched_at`
    /// is never replaced.
    async fn insert(&self, record: &NewWatchProgress) -> AppResult<WatchProgress>;

    /// Writes every mutable field of an existing row, matched by id
    async fn update(&self, record: &WatchProgress) -> AppResult<WatchProgress>;

    /// Deletes the row only if it belongs to `user_id`
    async fn delete_owned(&self, id: i64, user_id: &str) -> AppResult<bool>;

    /// A user's rows, most recently watched first
    async fn list_for_user(&self, user_id: &str, limit: i64) -> AppResult<Vec<WatchProgress>>;

    /// Slugs ranked by distinct watchers, then by latest interaction
    async fn top_slugs(&self, count: i64) -> AppResult<Vec<WatchStats>>;
}

#[derive(Clone)]
pub struct PgWatchProgressStore {
    pool: PgPool,
}

impl PgWatchProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WatchProgressStore for PgWatchProgressStore {
    async fn find(&self, user_id: &str, movie_slug: &str) -> AppResult<Option<WatchProgress>> {
        let row = sqlx::query_as::<_, WatchProgress>(
            r#"
            SELECT id, user_id, movie_slug, movie_title, poster_url,
                   episode_name, episode_slug, current_time_secs, total_time_secs,
                   first_watched_at, last_watched_at
            FROM watch_progress
            WHERE user_id = $1 AND movie_slug = $2
            "#,
        )
        .bind(user_id)
        .bind(movie_slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(&self, record: &NewWatchProgress) -> AppResult<WatchProgress> {
        let row = sqlx::query_as::<_, WatchProgress>(
            r#"
            INSERT INTO watch_progress (
                user_id, movie_slug, movie_title, poster_url,
                episode_name, episode_slug, current_time_secs, total_time_secs,
                first_watched_at, last_watched_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (user_id, movie_slug) DO UPDATE SET
                movie_title = CASE WHEN EXCLUDED.movie_title <> ''
                    THEN EXCLUDED.movie_title ELSE watch_progress.movie_title END,
                poster_url = CASE WHEN EXCLUDED.poster_url <> ''
                    THEN EXCLUDED.poster_url ELSE watch_progress.poster_url END,
                episode_name = EXCLUDED.episode_name,
                episode_slug = EXCLUDED.episode_slug,
                current_time_secs = EXCLUDED.current_time_secs,
                total_time_secs = EXCLUDED.total_time_secs,
                last_watched_at = EXCLUDED.last_watched_at
            RETURNING id, user_id, movie_slug, movie_title, poster_url,
                      episode_name, episode_slug, current_time_secs, total_time_secs,
                      first_watched_at, last_watched_at
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.movie_slug)
        .bind(&record.movie_title)
        .bind(&record.poster_url)
        .bind(&record.episode_name)
        .bind(&record.episode_slug)
        .bind(record.current_time_secs)
        .bind(record.total_time_secs)
        .bind(record.watched_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, record: &WatchProgress) -> AppResult<WatchProgress> {
        let row = sqlx::query_as::<_, WatchProgress>(
            r#"
            UPDATE watch_progress SET
                movie_title = $2,
                poster_url = $3,
                episode_name = $4,
                episode_slug = $5,
                current_time_secs = $6,
                total_time_secs = $7,
                last_watched_at = $8
            WHERE id = $1
            RETURNING id, user_id, movie_slug, movie_title, poster_url,
                      episode_name, episode_slug, current_time_secs, total_time_secs,
                      first_watched_at, last_watched_at
            "#,
        )
        .bind(record.id)
        .bind(&record.movie_title)
        .bind(&record.poster_url)
        .bind(&record.episode_name)
        .bind(&record.episode_slug)
        .bind(record.current_time_secs)
        .bind(record.total_time_secs)
        .bind(record.last_watched_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_owned(&self, id: i64, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watch_progress WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: &str, limit: i64) -> AppResult<Vec<WatchProgress>> {
        let rows = sqlx::query_as::<_, WatchProgress>(
            r#"
            SELECT id, user_id, movie_slug, movie_title, poster_url,
                   episode_name, episode_slug, current_time_secs, total_time_secs,
                   first_watched_at, last_watched_at
            FROM watch_progress
            WHERE user_id = $1
            ORDER BY last_watched_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn top_slugs(&self, count: i64) -> AppResult<Vec<WatchStats>> {
        let rows = sqlx::query_as::<_, WatchStats>(
            r#"
            WITH ranked AS (
                SELECT movie_slug,
                       COUNT(DISTINCT user_id) AS watchers,
                       MAX(last_watched_at) AS latest_interaction
                FROM watch_progress
                WHERE movie_slug <> ''
                GROUP BY movie_slug
                ORDER BY watchers DESC, latest_interaction DESC, movie_slug
                LIMIT $1
            )
            SELECT r.movie_slug, r.watchers, r.latest_interaction,
                   NULLIF(latest.movie_title, '') AS movie_title,
                   NULLIF(latest.poster_url, '') AS poster_url
            FROM ranked r
            LEFT JOIN LATERAL (
                SELECT w.movie_title, w.poster_url
                FROM watch_progress w
                WHERE w.movie_slug = r.movie_slug
                ORDER BY w.last_watched_at DESC
                LIMIT 1
            ) latest ON TRUE
            ORDER BY r.watchers DESC, r.latest_interaction DESC, r.movie_slug
            "#,
        )
        .bind(count)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
