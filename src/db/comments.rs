use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{MovieComment, NewComment},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments on one movie, newest first
    async fn list_for_movie(&self, movie_slug: &str) -> AppResult<Vec<MovieComment>>;

    async fn find(&self, id: i64) -> AppResult<Option<MovieComment>>;

    async fn insert(&self, record: &NewComment) -> AppResult<MovieComment>;

    /// Replaces the body and stamps `updated_at`. `None` when the row is gone.
    async fn update_content(
        &self,
        id: i64,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<MovieComment>>;

    async fn delete(&self, id: i64) -> AppResult<bool>;

    async fn count_for_movie(&self, movie_slug: &str) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CommentStore for PgCommentStore {
    async fn list_for_movie(&self, movie_slug: &str) -> AppResult<Vec<MovieComment>> {
        let rows = sqlx::query_as::<_, MovieComment>(
            r#"
            SELECT id, user_id, movie_slug, movie_title, content, created_at, updated_at
            FROM movie_comments
            WHERE movie_slug = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(movie_slug)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find(&self, id: i64) -> AppResult<Option<MovieComment>> {
        let row = sqlx::query_as::<_, MovieComment>(
            r#"
            SELECT id, user_id, movie_slug, movie_title, content, created_at, updated_at
            FROM movie_comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(&self, record: &NewComment) -> AppResult<MovieComment> {
        let row = sqlx::query_as::<_, MovieComment>(
            r#"
            INSERT INTO movie_comments (user_id, movie_slug, movie_title, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, movie_slug, movie_title, content, created_at, updated_at
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.movie_slug)
        .bind(&record.movie_title)
        .bind(&record.content)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_content(
        &self,
        id: i64,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<MovieComment>> {
        let row = sqlx::query_as::<_, MovieComment>(
            r#"
            UPDATE movie_comments
            SET content = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, user_id, movie_slug, movie_title, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM movie_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_for_movie(&self, movie_slug: &str) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM movie_comments WHERE movie_slug = $1")
                .bind(movie_slug)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
