use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{FavoriteMovie, NewFavorite},
};

#[async_trait::async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn exists(&self, user_id: &str, movie_slug: &str) -> AppResult<bool>;

    /// Inserts the favorite; an existing (user, movie) row is left untouched
    async fn insert(&self, record: &NewFavorite) -> AppResult<()>;

    async fn delete(&self, user_id: &str, movie_slug: &str) -> AppResult<bool>;

    /// A user's favorites, most recently added first
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<FavoriteMovie>>;
}

#[derive(Clone)]
pub struct PgFavoriteStore {
    pool: PgPool,
}

impl PgFavoriteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FavoriteStore for PgFavoriteStore {
    async fn exists(&self, user_id: &str, movie_slug: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favorite_movies WHERE user_id = $1 AND movie_slug = $2)",
        )
        .bind(user_id)
        .bind(movie_slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, record: &NewFavorite) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO favorite_movies (
                user_id, movie_slug, movie_title, origin_name,
                poster_url, thumb_url, year, added_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, movie_slug) DO NOTHING
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.movie_slug)
        .bind(&record.movie_title)
        .bind(&record.origin_name)
        .bind(&record.poster_url)
        .bind(&record.thumb_url)
        .bind(record.year)
        .bind(record.added_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str, movie_slug: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM favorite_movies WHERE user_id = $1 AND movie_slug = $2")
                .bind(user_id)
                .bind(movie_slug)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<FavoriteMovie>> {
        let rows = sqlx::query_as::<_, FavoriteMovie>(
            r#"
            SELECT id, user_id, movie_slug, movie_title, origin_name,
                   poster_url, thumb_url, year, added_at
            FROM favorite_movies
            WHERE user_id = $1
            ORDER BY added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
