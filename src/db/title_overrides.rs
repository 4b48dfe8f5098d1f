use sqlx::PgPool;

use crate::{error::AppResult, models::TitleOverride};

/// Persistent store of admin title overrides, one row per slug
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TitleOverrideStore: Send + Sync {
    async fn find(&self, slug: &str) -> AppResult<Option<TitleOverride>>;

    /// Batch lookup used when decorating a whole listing page
    async fn find_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<TitleOverride>>;

    /// Inserts the row or replaces every field of the existing row for its slug
    async fn upsert(&self, record: &TitleOverride) -> AppResult<TitleOverride>;

    /// Records the catalog name unless one was already captured.
    /// Returns whether a row was changed.
    async fn set_original_title_if_empty(&self, slug: &str, original_title: &str)
        -> AppResult<bool>;

    async fn delete(&self, slug: &str) -> AppResult<bool>;

    /// All overrides, most recently updated first
    async fn list(&self) -> AppResult<Vec<TitleOverride>>;

    async fn list_hidden(&self) -> AppResult<Vec<TitleOverride>>;

    async fn count_hidden(&self) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgTitleOverrideStore {
    pool: PgPool,
}

impl PgTitleOverrideStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TitleOverrideStore for PgTitleOverrideStore {
    async fn find(&self, slug: &str) -> AppResult<Option<TitleOverride>> {
        let row = sqlx::query_as::<_, TitleOverride>(
            r#"
            SELECT slug, custom_title, original_title, custom_description,
                   is_hidden, updated_at, updated_by
            FROM title_overrides
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<TitleOverride>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TitleOverride>(
            r#"
            SELECT slug, custom_title, original_title, custom_description,
                   is_hidden, updated_at, updated_by
            FROM title_overrides
            WHERE slug = ANY($1)
            "#,
        )
        .bind(slugs)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert(&self, record: &TitleOverride) -> AppResult<TitleOverride> {
        let row = sqlx::query_as::<_, TitleOverride>(
            r#"
            INSERT INTO title_overrides (
                slug, custom_title, original_title, custom_description,
                is_hidden, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO UPDATE SET
                custom_title = EXCLUDED.custom_title,
                original_title = EXCLUDED.original_title,
                custom_description = EXCLUDED.custom_description,
                is_hidden = EXCLUDED.is_hidden,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            RETURNING slug, custom_title, original_title, custom_description,
                      is_hidden, updated_at, updated_by
            "#,
        )
        .bind(&record.slug)
        .bind(&record.custom_title)
        .bind(&record.original_title)
        .bind(&record.custom_description)
        .bind(record.is_hidden)
        .bind(record.updated_at)
        .bind(&record.updated_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_original_title_if_empty(
        &self,
        slug: &str,
        original_title: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE title_overrides
            SET original_title = $2
            WHERE slug = $1 AND (original_title IS NULL OR original_title = '')
            "#,
        )
        .bind(slug)
        .bind(original_title)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, slug: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM title_overrides WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> AppResult<Vec<TitleOverride>> {
        let rows = sqlx::query_as::<_, TitleOverride>(
            r#"
            SELECT slug, custom_title, original_title, custom_description,
                   is_hidden, updated_at, updated_by
            FROM title_overrides
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_hidden(&self) -> AppResult<Vec<TitleOverride>> {
        let rows = sqlx::query_as::<_, TitleOverride>(
            r#"
            SELECT slug, custom_title, original_title, custom_description,
                   is_hidden, updated_at, updated_by
            FROM title_overrides
            WHERE is_hidden
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_hidden(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM title_overrides WHERE is_hidden")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
