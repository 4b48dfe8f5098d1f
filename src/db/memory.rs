use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db::{CommentStore, FavoriteStore, TitleOverrideStore, WatchProgressStore},
    error::AppResult,
    models::{
        FavoriteMovie, MovieComment, NewComment, NewFavorite, NewWatchProgress, TitleOverride,
        WatchProgress, WatchStats,
    },
};

/// Process-local store used when no database is configured, and by tests
///
/// Mirrors the uniqueness and ordering guarantees of the Postgres tables.
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    overrides: HashMap<String, TitleOverride>,
    progress: Vec<WatchProgress>,
    next_progress_id: i64,
    favorites: Vec<FavoriteMovie>,
    next_favorite_id: i64,
    comments: Vec<MovieComment>,
    next_comment_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of progress rows across all users
    #[cfg(test)]
    pub async fn progress_row_count(&self) -> usize {
        self.inner.read().await.progress.len()
    }
}

#[async_trait::async_trait]
impl TitleOverrideStore for MemoryStore {
    async fn find(&self, slug: &str) -> AppResult<Option<TitleOverride>> {
        Ok(self.inner.read().await.overrides.get(slug).cloned())
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<TitleOverride>> {
        let inner = self.inner.read().await;
        let wanted: HashSet<&str> = slugs.iter().map(String::as_str).collect();
        Ok(inner
            .overrides
            .values()
            .filter(|record| wanted.contains(record.slug.as_str()))
            .cloned()
            .collect())
    }

    async fn upsert(&self, record: &TitleOverride) -> AppResult<TitleOverride> {
        let mut inner = self.inner.write().await;
        inner.overrides.insert(record.slug.clone(), record.clone());
        Ok(record.clone())
    }

    async fn set_original_title_if_empty(
        &self,
        slug: &str,
        original_title: &str,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.overrides.get_mut(slug) {
            Some(record) if !record.has_original_title() => {
                record.original_title = Some(original_title.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, slug: &str) -> AppResult<bool> {
        Ok(self.inner.write().await.overrides.remove(slug).is_some())
    }

    async fn list(&self) -> AppResult<Vec<TitleOverride>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<TitleOverride> = inner.overrides.values().cloned().collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn list_hidden(&self) -> AppResult<Vec<TitleOverride>> {
        let mut rows = TitleOverrideStore::list(self).await?;
        rows.retain(|record| record.is_hidden);
        Ok(rows)
    }

    async fn count_hidden(&self) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.overrides.values().filter(|r| r.is_hidden).count() as i64)
    }
}

#[async_trait::async_trait]
impl WatchProgressStore for MemoryStore {
    async fn find(&self, user_id: &str, movie_slug: &str) -> AppResult<Option<WatchProgress>> {
        let inner = self.inner.read().await;
        Ok(inner
            .progress
            .iter()
            .find(|row| row.user_id == user_id && row.movie_slug == movie_slug)
            .cloned())
    }

    async fn insert(&self, record: &NewWatchProgress) -> AppResult<WatchProgress> {
        let mut inner = self.inner.write().await;

        // Same conflict handling as the unique (user_id, movie_slug) constraint
        if let Some(existing) = inner
            .progress
            .iter_mut()
            .find(|row| row.user_id == record.user_id && row.movie_slug == record.movie_slug)
        {
            if !record.movie_title.is_empty() {
                existing.movie_title = record.movie_title.clone();
            }
            if !record.poster_url.is_empty() {
                existing.poster_url = record.poster_url.clone();
            }
            existing.episode_name = record.episode_name.clone();
            existing.episode_slug = record.episode_slug.clone();
            existing.current_time_secs = record.current_time_secs;
            existing.total_time_secs = record.total_time_secs;
            existing.last_watched_at = record.watched_at;
            return Ok(existing.clone());
        }

        inner.next_progress_id += 1;
        let row = WatchProgress {
            id: inner.next_progress_id,
            user_id: record.user_id.clone(),
            movie_slug: record.movie_slug.clone(),
            movie_title: record.movie_title.clone(),
            poster_url: record.poster_url.clone(),
            episode_name: record.episode_name.clone(),
            episode_slug: record.episode_slug.clone(),
            current_time_secs: record.current_time_secs,
            total_time_secs: record.total_time_secs,
            first_watched_at: record.watched_at,
            last_watched_at: record.watched_at,
        };
        inner.progress.push(row.clone());
        Ok(row)
    }

    async fn update(&self, record: &WatchProgress) -> AppResult<WatchProgress> {
        let mut inner = self.inner.write().await;
        let existing = inner
            .progress
            .iter_mut()
            .find(|row| row.id == record.id)
            .ok_or(sqlx::Error::RowNotFound)?;

        existing.movie_title = record.movie_title.clone();
        existing.poster_url = record.poster_url.clone();
        existing.episode_name = record.episode_name.clone();
        existing.episode_slug = record.episode_slug.clone();
        existing.current_time_secs = record.current_time_secs;
        existing.total_time_secs = record.total_time_secs;
        existing.last_watched_at = record.last_watched_at;
        Ok(existing.clone())
    }

    async fn delete_owned(&self, id: i64, user_id: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.progress.len();
        inner
            .progress
            .retain(|row| !(row.id == id && row.user_id == user_id));
        Ok(inner.progress.len() < before)
    }

    async fn list_for_user(&self, user_id: &str, limit: i64) -> AppResult<Vec<WatchProgress>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<WatchProgress> = inner
            .progress
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_watched_at.cmp(&a.last_watched_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn top_slugs(&self, count: i64) -> AppResult<Vec<WatchStats>> {
        struct Group<'a> {
            watchers: HashSet<&'a str>,
            latest: &'a WatchProgress,
        }

        let inner = self.inner.read().await;
        let mut groups: HashMap<&str, Group> = HashMap::new();

        for row in inner.progress.iter().filter(|row| !row.movie_slug.is_empty()) {
            let group = groups.entry(row.movie_slug.as_str()).or_insert(Group {
                watchers: HashSet::new(),
                latest: row,
            });
            group.watchers.insert(row.user_id.as_str());
            if row.last_watched_at > group.latest.last_watched_at {
                group.latest = row;
            }
        }

        let mut stats: Vec<WatchStats> = groups
            .into_iter()
            .map(|(slug, group)| WatchStats {
                movie_slug: slug.to_string(),
                watchers: group.watchers.len() as i64,
                latest_interaction: group.latest.last_watched_at,
                movie_title: non_empty(&group.latest.movie_title),
                poster_url: non_empty(&group.latest.poster_url),
            })
            .collect();

        stats.sort_by(|a, b| {
            b.watchers
                .cmp(&a.watchers)
                .then_with(|| b.latest_interaction.cmp(&a.latest_interaction))
                .then_with(|| a.movie_slug.cmp(&b.movie_slug))
        });
        stats.truncate(count.max(0) as usize);
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl FavoriteStore for MemoryStore {
    async fn exists(&self, user_id: &str, movie_slug: &str) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .favorites
            .iter()
            .any(|f| f.user_id == user_id && f.movie_slug == movie_slug))
    }

    async fn insert(&self, record: &NewFavorite) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner
            .favorites
            .iter()
            .any(|f| f.user_id == record.user_id && f.movie_slug == record.movie_slug)
        {
            return Ok(());
        }

        inner.next_favorite_id += 1;
        let id = inner.next_favorite_id;
        inner.favorites.push(FavoriteMovie {
            id,
            user_id: record.user_id.clone(),
            movie_slug: record.movie_slug.clone(),
            movie_title: record.movie_title.clone(),
            origin_name: record.origin_name.clone(),
            poster_url: record.poster_url.clone(),
            thumb_url: record.thumb_url.clone(),
            year: record.year,
            added_at: record.added_at,
        });
        Ok(())
    }

    async fn delete(&self, user_id: &str, movie_slug: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.favorites.len();
        inner
            .favorites
            .retain(|f| !(f.user_id == user_id && f.movie_slug == movie_slug));
        Ok(inner.favorites.len() < before)
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<FavoriteMovie>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<FavoriteMovie> = inner
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.added_at.cmp(&a.added_at).then_with(|| b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl CommentStore for MemoryStore {
    async fn list_for_movie(&self, movie_slug: &str) -> AppResult<Vec<MovieComment>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<MovieComment> = inner
            .comments
            .iter()
            .filter(|c| c.movie_slug == movie_slug)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find(&self, id: i64) -> AppResult<Option<MovieComment>> {
        let inner = self.inner.read().await;
        Ok(inner.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, record: &NewComment) -> AppResult<MovieComment> {
        let mut inner = self.inner.write().await;
        inner.next_comment_id += 1;
        let row = MovieComment {
            id: inner.next_comment_id,
            user_id: record.user_id.clone(),
            movie_slug: record.movie_slug.clone(),
            movie_title: record.movie_title.clone(),
            content: record.content.clone(),
            created_at: record.created_at,
            updated_at: None,
        };
        inner.comments.push(row.clone());
        Ok(row)
    }

    async fn update_content(
        &self,
        id: i64,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<MovieComment>> {
        let mut inner = self.inner.write().await;
        Ok(inner.comments.iter_mut().find(|c| c.id == id).map(|row| {
            row.content = content.to_string();
            row.updated_at = Some(updated_at);
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.comments.len();
        inner.comments.retain(|c| c.id != id);
        Ok(inner.comments.len() < before)
    }

    async fn count_for_movie(&self, movie_slug: &str) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.comments.iter().filter(|c| c.movie_slug == movie_slug).count() as i64)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
impl MemoryStore {
    /// Inserts a progress row with a caller-chosen timestamp
    pub async fn seed_progress(
        &self,
        user_id: &str,
        movie_slug: &str,
        movie_title: &str,
        watched_at: DateTime<Utc>,
    ) -> AppResult<WatchProgress> {
        WatchProgressStore::insert(
            self,
            &NewWatchProgress {
                user_id: user_id.to_string(),
                movie_slug: movie_slug.to_string(),
                movie_title: movie_title.to_string(),
                poster_url: String::new(),
                episode_name: String::new(),
                episode_slug: String::new(),
                current_time_secs: 0,
                total_time_secs: 0,
                watched_at,
            },
        )
        .await
    }
}
