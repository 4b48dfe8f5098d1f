use chrono::Utc;

use crate::{
    db::WatchProgressStore,
    error::{AppError, AppResult},
    models::{NewWatchProgress, ProgressUpdate, WatchProgress},
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// Records where a user is in a movie
///
/// There is at most one row per (user, movie). Switching episodes overwrites
/// the position, and only the latest playback state is kept.
pub async fn save_progress(
    store: &dyn WatchProgressStore,
    user_id: &str,
    update: ProgressUpdate,
) -> AppResult<WatchProgress> {
    let user_id = user_id.trim();
    let movie_slug = update.movie_slug.trim();

    if user_id.is_empty() {
        return Err(AppError::InvalidInput("User id cannot be empty".to_string()));
    }
    if movie_slug.is_empty() {
        return Err(AppError::InvalidInput("Movie slug cannot be empty".to_string()));
    }
    if update.current_time < 0 || update.total_time < 0 {
        return Err(AppError::InvalidInput(
            "Playback times cannot be negative".to_string(),
        ));
    }

    // Players report a position slightly past the end when an episode finishes
    let current_time = if update.total_time > 0 {
        update.current_time.min(update.total_time)
    } else {
        update.current_time
    };

    let movie_title = non_blank(update.movie_title);
    let poster_url = non_blank(update.poster_url);
    let now = Utc::now();

    let saved = match store.find(user_id, movie_slug).await? {
        Some(mut existing) => {
            if let Some(title) = movie_title {
                existing.movie_title = title;
            }
            if let Some(poster) = poster_url {
                existing.poster_url = poster;
            }
            existing.episode_name = update.episode_name;
            existing.episode_slug = update.episode_slug;
            existing.current_time_secs = current_time;
            existing.total_time_secs = update.total_time;
            existing.last_watched_at = now;

            match store.update(&existing).await {
                // Deleted between the read and the write; save it as a new row
                Err(AppError::Database(sqlx::Error::RowNotFound)) => {
                    tracing::debug!(
                        user_id = %user_id,
                        movie_slug = %movie_slug,
                        "Progress row vanished before update, inserting again"
                    );
                    store.insert(&reinsert(&existing)).await
                }
                result => result,
            }
        }
        None => {
            store
                .insert(&NewWatchProgress {
                    user_id: user_id.to_string(),
                    movie_slug: movie_slug.to_string(),
                    movie_title: movie_title.unwrap_or_default(),
                    poster_url: poster_url.unwrap_or_default(),
                    episode_name: update.episode_name,
                    episode_slug: update.episode_slug,
                    current_time_secs: current_time,
                    total_time_secs: update.total_time,
                    watched_at: now,
                })
                .await
        }
    }
    .map_err(|e| {
        tracing::error!(
            error = %e,
            user_id = %user_id,
            movie_slug = %movie_slug,
            "Failed to save watch progress"
        );
        e
    })?;

    tracing::debug!(
        user_id = %user_id,
        movie_slug = %movie_slug,
        episode = %saved.episode_slug,
        current_time = saved.current_time_secs,
        "Watch progress saved"
    );

    Ok(saved)
}

fn reinsert(row: &WatchProgress) -> NewWatchProgress {
    NewWatchProgress {
        user_id: row.user_id.clone(),
        movie_slug: row.movie_slug.clone(),
        movie_title: row.movie_title.clone(),
        poster_url: row.poster_url.clone(),
        episode_name: row.episode_name.clone(),
        episode_slug: row.episode_slug.clone(),
        current_time_secs: row.current_time_secs,
        total_time_secs: row.total_time_secs,
        watched_at: row.last_watched_at,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `None` means the user never watched the movie
pub async fn get_progress(
    store: &dyn WatchProgressStore,
    user_id: &str,
    movie_slug: &str,
) -> AppResult<Option<WatchProgress>> {
    store.find(user_id, movie_slug).await
}

/// Deletes a progress row owned by `user_id`; `false` for missing or foreign ids
pub async fn delete_progress(
    store: &dyn WatchProgressStore,
    id: i64,
    user_id: &str,
) -> AppResult<bool> {
    let deleted = store.delete_owned(id, user_id).await?;
    if !deleted {
        tracing::debug!(id = id, user_id = %user_id, "No owned progress row to delete");
    }
    Ok(deleted)
}

/// Continue-watching list, most recent first
pub async fn list_history(
    store: &dyn WatchProgressStore,
    user_id: &str,
    limit: Option<i64>,
) -> AppResult<Vec<WatchProgress>> {
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    store.list_for_user(user_id, limit).await
}
