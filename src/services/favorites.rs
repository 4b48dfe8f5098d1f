use chrono::Utc;

use crate::{
    db::FavoriteStore,
    error::{AppError, AppResult},
    models::{CatalogItem, FavoriteMovie, NewFavorite},
};

/// Adds a movie to a user's favorites. Adding it again is a no-op.
pub async fn add_favorite(
    store: &dyn FavoriteStore,
    user_id: &str,
    item: &CatalogItem,
) -> AppResult<bool> {
    let user_id = user_id.trim();
    let movie_slug = item.slug.trim();

    if user_id.is_empty() {
        return Err(AppError::InvalidInput("User id cannot be empty".to_string()));
    }
    if movie_slug.is_empty() {
        return Err(AppError::InvalidInput("Movie slug cannot be empty".to_string()));
    }
    if item.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Movie name cannot be empty".to_string()));
    }

    if store.exists(user_id, movie_slug).await? {
        return Ok(true);
    }

    store
        .insert(&NewFavorite {
            user_id: user_id.to_string(),
            movie_slug: movie_slug.to_string(),
            movie_title: item.name.trim().to_string(),
            origin_name: item.origin_name.clone(),
            poster_url: item.poster_url.clone(),
            thumb_url: item.thumb_url.clone(),
            year: item.year,
            added_at: Utc::now(),
        })
        .await?;

    tracing::info!(user_id = %user_id, movie_slug = %movie_slug, "Favorite added");
    Ok(true)
}

/// Removes a favorite. Removing one that does not exist still succeeds.
pub async fn remove_favorite(
    store: &dyn FavoriteStore,
    user_id: &str,
    movie_slug: &str,
) -> AppResult<bool> {
    let removed = store.delete(user_id, movie_slug).await?;
    if removed {
        tracing::info!(user_id = %user_id, movie_slug = %movie_slug, "Favorite removed");
    }
    Ok(true)
}

pub async fn is_favorite(
    store: &dyn FavoriteStore,
    user_id: &str,
    movie_slug: &str,
) -> AppResult<bool> {
    store.exists(user_id, movie_slug).await
}

pub async fn list_favorites(
    store: &dyn FavoriteStore,
    user_id: &str,
) -> AppResult<Vec<FavoriteMovie>> {
    store.list_for_user(user_id).await
}
