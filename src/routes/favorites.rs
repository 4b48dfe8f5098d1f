use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::identity::CurrentUser,
    models::{CatalogItem, FavoriteMovie},
    routes::AppState,
    services::favorites,
};

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub movie_title: String,
    #[serde(default)]
    pub origin_name: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<FavoriteMovie>>> {
    let rows = favorites::list_favorites(state.favorites.as_ref(), &user.id).await?;
    Ok(Json(rows))
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<FavoriteStatus>> {
    let is_favorite = favorites::is_favorite(state.favorites.as_ref(), &user.id, &slug).await?;
    Ok(Json(FavoriteStatus { is_favorite }))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(request): Json<FavoriteRequest>,
) -> AppResult<Json<FavoriteResponse>> {
    let item = CatalogItem {
        slug,
        name: request.movie_title,
        origin_name: request.origin_name,
        poster_url: request.poster_url,
        thumb_url: request.thumb_url,
        year: request.year,
        ..Default::default()
    };

    let success = favorites::add_favorite(state.favorites.as_ref(), &user.id, &item).await?;
    Ok(Json(FavoriteResponse { success }))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<FavoriteResponse>> {
    let success = favorites::remove_favorite(state.favorites.as_ref(), &user.id, &slug).await?;
    Ok(Json(FavoriteResponse { success }))
}
