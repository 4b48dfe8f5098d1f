use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{identity::CurrentUser, request_id::RequestId},
    models::{ProgressUpdate, WatchProgress},
    routes::AppState,
    services::progress,
};

/// Progress row plus the values a player needs to render it
#[derive(Debug, Serialize)]
pub struct WatchProgressView {
    #[serde(flatten)]
    pub progress: WatchProgress,
    pub progress_percent: i32,
    pub is_completed: bool,
}

impl From<WatchProgress> for WatchProgressView {
    fn from(progress: WatchProgress) -> Self {
        Self {
            progress_percent: progress.progress_percent(),
            is_completed: progress.is_completed(),
            progress,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub progress: WatchProgressView,
}

/// Handler for player progress reports
pub async fn save(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: CurrentUser,
    Json(update): Json<ProgressUpdate>,
) -> AppResult<Json<SaveResponse>> {
    let saved = progress::save_progress(state.progress.as_ref(), &user.id, update).await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user.id,
        movie_slug = %saved.movie_slug,
        "Progress saved"
    );

    Ok(Json(SaveResponse {
        success: true,
        progress: saved.into(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// `null` when the user never watched the movie
    pub progress: Option<WatchProgressView>,
}

/// Handler for the resume position of one movie
pub async fn get(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ProgressResponse>> {
    let found = progress::get_progress(state.progress.as_ref(), &user.id, &slug).await?;
    Ok(Json(ProgressResponse {
        progress: found.map(WatchProgressView::from),
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

/// Handler for the continue-watching list
pub async fn history(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<Vec<WatchProgressView>>> {
    let rows = progress::list_history(state.progress.as_ref(), &user.id, params.limit).await?;
    Ok(Json(rows.into_iter().map(WatchProgressView::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Handler for removing a history entry. Foreign or missing ids report `false`.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteResponse>> {
    let success = progress::delete_progress(state.progress.as_ref(), id, &user.id).await?;
    Ok(Json(DeleteResponse { success }))
}
