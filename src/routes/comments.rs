use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::identity::CurrentUser,
    models::MovieComment,
    routes::AppState,
    services::comments,
};

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub count: i64,
    pub comments: Vec<MovieComment>,
}

#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    #[serde(default)]
    pub movie_title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub success: bool,
    /// The saved comment; `null` when the caller may not change it
    pub comment: Option<MovieComment>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Handler for a movie's comment thread, readable without an identity
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Json<CommentListResponse>> {
    let rows = comments::list_comments(state.comments.as_ref(), &slug).await?;
    let count = comments::count_comments(state.comments.as_ref(), &slug).await?;
    Ok(Json(CommentListResponse {
        count,
        comments: rows,
    }))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(request): Json<NewCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    let comment = comments::add_comment(
        state.comments.as_ref(),
        &user.id,
        &slug,
        &request.movie_title,
        &request.content,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            comment: Some(comment),
        }),
    ))
}

/// Handler for edits. Someone else's or a missing comment reports `false`.
pub async fn edit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
    Json(request): Json<EditCommentRequest>,
) -> AppResult<Json<CommentResponse>> {
    let comment =
        comments::update_comment(state.comments.as_ref(), &user.id, &slug, id, &request.content)
            .await?;

    Ok(Json(CommentResponse {
        success: comment.is_some(),
        comment,
    }))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
) -> AppResult<Json<DeleteResponse>> {
    let success =
        comments::delete_comment(state.comments.as_ref(), &user.id, user.is_admin, &slug, id)
            .await?;
    Ok(Json(DeleteResponse { success }))
}
