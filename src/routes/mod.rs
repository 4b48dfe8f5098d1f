use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{CommentStore, FavoriteStore, TitleOverrideStore, WatchProgressStore},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::catalog::CatalogSource,
};

pub mod admin;
pub mod comments;
pub mod favorites;
pub mod movies;
pub mod progress;

/// Shared application state
pub struct AppState {
    pub overrides: Arc<dyn TitleOverrideStore>,
    pub progress: Arc<dyn WatchProgressStore>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub comments: Arc<dyn CommentStore>,
    pub catalog: Arc<dyn CatalogSource>,
    pub hidden_scan_max_pages: u32,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Catalog
        .route("/home", get(movies::home))
        .route("/movies", get(movies::list))
        .route("/movies/:slug", get(movies::detail))
        // Comments
        .route(
            "/movies/:slug/comments",
            get(comments::list).post(comments::add),
        )
        .route(
            "/movies/:slug/comments/:id",
            put(comments::edit).delete(comments::delete),
        )
        // Watch progress
        .route("/progress", post(progress::save))
        // The segment is a movie slug for GET and a row id for DELETE
        .route("/progress/:key", get(progress::get).delete(progress::delete))
        .route("/history", get(progress::history))
        // Favorites
        .route("/favorites", get(favorites::list))
        .route(
            "/favorites/:slug",
            get(favorites::status).put(favorites::add).delete(favorites::remove),
        )
        // Admin
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/titles", get(admin::list_titles))
        .route(
            "/admin/titles/:slug",
            put(admin::save_title).delete(admin::delete_title),
        )
        .route("/admin/titles/:slug/toggle-hidden", post(admin::toggle_hidden))
        .route("/admin/hidden", get(admin::hidden))
        .route("/admin/hidden/scan", get(admin::scan_hidden))
        .route("/admin/top-watched", get(admin::top_watched))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
