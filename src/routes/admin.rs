use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{identity::AdminUser, request_id::RequestId},
    models::{DecoratedItem, HiddenMovie, OverrideEdit, TitleOverride, TopWatchedMovie},
    routes::AppState,
    services::{analytics, catalog::CatalogFilter, overlay},
};

const DEFAULT_TOP_COUNT: usize = 10;
const MAX_TOP_COUNT: usize = 100;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub hidden_count: i64,
    /// Size of the newest-movies listing, when the catalog answers
    pub catalog_total_items: Option<u32>,
    pub top_movies: Vec<TopWatchedMovie>,
}

/// Handler for the admin overview
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<DashboardResponse>> {
    let hidden_count = overlay::hidden_count(state.overrides.as_ref()).await?;
    let top_movies =
        analytics::top_watched(state.progress.as_ref(), state.catalog.as_ref(), DEFAULT_TOP_COUNT)
            .await?;

    let catalog_total_items = match state
        .catalog
        .list_page(&CatalogFilter::NewlyUpdated, 1)
        .await
    {
        Ok(page) => Some(
            page.pagination
                .map(|p| p.total_items)
                .unwrap_or(page.items.len() as u32),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Catalog total unavailable for dashboard");
            None
        }
    };

    Ok(Json(DashboardResponse {
        hidden_count,
        catalog_total_items,
        top_movies,
    }))
}

pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<TitleOverride>>> {
    let rows = overlay::list_overrides(state.overrides.as_ref()).await?;
    Ok(Json(rows))
}

/// Handler for creating or editing a custom title
pub async fn save_title(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AdminUser(admin): AdminUser,
    Path(slug): Path<String>,
    Json(edit): Json<OverrideEdit>,
) -> AppResult<Json<TitleOverride>> {
    tracing::info!(
        request_id = %request_id,
        slug = %slug,
        admin = %admin.id,
        "Saving title override"
    );

    let saved = overlay::save_override(
        state.overrides.as_ref(),
        state.catalog.as_ref(),
        &slug,
        edit,
        Some(admin.id.as_str()),
    )
    .await?;

    Ok(Json(saved))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub async fn delete_title(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(slug): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let success = overlay::delete_override(state.overrides.as_ref(), &slug).await?;
    Ok(Json(DeleteResponse { success }))
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub slug: String,
    pub is_hidden: bool,
}

/// Handler for hiding or unhiding a movie
pub async fn toggle_hidden(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AdminUser(admin): AdminUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ToggleResponse>> {
    let is_hidden = overlay::toggle_hidden(
        state.overrides.as_ref(),
        state.catalog.as_ref(),
        &slug,
        Some(admin.id.as_str()),
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        slug = %slug,
        is_hidden = is_hidden,
        "Visibility toggled"
    );

    Ok(Json(ToggleResponse { slug, is_hidden }))
}

#[derive(Debug, Serialize)]
pub struct HiddenResponse {
    pub count: usize,
    pub items: Vec<HiddenMovie>,
}

/// Handler for the hidden-movies list, read from the override table
pub async fn hidden(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<HiddenResponse>> {
    let items = overlay::hidden_movies(state.overrides.as_ref(), state.catalog.as_ref()).await?;
    Ok(Json(HiddenResponse {
        count: items.len(),
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    filter: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub items: Vec<DecoratedItem>,
    pub pages_scanned: u32,
    pub truncated: bool,
}

/// Handler for finding hidden movies inside one catalog listing
pub async fn scan_hidden(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<ScanQuery>,
) -> AppResult<Json<ScanResponse>> {
    let filter = CatalogFilter::from_query(params.filter.as_deref(), params.value.as_deref())?;

    let outcome = overlay::scan_hidden_in_listing(
        state.overrides.as_ref(),
        state.catalog.as_ref(),
        &filter,
        state.hidden_scan_max_pages,
    )
    .await;

    Ok(Json(ScanResponse {
        items: outcome.items,
        pages_scanned: outcome.pages_scanned,
        truncated: outcome.truncated,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    count: Option<usize>,
}

pub async fn top_watched(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<TopQuery>,
) -> AppResult<Json<Vec<TopWatchedMovie>>> {
    let count = params.count.unwrap_or(DEFAULT_TOP_COUNT).min(MAX_TOP_COUNT);
    let movies =
        analytics::top_watched(state.progress.as_ref(), state.catalog.as_ref(), count).await?;
    Ok(Json(movies))
}
