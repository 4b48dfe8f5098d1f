use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{identity::AdminUser, request_id::RequestId},
    models::{CatalogDetail, DecoratedItem, Pagination, TopWatchedMovie},
    routes::AppState,
    services::{
        analytics,
        catalog::CatalogFilter,
        overlay::{self, OverlayOptions},
    },
};

const DEFAULT_HOME_COUNT: usize = 10;
const MAX_HOME_COUNT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    /// `analytics` when ranked by watch data, `catalog` for the fallback
    pub source: &'static str,
    pub movies: Vec<TopWatchedMovie>,
}

/// Handler for the home page ranking
///
/// Falls back to the newest catalog items, unranked, while nobody has
/// watched anything yet.
pub async fn home(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HomeQuery>,
) -> AppResult<Json<HomeResponse>> {
    let count = params
        .count
        .unwrap_or(DEFAULT_HOME_COUNT)
        .clamp(1, MAX_HOME_COUNT);

    let movies = analytics::top_watched_visible(
        state.progress.as_ref(),
        state.overrides.as_ref(),
        state.catalog.as_ref(),
        count,
    )
    .await?;

    if !movies.is_empty() {
        return Ok(Json(HomeResponse {
            source: "analytics",
            movies,
        }));
    }

    let items = match state
        .catalog
        .list_page(&CatalogFilter::NewlyUpdated, 1)
        .await
    {
        Ok(page) => page.items,
        Err(e) => {
            tracing::warn!(error = %e, "Home fallback listing unavailable");
            Vec::new()
        }
    };

    let outcome =
        overlay::apply_overlay(state.overrides.as_ref(), items, OverlayOptions::default()).await;

    let movies = outcome
        .items
        .into_iter()
        .take(count)
        .map(|decorated| TopWatchedMovie {
            title: decorated.display_name,
            origin_title: Some(decorated.item.origin_name).filter(|name| !name.is_empty()),
            poster_url: Some(decorated.item.poster_url).filter(|url| !url.is_empty()),
            quality: decorated.item.quality,
            watch_count: 0,
            slug: decorated.item.slug,
        })
        .collect();

    Ok(Json(HomeResponse {
        source: "catalog",
        movies,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    filter: Option<String>,
    value: Option<String>,
    page: Option<u32>,
    #[serde(default)]
    show_hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<DecoratedItem>,
    pub pagination: Option<Pagination>,
    pub hidden_filtered: usize,
    pub degraded: bool,
}

/// Handler for catalog listings with overrides applied
///
/// `show_hidden` is honored for admins only.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    admin: Option<AdminUser>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    let filter = CatalogFilter::from_query(params.filter.as_deref(), params.value.as_deref())?;
    let page = params.page.unwrap_or(1).max(1);
    let show_hidden = params.show_hidden && admin.is_some();

    let catalog_page = state.catalog.list_page(&filter, page).await?;
    let outcome = overlay::apply_overlay(
        state.overrides.as_ref(),
        catalog_page.items,
        OverlayOptions { show_hidden },
    )
    .await;

    tracing::info!(
        request_id = %request_id,
        filter = %filter,
        page = page,
        results = outcome.items.len(),
        hidden_filtered = outcome.hidden_filtered,
        degraded = outcome.degraded,
        "Listing served"
    );

    Ok(Json(ListResponse {
        items: outcome.items,
        pagination: catalog_page.pagination,
        hidden_filtered: outcome.hidden_filtered,
        degraded: outcome.degraded,
    }))
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    #[serde(flatten)]
    pub detail: CatalogDetail,
    pub is_hidden: bool,
}

/// Handler for a movie detail page. Hidden movies exist only for admins.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    admin: Option<AdminUser>,
    Path(slug): Path<String>,
) -> AppResult<Json<DetailResponse>> {
    let not_found = || AppError::NotFound(format!("Movie '{}' not found", slug));

    let detail = state
        .catalog
        .detail(&slug)
        .await?
        .ok_or_else(not_found)?;

    let decorated = overlay::overlay_detail(state.overrides.as_ref(), detail).await;
    if decorated.is_hidden && admin.is_none() {
        return Err(not_found());
    }

    Ok(Json(DetailResponse {
        detail: decorated.detail,
        is_hidden: decorated.is_hidden,
    }))
}
