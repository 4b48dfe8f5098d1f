use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::{
    db::TitleOverrideStore,
    error::{AppError, AppResult},
    models::{
        CatalogDetail, CatalogItem, DecoratedItem, HiddenMovie, OverrideEdit, TitleOverride,
    },
    services::catalog::{CatalogFilter, CatalogSource},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayOptions {
    /// Keep hidden movies in the output, flagged as hidden
    pub show_hidden: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayOutcome {
    pub items: Vec<DecoratedItem>,
    /// Number of items dropped because they are hidden
    pub hidden_filtered: usize,
    /// Overrides could not be loaded; items are shown as the catalog sent them
    pub degraded: bool,
}

/// Detail page after overrides were applied
#[derive(Debug, Clone)]
pub struct DetailOverlay {
    pub detail: CatalogDetail,
    pub is_hidden: bool,
}

/// Applies admin overrides to a page of catalog items
///
/// Overrides for the whole page are fetched in one batch. For every item with
/// an override the first-seen catalog name is captured as `original_title`,
/// the custom title replaces the display name and the custom description is
/// attached. Hidden items are dropped unless `options.show_hidden` is set.
///
/// Never fails: if the overrides cannot be loaded the items pass through
/// undecorated and the outcome is marked as degraded.
pub async fn apply_overlay(
    store: &dyn TitleOverrideStore,
    items: Vec<CatalogItem>,
    options: OverlayOptions,
) -> OverlayOutcome {
    let mut slugs: Vec<String> = items
        .iter()
        .map(|item| item.slug.clone())
        .filter(|slug| !slug.is_empty())
        .collect();
    slugs.sort();
    slugs.dedup();

    if slugs.is_empty() {
        return OverlayOutcome {
            items: items.into_iter().map(DecoratedItem::plain).collect(),
            ..Default::default()
        };
    }

    let mut overrides: HashMap<String, TitleOverride> = match store.find_by_slugs(&slugs).await {
        Ok(rows) => rows.into_iter().map(|row| (row.slug.clone(), row)).collect(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                slugs = slugs.len(),
                "Failed to load title overrides, showing catalog data as-is"
            );
            return OverlayOutcome {
                items: items.into_iter().map(DecoratedItem::plain).collect(),
                hidden_filtered: 0,
                degraded: true,
            };
        }
    };

    let mut outcome = OverlayOutcome::default();

    for item in items {
        let Some(record) = overrides.get_mut(&item.slug) else {
            outcome.items.push(DecoratedItem::plain(item));
            continue;
        };

        capture_original_title(store, record, &item.name).await;

        if record.is_hidden && !options.show_hidden {
            outcome.hidden_filtered += 1;
            continue;
        }

        outcome.items.push(decorate(item, record));
    }

    outcome
}

/// Applies an override to a movie detail. `None` detail fields are left alone.
pub async fn overlay_detail(store: &dyn TitleOverrideStore, mut detail: CatalogDetail) -> DetailOverlay {
    let mut record = match store.find(&detail.movie.slug).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return DetailOverlay {
                detail,
                is_hidden: false,
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                slug = %detail.movie.slug,
                "Failed to load title override for detail"
            );
            return DetailOverlay {
                detail,
                is_hidden: false,
            };
        }
    };

    capture_original_title(store, &mut record, &detail.movie.name).await;

    if let Some(title) = record.display_title() {
        detail.movie.name = title.to_string();
    }
    if let Some(description) = record.display_description() {
        detail.movie.content = description.to_string();
    }

    DetailOverlay {
        detail,
        is_hidden: record.is_hidden,
    }
}

/// One-time capture of the catalog name; later pages never overwrite it
async fn capture_original_title(store: &dyn TitleOverrideStore, record: &mut TitleOverride, catalog_name: &str) {
    if record.has_original_title() || catalog_name.is_empty() {
        return;
    }

    match store
        .set_original_title_if_empty(&record.slug, catalog_name)
        .await
    {
        Ok(_) => record.original_title = Some(catalog_name.to_string()),
        Err(e) => {
            tracing::warn!(
                error = %e,
                slug = %record.slug,
                "Failed to backfill original title"
            );
        }
    }
}

fn decorate(item: CatalogItem, record: &TitleOverride) -> DecoratedItem {
    let display_name = record
        .display_title()
        .map(str::to_string)
        .unwrap_or_else(|| item.name.clone());

    DecoratedItem {
        display_name,
        custom_description: record.display_description().map(str::to_string),
        is_hidden: record.is_hidden,
        item,
    }
}

/// Whether a movie is hidden. Store failures count as visible.
pub async fn is_hidden(store: &dyn TitleOverrideStore, slug: &str) -> bool {
    match store.find(slug).await {
        Ok(record) => record.is_some_and(|r| r.is_hidden),
        Err(e) => {
            tracing::warn!(error = %e, slug = %slug, "Failed to check hidden flag");
            false
        }
    }
}

/// The hidden subset of `slugs`. Store failures count as nothing hidden.
pub async fn hidden_among(store: &dyn TitleOverrideStore, slugs: &[String]) -> HashSet<String> {
    if slugs.is_empty() {
        return HashSet::new();
    }

    match store.find_by_slugs(slugs).await {
        Ok(rows) => rows
            .into_iter()
            .filter(|row| row.is_hidden)
            .map(|row| row.slug)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, slugs = slugs.len(), "Failed to load hidden flags");
            HashSet::new()
        }
    }
}

/// Best-effort catalog name lookup; `None` when unknown or the catalog fails
async fn catalog_name(catalog: &dyn CatalogSource, slug: &str) -> Option<String> {
    match catalog.detail(slug).await {
        Ok(Some(detail)) if !detail.movie.name.is_empty() => Some(detail.movie.name),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(
                error = %e,
                slug = %slug,
                provider = catalog.name(),
                "Catalog lookup failed, continuing without catalog name"
            );
            None
        }
    }
}

/// Flips the hidden flag of a movie and returns the new state
///
/// A movie without an override gets one, hidden, titled with its catalog
/// name (or its slug when the catalog cannot be reached). Toggling an
/// existing override touches only the flag and the audit fields.
pub async fn toggle_hidden(
    store: &dyn TitleOverrideStore,
    catalog: &dyn CatalogSource,
    slug: &str,
    actor: Option<&str>,
) -> AppResult<bool> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(AppError::InvalidInput("Movie slug cannot be empty".to_string()));
    }

    let record = match store.find(slug).await? {
        Some(mut record) => {
            record.is_hidden = !record.is_hidden;
            record.touch(actor);
            record
        }
        None => {
            let name = catalog_name(catalog, slug).await;
            TitleOverride {
                slug: slug.to_string(),
                custom_title: name.clone().unwrap_or_else(|| slug.to_string()),
                original_title: name,
                custom_description: None,
                is_hidden: true,
                updated_at: Utc::now(),
                updated_by: actor.map(str::to_string),
            }
        }
    };

    let saved = store.upsert(&record).await?;

    tracing::info!(
        slug = %slug,
        is_hidden = saved.is_hidden,
        actor = actor.unwrap_or("unknown"),
        "Toggled movie visibility"
    );

    Ok(saved.is_hidden)
}

/// Creates or updates the custom title and description of a movie
pub async fn save_override(
    store: &dyn TitleOverrideStore,
    catalog: &dyn CatalogSource,
    slug: &str,
    edit: OverrideEdit,
    actor: Option<&str>,
) -> AppResult<TitleOverride> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(AppError::InvalidInput("Movie slug cannot be empty".to_string()));
    }
    let custom_title = edit.custom_title.trim();
    if custom_title.is_empty() {
        return Err(AppError::InvalidInput("Custom title cannot be empty".to_string()));
    }
    let custom_description = edit
        .custom_description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let record = match store.find(slug).await? {
        Some(mut record) => {
            record.custom_title = custom_title.to_string();
            record.custom_description = custom_description;
            record.touch(actor);
            record
        }
        None => {
            let original_title = match edit.original_title.filter(|t| !t.trim().is_empty()) {
                Some(title) => Some(title),
                None => catalog_name(catalog, slug).await,
            };
            TitleOverride {
                slug: slug.to_string(),
                custom_title: custom_title.to_string(),
                original_title,
                custom_description,
                is_hidden: false,
                updated_at: Utc::now(),
                updated_by: actor.map(str::to_string),
            }
        }
    };

    let saved = store.upsert(&record).await?;
    tracing::info!(slug = %slug, actor = actor.unwrap_or("unknown"), "Saved title override");
    Ok(saved)
}

/// Removes an override. Returns `false` when there was none.
pub async fn delete_override(store: &dyn TitleOverrideStore, slug: &str) -> AppResult<bool> {
    let deleted = store.delete(slug).await?;
    if deleted {
        tracing::info!(slug = %slug, "Deleted title override");
    }
    Ok(deleted)
}

pub async fn list_overrides(store: &dyn TitleOverrideStore) -> AppResult<Vec<TitleOverride>> {
    store.list().await
}

pub async fn hidden_count(store: &dyn TitleOverrideStore) -> AppResult<i64> {
    store.count_hidden().await
}

/// Lists hidden movies straight from the override table
///
/// The table already indexes every hidden slug, so no catalog pagination is
/// needed. Each slug is resolved through the catalog detail endpoint for a
/// poster; when that fails the stored titles are used.
pub async fn hidden_movies(
    store: &dyn TitleOverrideStore,
    catalog: &dyn CatalogSource,
) -> AppResult<Vec<HiddenMovie>> {
    let hidden = store.list_hidden().await?;
    let mut movies = Vec::with_capacity(hidden.len());

    for record in hidden {
        let detail = match catalog.detail(&record.slug).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(error = %e, slug = %record.slug, "Failed to resolve hidden movie");
                None
            }
        };

        let title = record
            .display_title()
            .map(str::to_string)
            .or_else(|| detail.as_ref().map(|d| d.movie.name.clone()))
            .unwrap_or_else(|| record.slug.clone());
        let poster_url = detail
            .map(|d| d.movie.poster_url)
            .filter(|url| !url.is_empty());

        movies.push(HiddenMovie {
            slug: record.slug,
            title,
            original_title: record.original_title,
            poster_url,
            updated_at: record.updated_at,
            updated_by: record.updated_by,
        });
    }

    Ok(movies)
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub items: Vec<DecoratedItem>,
    pub pages_scanned: u32,
    /// The page cap was reached while the source still reported more pages
    pub truncated: bool,
}

/// Walks a catalog listing page by page and collects its hidden movies
///
/// Stops after `max_pages` pages, when the source reports no further page,
/// when a page comes back empty, or when the source fails. A source failure
/// ends the scan with what was collected so far.
pub async fn scan_hidden_in_listing(
    store: &dyn TitleOverrideStore,
    catalog: &dyn CatalogSource,
    filter: &CatalogFilter,
    max_pages: u32,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let mut page = 1;

    while page <= max_pages {
        let catalog_page = match catalog.list_page(filter, page).await {
            Ok(catalog_page) => catalog_page,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    filter = %filter,
                    page = page,
                    "Hidden scan stopped on catalog failure"
                );
                break;
            }
        };
        outcome.pages_scanned += 1;

        if catalog_page.items.is_empty() {
            break;
        }

        let decorated = apply_overlay(store, catalog_page.items, OverlayOptions { show_hidden: true }).await;
        outcome
            .items
            .extend(decorated.items.into_iter().filter(|item| item.is_hidden));

        let has_more = catalog_page
            .pagination
            .as_ref()
            .is_some_and(|p| p.has_page_after(page));
        if !has_more {
            break;
        }
        if page == max_pages {
            outcome.truncated = true;
            break;
        }
        page += 1;
    }

    tracing::info!(
        filter = %filter,
        pages_scanned = outcome.pages_scanned,
        hidden_found = outcome.items.len(),
        truncated = outcome.truncated,
        "Hidden scan completed"
    );

    outcome
}
