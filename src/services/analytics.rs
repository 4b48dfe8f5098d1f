use crate::{
    db::{TitleOverrideStore, WatchProgressStore},
    error::AppResult,
    models::{TopWatchedMovie, WatchStats},
    services::{catalog::CatalogSource, overlay},
};

/// Most watched movies, ranked by distinct watchers then by recency
///
/// Titles and posters come from the progress rows themselves. Entries that
/// lack either are looked up in the catalog one slug at a time; a failed
/// lookup leaves the entry as it is, titled with its slug.
pub async fn top_watched(
    store: &dyn WatchProgressStore,
    catalog: &dyn CatalogSource,
    count: usize,
) -> AppResult<Vec<TopWatchedMovie>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let stats = store.top_slugs(count as i64).await?;
    Ok(rank(stats, catalog, count).await)
}

/// Top watched movies with hidden titles left out, still `count` long when
/// enough visible ones exist
///
/// Ranks `count` plus the number of hidden titles, so hidden entries near
/// the top cannot push visible ones out. Hidden entries are dropped before
/// any catalog lookup.
pub async fn top_watched_visible(
    store: &dyn WatchProgressStore,
    overrides: &dyn TitleOverrideStore,
    catalog: &dyn CatalogSource,
    count: usize,
) -> AppResult<Vec<TopWatchedMovie>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let hidden_total = match overlay::hidden_count(overrides).await {
        Ok(total) => usize::try_from(total).unwrap_or(0),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to count hidden titles");
            0
        }
    };
    let lookahead = count.saturating_add(hidden_total);

    let mut stats = store.top_slugs(lookahead as i64).await?;
    let slugs: Vec<String> = stats.iter().map(|s| s.movie_slug.clone()).collect();
    let hidden = overlay::hidden_among(overrides, &slugs).await;
    stats.retain(|stat| !hidden.contains(&stat.movie_slug));

    Ok(rank(stats, catalog, count).await)
}

async fn rank(
    stats: Vec<WatchStats>,
    catalog: &dyn CatalogSource,
    count: usize,
) -> Vec<TopWatchedMovie> {
    let mut movies = Vec::with_capacity(stats.len().min(count));

    for stat in stats.into_iter().take(count) {
        let mut movie = from_stats(stat);
        if movie.title.is_empty() || movie.poster_url.is_none() {
            enrich(catalog, &mut movie).await;
        }
        if movie.title.is_empty() {
            movie.title = movie.slug.clone();
        }
        movies.push(movie);
    }

    tracing::debug!(requested = count, returned = movies.len(), "Top watched computed");

    movies
}

fn from_stats(stat: WatchStats) -> TopWatchedMovie {
    TopWatchedMovie {
        title: stat.movie_title.unwrap_or_default(),
        poster_url: stat.poster_url,
        origin_title: None,
        quality: None,
        watch_count: stat.watchers,
        slug: stat.movie_slug,
    }
}

async fn enrich(catalog: &dyn CatalogSource, movie: &mut TopWatchedMovie) {
    let detail = match catalog.detail(&movie.slug).await {
        Ok(Some(detail)) => detail.movie,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(
                error = %e,
                slug = %movie.slug,
                provider = catalog.name(),
                "Failed to enrich top watched entry"
            );
            return;
        }
    };

    if movie.title.is_empty() && !detail.name.is_empty() {
        movie.title = detail.name;
    }
    if movie.poster_url.is_none() && !detail.poster_url.is_empty() {
        movie.poster_url = Some(detail.poster_url);
    }
    if !detail.origin_name.is_empty() {
        movie.origin_title = Some(detail.origin_name);
    }
    movie.quality = detail.quality;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{watch_progress::MockWatchProgressStore, MemoryStore};
    use crate::error::AppError;
    use crate::models::{CatalogDetail, MovieDetail, TitleOverride};
    use crate::services::catalog::MockCatalogSource;
    use chrono::{Duration, Utc};

    fn failing_catalog() -> MockCatalogSource {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_detail()
            .returning(|_| Err(AppError::ExternalApi("catalog down".to_string())));
        catalog.expect_name().return_const("mock");
        catalog
    }

    #[tokio::test]
    async fn test_ranks_by_distinct_watchers() {
        let store = MemoryStore::new();
        let t0 = Utc::now() - Duration::hours(5);
        store.seed_progress("u1", "y", "Y", t0).await.unwrap();
        store.seed_progress("u2", "y", "Y", t0).await.unwrap();
        store.seed_progress("u3", "y", "Y", t0).await.unwrap();
        store.seed_progress("u1", "z", "Z", t0 + Duration::hours(1)).await.unwrap();
        store.seed_progress("u2", "z", "Z", t0 + Duration::hours(1)).await.unwrap();
        store.seed_progress("u1", "w", "W", t0 + Duration::hours(4)).await.unwrap();

        let top = top_watched(&store, &failing_catalog(), 2).await.unwrap();

        let slugs: Vec<&str> = top.iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(slugs, vec!["y", "z"]);
        assert_eq!(top[0].watch_count, 3);
        assert_eq!(top[1].watch_count, 2);
    }

    #[tokio::test]
    async fn test_ties_break_on_latest_interaction() {
        let store = MemoryStore::new();
        let t0 = Utc::now() - Duration::hours(5);
        store.seed_progress("u1", "old", "Old", t0).await.unwrap();
        store.seed_progress("u1", "new", "New", t0 + Duration::hours(1)).await.unwrap();

        let top = top_watched(&store, &failing_catalog(), 5).await.unwrap();

        assert_eq!(top[0].slug, "new");
        assert_eq!(top[1].slug, "old");
    }

    async fn hide(store: &MemoryStore, slug: &str) {
        TitleOverrideStore::upsert(
            store,
            &TitleOverride {
                slug: slug.to_string(),
                custom_title: slug.to_uppercase(),
                original_title: None,
                custom_description: None,
                is_hidden: true,
                updated_at: Utc::now(),
                updated_by: None,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_hidden_leader_does_not_shorten_ranking() {
        let store = MemoryStore::new();
        let t0 = Utc::now() - Duration::hours(5);
        store.seed_progress("u1", "y", "Y", t0).await.unwrap();
        store.seed_progress("u2", "y", "Y", t0).await.unwrap();
        store.seed_progress("u1", "z", "Z", t0 + Duration::hours(1)).await.unwrap();
        store.seed_progress("u1", "w", "W", t0).await.unwrap();
        hide(&store, "y").await;

        let top = top_watched_visible(&store, &store, &failing_catalog(), 2)
            .await
            .unwrap();

        let slugs: Vec<&str> = top.iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(slugs, vec!["z", "w"]);
    }

    #[tokio::test]
    async fn test_hidden_entries_skip_catalog_lookup() {
        let store = MemoryStore::new();
        let t0 = Utc::now() - Duration::hours(1);
        store.seed_progress("u1", "y", "", t0).await.unwrap();
        store.seed_progress("u2", "y", "", t0).await.unwrap();
        store.seed_progress("u1", "z", "", t0).await.unwrap();
        hide(&store, "y").await;

        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_detail()
            .withf(|slug| slug == "z")
            .times(1)
            .returning(|_| Ok(None));
        catalog.expect_name().return_const("mock");

        let top = top_watched_visible(&store, &store, &catalog, 1).await.unwrap();

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].slug, "z");
    }

    #[tokio::test]
    async fn test_zero_count_returns_nothing() {
        let mut store = MockWatchProgressStore::new();
        store.expect_top_slugs().never();
        let catalog = MockCatalogSource::new();

        assert!(top_watched(&store, &catalog, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_catalog_falls_back_to_slug() {
        let store = MemoryStore::new();
        store.seed_progress("u1", "x", "", Utc::now()).await.unwrap();

        let top = top_watched(&store, &failing_catalog(), 5).await.unwrap();

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].title, "x");
        assert_eq!(top[0].poster_url, None);
    }

    #[tokio::test]
    async fn test_missing_metadata_is_enriched_from_catalog() {
        let store = MemoryStore::new();
        store.seed_progress("u1", "x", "", Utc::now()).await.unwrap();

        let mut catalog = MockCatalogSource::new();
        catalog.expect_detail().times(1).returning(|slug| {
            Ok(Some(CatalogDetail {
                movie: MovieDetail {
                    slug: slug.to_string(),
                    name: "Catalog X".to_string(),
                    origin_name: "Origin X".to_string(),
                    poster_url: "https://cdn/x.jpg".to_string(),
                    quality: Some("FHD".to_string()),
                    ..Default::default()
                },
                episodes: vec![],
            }))
        });

        let top = top_watched(&store, &catalog, 5).await.unwrap();

        assert_eq!(top[0].title, "Catalog X");
        assert_eq!(top[0].origin_title.as_deref(), Some("Origin X"));
        assert_eq!(top[0].poster_url.as_deref(), Some("https://cdn/x.jpg"));
        assert_eq!(top[0].quality.as_deref(), Some("FHD"));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockWatchProgressStore::new();
        store
            .expect_top_slugs()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        let catalog = MockCatalogSource::new();

        let result = top_watched(&store, &catalog, 5).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
