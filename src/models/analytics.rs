use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregated watch counts for one movie slug
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WatchStats {
    pub movie_slug: String,
    pub watchers: i64,
    pub latest_interaction: DateTime<Utc>,
    /// Title cached on the most recently updated progress row
    pub movie_title: Option<String>,
    /// Poster cached on the most recently updated progress row
    pub poster_url: Option<String>,
}

/// Entry of the most-watched ranking
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopWatchedMovie {
    pub slug: String,
    pub title: String,
    pub origin_title: Option<String>,
    pub poster_url: Option<String>,
    pub quality: Option<String>,
    pub watch_count: i64,
}
