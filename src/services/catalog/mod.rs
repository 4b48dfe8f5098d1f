/// External movie catalog abstraction
///
/// The catalog is a third-party, read-only source of listings and movie
/// details keyed by slug. It fails intermittently, so callers in the overlay
/// and analytics paths treat every error as recoverable.
use std::fmt::Display;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogDetail, CatalogPage},
};

pub mod phimapi;

/// Which listing to page through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogFilter {
    NewlyUpdated,
    Category(String),
    Country(String),
    Year(i32),
    Search(String),
}

impl CatalogFilter {
    /// Builds a filter from the `filter`/`value` query pair used by the HTTP layer
    pub fn from_query(filter: Option<&str>, value: Option<&str>) -> AppResult<Self> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let required = |name: &str| {
            value
                .map(str::to_string)
                .ok_or_else(|| AppError::InvalidInput(format!("Filter '{}' requires a value", name)))
        };

        match filter.map(str::trim).unwrap_or("new") {
            "" | "new" => Ok(CatalogFilter::NewlyUpdated),
            "category" => Ok(CatalogFilter::Category(required("category")?)),
            "country" => Ok(CatalogFilter::Country(required("country")?)),
            "search" => Ok(CatalogFilter::Search(required("search")?)),
            "year" => {
                let raw = required("year")?;
                raw.parse::<i32>()
                    .map(CatalogFilter::Year)
                    .map_err(|_| AppError::InvalidInput(format!("Invalid year: {}", raw)))
            }
            other => Err(AppError::InvalidInput(format!("Unknown filter: {}", other))),
        }
    }

    /// Stable identifier used in cache keys
    pub fn cache_segment(&self) -> String {
        match self {
            CatalogFilter::NewlyUpdated => "new".to_string(),
            CatalogFilter::Category(slug) => format!("category:{}", slug),
            CatalogFilter::Country(slug) => format!("country:{}", slug),
            CatalogFilter::Year(year) => format!("year:{}", year),
            CatalogFilter::Search(keyword) => format!("search:{}", keyword.trim().to_lowercase()),
        }
    }
}

impl Display for CatalogFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cache_segment())
    }
}

/// Trait for movie catalog sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of a listing. Pages start at 1.
    async fn list_page(&self, filter: &CatalogFilter, page: u32) -> AppResult<CatalogPage>;

    /// Fetch a movie by slug; `Ok(None)` when the catalog does not know it
    async fn detail(&self, slug: &str) -> AppResult<Option<CatalogDetail>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}
