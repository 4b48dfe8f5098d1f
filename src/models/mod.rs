use serde::{Deserialize, Serialize};

pub mod analytics;
pub mod comment;
pub mod favorite;
pub mod title_override;
pub mod watch_progress;

pub use analytics::{TopWatchedMovie, WatchStats};
pub use comment::{MovieComment, NewComment, MAX_COMMENT_CHARS};
pub use favorite::{FavoriteMovie, NewFavorite};
pub use title_override::{HiddenMovie, OverrideEdit, TitleOverride};
pub use watch_progress::{NewWatchProgress, ProgressUpdate, WatchProgress};

/// A movie as it appears in a catalog listing page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub origin_name: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub episode_current: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_items_per_page: u32,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl Pagination {
    /// Whether the source reports a page after `page`
    pub fn has_page_after(&self, page: u32) -> bool {
        page < self.total_pages
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub pagination: Option<Pagination>,
}

/// Category or country reference attached to a movie
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Taxon {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Full movie record from the catalog detail endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub origin_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub episode_current: Option<String>,
    #[serde(default)]
    pub episode_total: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub actor: Vec<String>,
    #[serde(default)]
    pub director: Vec<String>,
    #[serde(default)]
    pub category: Vec<Taxon>,
    #[serde(default)]
    pub country: Vec<Taxon>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub link_embed: String,
    #[serde(default)]
    pub link_m3u8: String,
}

/// Episodes grouped by the streaming server that hosts them
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodeServer {
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub server_data: Vec<Episode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogDetail {
    pub movie: MovieDetail,
    #[serde(default)]
    pub episodes: Vec<EpisodeServer>,
}

/// Catalog item after admin overrides were applied
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DecoratedItem {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub display_name: String,
    pub custom_description: Option<String>,
    pub is_hidden: bool,
}

impl DecoratedItem {
    /// Wraps an item that has no override
    pub fn plain(item: CatalogItem) -> Self {
        Self {
            display_name: item.name.clone(),
            item,
            custom_description: None,
            is_hidden: false,
        }
    }
}

// ============================================================================
// Catalog API Types
// ============================================================================

/// Raw listing response. Legacy endpoints return `items` at the top level,
/// `/v1/api` endpoints nest them under `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiListResponse {
    #[serde(default)]
    pub items: Option<Vec<CatalogItem>>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub data: Option<ApiListData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiListData {
    #[serde(default)]
    pub items: Option<Vec<CatalogItem>>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub params: Option<ApiListParams>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiListParams {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl From<ApiListResponse> for CatalogPage {
    fn from(response: ApiListResponse) -> Self {
        let (data_items, data_pagination) = match response.data {
            Some(data) => (
                data.items,
                data.pagination
                    .or_else(|| data.params.and_then(|params| params.pagination)),
            ),
            None => (None, None),
        };

        CatalogPage {
            items: data_items.or(response.items).unwrap_or_default(),
            pagination: data_pagination.or(response.pagination),
        }
    }
}

/// Raw detail response from GET /phim/{slug}
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDetailResponse {
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub movie: Option<MovieDetail>,
    #[serde(default)]
    pub episodes: Vec<EpisodeServer>,
}

impl ApiDetailResponse {
    /// The API reports missing movies with `status: false` and no movie body
    pub fn into_detail(self) -> Option<CatalogDetail> {
        if self.status == serde_json::Value::Bool(false) {
            return None;
        }

        self.movie.map(|movie| CatalogDetail {
            movie,
            episodes: self.episodes,
        })
    }
}
