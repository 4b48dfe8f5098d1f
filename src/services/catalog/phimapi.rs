/// phimapi.com catalog client
///
/// API Flow:
/// 1. Newly updated listing: /danh-sach/phim-moi-cap-nhat → items at the top level
/// 2. Filtered listings: /v1/api/{the-loai|quoc-gia|nam}/{slug}, /v1/api/tim-kiem
///    → items nested under `data`, image paths relative to the CDN
/// 3. Detail: /phim/{slug} → movie plus episode servers
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ApiDetailResponse, ApiListResponse, CatalogDetail, CatalogItem, CatalogPage},
    services::catalog::{CatalogFilter, CatalogSource},
};
use reqwest::{Client as HttpClient, StatusCode, Url};
use std::time::Duration;

const PAGE_CACHE_TTL: u64 = 300; // 5 minutes
const DETAIL_CACHE_TTL: u64 = 3600; // 1 hour

#[derive(Clone)]
pub struct PhimApiClient {
    http_client: HttpClient,
    api_url: Url,
    cdn_url: String,
    cache: Cache,
}

impl PhimApiClient {
    pub fn new(cache: Cache, api_url: String, cdn_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        let parsed = Url::parse(api_url.trim())
            .map_err(|e| AppError::Internal(format!("Invalid catalog API url '{}': {}", api_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "Catalog API url '{}' cannot carry a path",
                api_url
            )));
        }

        Ok(Self {
            http_client,
            api_url: parsed,
            cdn_url: cdn_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// API url with `segments` appended, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Catalog API url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Url and query parameters for one listing page
    fn page_request(
        &self,
        filter: &CatalogFilter,
        page: u32,
    ) -> AppResult<(Url, Vec<(&'static str, String)>)> {
        let page_param = ("page", page.to_string());
        let request = match filter {
            CatalogFilter::NewlyUpdated => (
                self.endpoint(&["danh-sach", "phim-moi-cap-nhat"])?,
                vec![page_param],
            ),
            CatalogFilter::Category(slug) => (
                self.endpoint(&["v1", "api", "the-loai", slug])?,
                vec![page_param],
            ),
            CatalogFilter::Country(slug) => (
                self.endpoint(&["v1", "api", "quoc-gia", slug])?,
                vec![page_param],
            ),
            CatalogFilter::Year(year) => (
                self.endpoint(&["v1", "api", "nam", &year.to_string()])?,
                vec![page_param],
            ),
            CatalogFilter::Search(keyword) => (
                self.endpoint(&["v1", "api", "tim-kiem"])?,
                vec![("keyword", keyword.trim().to_string()), page_param],
            ),
        };
        Ok(request)
    }

    /// Prefixes relative image paths with the CDN base
    fn absolute_image_url(&self, url: &str) -> String {
        if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!("{}/{}", self.cdn_url, url.trim_start_matches('/'))
    }

    fn normalize_item(&self, mut item: CatalogItem) -> CatalogItem {
        item.poster_url = self.absolute_image_url(&item.poster_url);
        item.thumb_url = self.absolute_image_url(&item.thumb_url);
        item
    }

    async fn fetch_page(&self, filter: &CatalogFilter, page: u32) -> AppResult<CatalogPage> {
        let (url, query) = self.page_request(filter, page)?;

        let response = self.http_client.get(url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Catalog API returned status {}: {}",
                status, body
            )));
        }

        let body: ApiListResponse = response.json().await?;
        let mut catalog_page = CatalogPage::from(body);
        catalog_page.items = catalog_page
            .items
            .into_iter()
            .map(|item| self.normalize_item(item))
            .collect();

        tracing::info!(
            filter = %filter,
            page = page,
            results = catalog_page.items.len(),
            provider = "phimapi",
            "Catalog page fetched"
        );

        Ok(catalog_page)
    }

    async fn fetch_detail(&self, slug: &str) -> AppResult<Option<CatalogDetail>> {
        let url = self.endpoint(&["phim", slug])?;

        let response = self.http_client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Catalog API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let body: ApiDetailResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                slug = %slug,
                "Failed to deserialize catalog detail response"
            );
            AppError::ExternalApi(format!("Failed to parse catalog response: {}", e))
        })?;

        let detail = body.into_detail().map(|mut detail| {
            detail.movie.poster_url = self.absolute_image_url(&detail.movie.poster_url);
            detail.movie.thumb_url = self.absolute_image_url(&detail.movie.thumb_url);
            detail
        });

        tracing::info!(
            slug = %slug,
            found = detail.is_some(),
            provider = "phimapi",
            "Catalog detail fetched"
        );

        Ok(detail)
    }
}

#[async_trait::async_trait]
impl CatalogSource for PhimApiClient {
    async fn list_page(&self, filter: &CatalogFilter, page: u32) -> AppResult<CatalogPage> {
        if let CatalogFilter::Search(keyword) = filter {
            if keyword.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "Search keyword cannot be empty".to_string(),
                ));
            }
        }

        let page = page.max(1);

        cached!(
            self.cache,
            CacheKey::CatalogPage(filter.cache_segment(), page),
            PAGE_CACHE_TTL,
            self.fetch_page(filter, page)
        )
    }

    async fn detail(&self, slug: &str) -> AppResult<Option<CatalogDetail>> {
        let key = CacheKey::MovieDetail(slug.to_string());

        if let Some(cached) = self.cache.get_from_cache::<CatalogDetail>(&key).await {
            return Ok(Some(cached));
        }

        // Misses are not cached so a movie added upstream shows up on the next request
        let detail = self.fetch_detail(slug).await?;
        if let Some(found) = &detail {
            self.cache.set_in_background(&key, found, DETAIL_CACHE_TTL);
        }

        Ok(detail)
    }

    fn name(&self) -> &'static str {
        "phimapi"
    }
}
