use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use movie_catalog_api::{
    db::{MemoryStore, WatchProgressStore},
    error::{AppError, AppResult},
    models::{CatalogDetail, CatalogItem, CatalogPage, MovieDetail, NewWatchProgress, Pagination},
    routes::{create_router, AppState},
    services::catalog::{CatalogFilter, CatalogSource},
};

/// Fixed three-movie catalog; `broken` makes every call fail
struct StubCatalog {
    broken: bool,
}

fn stub_item(slug: &str) -> CatalogItem {
    CatalogItem {
        slug: slug.to_string(),
        name: format!("Movie {}", slug.to_uppercase()),
        origin_name: format!("Origin {}", slug),
        poster_url: format!("https://cdn.test/{}.jpg", slug),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl CatalogSource for StubCatalog {
    async fn list_page(&self, _filter: &CatalogFilter, page: u32) -> AppResult<CatalogPage> {
        if self.broken {
            return Err(AppError::ExternalApi("catalog down".to_string()));
        }
        Ok(CatalogPage {
            items: vec![stub_item("a"), stub_item("b"), stub_item("c")],
            pagination: Some(Pagination {
                total_items: 3,
                total_items_per_page: 3,
                current_page: page,
                total_pages: 1,
            }),
        })
    }

    async fn detail(&self, slug: &str) -> AppResult<Option<CatalogDetail>> {
        if self.broken {
            return Err(AppError::ExternalApi("catalog down".to_string()));
        }
        if !["a", "b", "c"].contains(&slug) {
            return Ok(None);
        }
        let item = stub_item(slug);
        Ok(Some(CatalogDetail {
            movie: MovieDetail {
                slug: item.slug,
                name: item.name,
                origin_name: item.origin_name,
                poster_url: item.poster_url,
                content: "Catalog description".to_string(),
                ..Default::default()
            },
            episodes: vec![],
        }))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn create_test_app_with(store: MemoryStore, broken_catalog: bool) -> Router {
    let state = AppState {
        overrides: Arc::new(store.clone()),
        progress: Arc::new(store.clone()),
        favorites: Arc::new(store.clone()),
        comments: Arc::new(store),
        catalog: Arc::new(StubCatalog {
            broken: broken_catalog,
        }),
        hidden_scan_max_pages: 3,
    };
    create_router(Arc::new(state))
}

fn create_test_app() -> (MemoryStore, Router) {
    let store = MemoryStore::new();
    (store.clone(), create_test_app_with(store, false))
}

/// Writes a progress row straight to the store with a chosen timestamp
async fn record_watch(
    store: &MemoryStore,
    user_id: &str,
    movie_slug: &str,
    movie_title: &str,
    watched_at: DateTime<Utc>,
) -> AppResult<()> {
    WatchProgressStore::insert(
        store,
        &NewWatchProgress {
            user_id: user_id.to_string(),
            movie_slug: movie_slug.to_string(),
            movie_title: movie_title.to_string(),
            poster_url: String::new(),
            episode_name: String::new(),
            episode_slug: String::new(),
            current_time_secs: 0,
            total_time_secs: 0,
            watched_at,
        },
    )
    .await
    .map(|_| ())
}

async fn progress_rows(store: &MemoryStore, user_id: &str) -> usize {
    store.list_for_user(user_id, 200).await.unwrap().len()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn user_request(method: &str, uri: &str, user: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user)
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn admin_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "admin-1")
        .header("x-user-role", "admin")
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_health_check() {
    let (_, app) = create_test_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (_, app) = create_test_app();
    let id = "7f1f6b7e-0c57-4a4e-9a39-1c3c4fd1a2b3";
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", id)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], id);
}

#[tokio::test]
async fn test_hidden_movie_disappears_from_listing_and_detail() {
    let (_, app) = create_test_app();

    let (status, body) = send(
        &app,
        admin_request("POST", "/api/v1/admin/titles/b/toggle-hidden", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_hidden"], true);

    let (status, body) = send(&app, get("/api/v1/movies")).await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["a", "c"]);
    assert_eq!(body["hidden_filtered"], 1);

    let (status, _) = send(&app, get("/api/v1/movies/b")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, admin_request("GET", "/api/v1/movies/b", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_hidden"], true);
}

#[tokio::test]
async fn test_admin_sees_hidden_items_flagged() {
    let (_, app) = create_test_app();
    send(
        &app,
        admin_request("POST", "/api/v1/admin/titles/a/toggle-hidden", None),
    )
    .await;

    let (_, body) = send(
        &app,
        admin_request("GET", "/api/v1/movies?show_hidden=true", None),
    )
    .await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["is_hidden"], true);

    // Anonymous callers cannot opt in
    let (_, body) = send(&app, get("/api/v1/movies?show_hidden=true")).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_custom_title_is_applied_to_listing() {
    let (_, app) = create_test_app();

    let (status, body) = send(
        &app,
        admin_request(
            "PUT",
            "/api/v1/admin/titles/a",
            Some(json!({ "custom_title": "Phim A", "custom_description": "Mô tả A" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_title"], "Movie A");
    assert_eq!(body["updated_by"], "admin-1");

    let (_, body) = send(&app, get("/api/v1/movies")).await;
    assert_eq!(body["items"][0]["display_name"], "Phim A");
    assert_eq!(body["items"][0]["name"], "Movie A");
    assert_eq!(body["items"][0]["custom_description"], "Mô tả A");

    let (_, body) = send(&app, get("/api/v1/movies/a")).await;
    assert_eq!(body["movie"]["name"], "Phim A");
    assert_eq!(body["movie"]["content"], "Mô tả A");
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let (_, app) = create_test_app();

    let (status, body) = send(
        &app,
        user_request("POST", "/api/v1/admin/titles/a/toggle-hidden", "u1", None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, get("/api/v1/admin/hidden")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_progress_requires_user() {
    let (_, app) = create_test_app();
    let (status, _) = send(&app, get("/api/v1/history")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_progress_lifecycle() {
    let (store, app) = create_test_app();

    let (status, _) = send(&app, user_request("GET", "/api/v1/progress/x", "u1", None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        user_request(
            "POST",
            "/api/v1/progress",
            "u1",
            Some(json!({
                "movie_slug": "x",
                "movie_title": "Movie X",
                "episode_name": "Tập 1",
                "episode_slug": "tap-1",
                "current_time": 30,
                "total_time": 1200
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["progress"]["progress_percent"], 2);

    let (_, body) = send(
        &app,
        user_request(
            "POST",
            "/api/v1/progress",
            "u1",
            Some(json!({
                "movie_slug": "x",
                "episode_name": "Tập 2",
                "episode_slug": "tap-2",
                "current_time": 1100,
                "total_time": 1200
            })),
        ),
    )
    .await;
    assert_eq!(body["progress"]["episode_slug"], "tap-2");
    assert_eq!(body["progress"]["movie_title"], "Movie X");
    assert_eq!(body["progress"]["is_completed"], true);
    assert_eq!(progress_rows(&store, "u1").await, 1);

    let (_, body) = send(&app, user_request("GET", "/api/v1/progress/x", "u1", None)).await;
    assert_eq!(body["progress"]["current_time_secs"], 1100);
    let id = body["progress"]["id"].as_i64().unwrap();

    let (_, body) = send(&app, user_request("GET", "/api/v1/history", "u1", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/progress/{}", id);
    let (_, body) = send(&app, user_request("DELETE", &uri, "u2", None)).await;
    assert_eq!(body["success"], false);
    assert_eq!(progress_rows(&store, "u1").await, 1);

    let (_, body) = send(&app, user_request("DELETE", &uri, "u1", None)).await;
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, user_request("GET", "/api/v1/progress/x", "u1", None)).await;
    assert!(body["progress"].is_null());
}

#[tokio::test]
async fn test_invalid_progress_is_bad_request() {
    let (_, app) = create_test_app();
    let (status, body) = send(
        &app,
        user_request(
            "POST",
            "/api/v1/progress",
            "u1",
            Some(json!({ "movie_slug": "x", "current_time": -5, "total_time": 100 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("negative"));
}

#[tokio::test]
async fn test_home_ranks_watched_movies() {
    let (store, app) = create_test_app();
    let t0 = Utc::now() - Duration::hours(2);
    tokio_test::assert_ok!(record_watch(&store, "u1", "b", "Movie B", t0).await);
    tokio_test::assert_ok!(record_watch(&store, "u2", "b", "Movie B", t0).await);
    tokio_test::assert_ok!(record_watch(&store, "u1", "c", "", t0 + Duration::hours(1)).await);

    let (status, body) = send(&app, get("/api/v1/home?count=5")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "analytics");
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["slug"], "b");
    assert_eq!(movies[0]["watch_count"], 2);
    // No cached title, so it was resolved from the catalog
    assert_eq!(movies[1]["title"], "Movie C");
}

#[tokio::test]
async fn test_home_fills_count_past_hidden_leader() {
    let (store, app) = create_test_app();
    let t0 = Utc::now() - Duration::hours(2);
    tokio_test::assert_ok!(record_watch(&store, "u1", "b", "Movie B", t0).await);
    tokio_test::assert_ok!(record_watch(&store, "u2", "b", "Movie B", t0).await);
    tokio_test::assert_ok!(record_watch(&store, "u1", "c", "Movie C", t0).await);
    send(
        &app,
        admin_request("POST", "/api/v1/admin/titles/b/toggle-hidden", None),
    )
    .await;

    let (_, body) = send(&app, get("/api/v1/home?count=1")).await;

    assert_eq!(body["source"], "analytics");
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["slug"], "c");
}

#[tokio::test]
async fn test_home_falls_back_to_catalog() {
    let (_, app) = create_test_app();

    let (_, body) = send(&app, get("/api/v1/home?count=2")).await;

    assert_eq!(body["source"], "catalog");
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["watch_count"], 0);
}

#[tokio::test]
async fn test_top_watched_survives_catalog_outage() {
    let store = MemoryStore::new();
    tokio_test::assert_ok!(record_watch(&store, "u1", "x", "", Utc::now()).await);
    let app = create_test_app_with(store, true);

    let (status, body) = send(&app, admin_request("GET", "/api/v1/admin/top-watched", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "x");
    assert_eq!(body[0]["watch_count"], 1);
}

#[tokio::test]
async fn test_catalog_outage_on_listing_is_bad_gateway() {
    let app = create_test_app_with(MemoryStore::new(), true);
    let (status, _) = send(&app, get("/api/v1/movies")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_hidden_list_and_scan() {
    let (_, app) = create_test_app();
    send(
        &app,
        admin_request("POST", "/api/v1/admin/titles/c/toggle-hidden", None),
    )
    .await;

    let (_, body) = send(&app, admin_request("GET", "/api/v1/admin/hidden", None)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["slug"], "c");
    assert_eq!(body["items"][0]["title"], "Movie C");

    let (status, body) = send(
        &app,
        admin_request("GET", "/api/v1/admin/hidden/scan?filter=category&value=hanh-dong", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages_scanned"], 1);
    assert_eq!(body["truncated"], false);
    assert_eq!(body["items"][0]["slug"], "c");

    let (_, body) = send(&app, admin_request("GET", "/api/v1/admin/dashboard", None)).await;
    assert_eq!(body["hidden_count"], 1);
    assert_eq!(body["catalog_total_items"], 3);
}

#[tokio::test]
async fn test_favorites_are_idempotent() {
    let (_, app) = create_test_app();
    let favorite = json!({ "movie_title": "Movie A", "year": 2024 });

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            user_request("PUT", "/api/v1/favorites/a", "u1", Some(favorite.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (_, body) = send(&app, user_request("GET", "/api/v1/favorites", "u1", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, user_request("GET", "/api/v1/favorites/a", "u1", None)).await;
    assert_eq!(body["is_favorite"], true);

    let (_, body) = send(&app, user_request("DELETE", "/api/v1/favorites/a", "u1", None)).await;
    assert_eq!(body["success"], true);
    let (_, body) = send(&app, user_request("DELETE", "/api/v1/favorites/a", "u1", None)).await;
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, user_request("GET", "/api/v1/favorites", "u1", None)).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_thread_lifecycle() {
    let (_, app) = create_test_app();

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/v1/movies/a/comments")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "content": "anonymous" }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        user_request(
            "POST",
            "/api/v1/movies/a/comments",
            "u1",
            Some(json!({ "movie_title": "Movie A", "content": "  great pacing  " })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["comment"]["content"], "great pacing");
    let id = body["comment"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/movies/a/comments/{}", id);

    let (_, body) = send(
        &app,
        user_request("PUT", &uri, "u2", Some(json!({ "content": "not mine" }))),
    )
    .await;
    assert_eq!(body["success"], false);
    assert!(body["comment"].is_null());

    let (_, body) = send(
        &app,
        user_request("PUT", &uri, "u1", Some(json!({ "content": "great ending" }))),
    )
    .await;
    assert_eq!(body["success"], true);
    assert!(!body["comment"]["updated_at"].is_null());

    let (status, body) = send(&app, get("/api/v1/movies/a/comments")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["comments"][0]["content"], "great ending");

    let (_, body) = send(&app, user_request("DELETE", &uri, "u2", None)).await;
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, admin_request("DELETE", &uri, None)).await;
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, get("/api/v1/movies/a/comments")).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_oversized_comment_is_bad_request() {
    let (_, app) = create_test_app();
    let content = "x".repeat(1001);

    let (status, body) = send(
        &app,
        user_request(
            "POST",
            "/api/v1/movies/a/comments",
            "u1",
            Some(json!({ "content": content })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("1000"));
}
