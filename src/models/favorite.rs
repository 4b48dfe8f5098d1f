use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct FavoriteMovie {
    pub id: i64,
    pub user_id: String,
    pub movie_slug: String,
    pub movie_title: String,
    pub origin_name: String,
    pub poster_url: String,
    pub thumb_url: String,
    pub year: Option<i32>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub user_id: String,
    pub movie_slug: String,
    pub movie_title: String,
    pub origin_name: String,
    pub poster_url: String,
    pub thumb_url: String,
    pub year: Option<i32>,
    pub added_at: DateTime<Utc>,
}
