use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest comment body accepted, counted in characters
pub const MAX_COMMENT_CHARS: usize = 1000;

/// A user's comment on a movie page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct MovieComment {
    pub id: i64,
    pub user_id: String,
    pub movie_slug: String,
    pub movie_title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// `None` until the author edits the comment
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: String,
    pub movie_slug: String,
    pub movie_title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
