use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress at or above this percentage marks an episode as completed
pub const COMPLETED_PERCENT: i32 = 90;

/// Last known playback position of one user on one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchProgress {
    pub id: i64,
    pub user_id: String,
    pub movie_slug: String,
    pub movie_title: String,
    pub poster_url: String,
    pub episode_name: String,
    pub episode_slug: String,
    pub current_time_secs: i32,
    pub total_time_secs: i32,
    pub first_watched_at: DateTime<Utc>,
    pub last_watched_at: DateTime<Utc>,
}

impl WatchProgress {
    /// Whole percent watched, always within `0..=100`
    pub fn progress_percent(&self) -> i32 {
        if self.total_time_secs <= 0 {
            return 0;
        }
        let percent = i64::from(self.current_time_secs) * 100 / i64::from(self.total_time_secs);
        percent.clamp(0, 100) as i32
    }

    pub fn is_completed(&self) -> bool {
        self.progress_percent() >= COMPLETED_PERCENT
    }
}

/// Player report sent while a user watches an episode
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressUpdate {
    pub movie_slug: String,
    #[serde(default)]
    pub movie_title: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub episode_name: String,
    #[serde(default)]
    pub episode_slug: String,
    pub current_time: i32,
    pub total_time: i32,
}

/// Row to insert for a (user, movie) pair that has no progress yet
#[derive(Debug, Clone)]
pub struct NewWatchProgress {
    pub user_id: String,
    pub movie_slug: String,
    pub movie_title: String,
    pub poster_url: String,
    pub episode_name: String,
    pub episode_slug: String,
    pub current_time_secs: i32,
    pub total_time_secs: i32,
    pub watched_at: DateTime<Utc>,
}
