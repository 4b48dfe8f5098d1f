pub mod cache;
pub mod comments;
pub mod favorites;
pub mod memory;
pub mod postgres;
pub mod title_overrides;
pub mod watch_progress;

pub use self::cache::create_redis_client;
pub use self::cache::Cache;
pub use self::cache::CacheKey;
pub use self::comments::{CommentStore, PgCommentStore};
pub use self::favorites::{FavoriteStore, PgFavoriteStore};
pub use self::memory::MemoryStore;
pub use self::postgres::{create_pool, run_migrations};
pub use self::title_overrides::{PgTitleOverrideStore, TitleOverrideStore};
pub use self::watch_progress::{PgWatchProgressStore, WatchProgressStore};
