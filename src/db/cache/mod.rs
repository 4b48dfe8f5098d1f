pub mod redis_cache;

mod macros;

pub use redis_cache::create_redis_client;
pub use redis_cache::Cache;
pub use redis_cache::CacheKey;
pub use redis_cache::CacheWriterHandle;
