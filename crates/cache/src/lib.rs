pub mod error;
pub mod memory;
pub mod redis_cache;
pub mod store;

pub use error::{CacheError, Result};
pub use memory::MemoryTenantCache;
pub use redis_cache::{tenant_cache_key, Cache, CacheBackend, CacheConfig, RedisTenantCache};
pub use store::{connect, TenantCache};
