use crate::error::Result;
use crate::memory::MemoryTenantCache;
use crate::redis_cache::{CacheBackend, CacheConfig, RedisTenantCache};
use async_trait::async_trait;
use mtapp_models::Attributes;
use std::sync::Arc;

/// Shared qualifier -> tenant attribute store.
///
/// A `None` from [`read`](TenantCache::read) is an ordinary miss (never
/// written, deleted, or evicted). Errors are reserved for backend failures.
/// Writes to the same qualifier are last-write-wins.
#[async_trait]
pub trait TenantCache: Send + Sync {
    async fn read(&self, qualifier: &str) -> Result<Option<Attributes>>;

    async fn write(&self, qualifier: &str, attributes: &Attributes) -> Result<()>;

    /// Deleting a missing entry is not an error.
    async fn delete(&self, qualifier: &str) -> Result<()>;
}

/// Build the tenant cache selected by `config.backend`.
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn TenantCache>> {
    match config.backend {
        CacheBackend::Memory => {
            tracing::info!(
                "Using in-process tenant cache (capacity {}, ttl {:?}s)",
                config.max_capacity,
                config.ttl_seconds
            );
            Ok(Arc::new(MemoryTenantCache::new(config)))
        }
        CacheBackend::Redis => Ok(Arc::new(RedisTenantCache::connect(config).await?)),
    }
}
