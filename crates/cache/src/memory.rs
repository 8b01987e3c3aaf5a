use crate::error::Result;
use crate::redis_cache::CacheConfig;
use crate::store::TenantCache;
use async_trait::async_trait;
use moka::future::Cache;
use mtapp_models::Attributes;
use std::sync::Arc;
use std::time::Duration;

/// In-process tenant cache. Entries are shared by every request handled
/// by this process and dropped on capacity pressure or TTL expiry.
#[derive(Clone)]
pub struct MemoryTenantCache {
    entries: Cache<String, Arc<Attributes>>,
}

impl MemoryTenantCache {
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = Cache::<String, Arc<Attributes>>::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.ttl_seconds {
            builder = builder.time_to_live(Duration::from_secs(ttl));
        }

        Self {
            entries: builder.build(),
        }
    }
}

impl Default for MemoryTenantCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl TenantCache for MemoryTenantCache {
    async fn read(&self, qualifier: &str) -> Result<Option<Attributes>> {
        Ok(self
            .entries
            .get(qualifier)
            .await
            .map(|attributes| attributes.as_ref().clone()))
    }

    async fn write(&self, qualifier: &str, attributes: &Attributes) -> Result<()> {
        self.entries
            .insert(qualifier.to_string(), Arc::new(attributes.clone()))
            .await;
        Ok(())
    }

    async fn delete(&self, qualifier: &str) -> Result<()> {
        self.entries.invalidate(qualifier).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(id: &str) -> Attributes {
        json!({"id": id, "name": format!("Tenant {}", id)})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let cache = MemoryTenantCache::default();

        assert_eq!(cache.read("tenant:a").await.unwrap(), None);

        cache.write("tenant:a", &bag("a")).await.unwrap();
        assert_eq!(cache.read("tenant:a").await.unwrap(), Some(bag("a")));

        cache.delete("tenant:a").await.unwrap();
        assert_eq!(cache.read("tenant:a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let cache = MemoryTenantCache::default();
        cache.delete("tenant:missing").await.unwrap();
        cache.delete("tenant:missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = MemoryTenantCache::default();
        cache.write("acme.example.com", &bag("1")).await.unwrap();
        cache.write("acme.example.com", &bag("2")).await.unwrap();

        assert_eq!(cache.read("acme.example.com").await.unwrap(), Some(bag("2")));
    }

    #[tokio::test]
    async fn test_concurrent_writes_distinct_keys() {
        let cache = MemoryTenantCache::default();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let key = format!("tenant:{}", i);
                    cache.write(&key, &bag(&i.to_string())).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..16 {
            let key = format!("tenant:{}", i);
            assert_eq!(cache.read(&key).await.unwrap(), Some(bag(&i.to_string())));
        }
    }

    #[tokio::test]
    async fn test_ttl_expiry_is_a_miss() {
        let config = CacheConfig {
            ttl_seconds: Some(1),
            ..CacheConfig::default()
        };
        let cache = MemoryTenantCache::new(&config);
        cache.write("tenant:a", &bag("a")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(cache.read("tenant:a").await.unwrap(), None);
    }
}
