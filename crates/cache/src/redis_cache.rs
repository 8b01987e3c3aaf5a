use crate::error::{CacheError, Result};
use crate::store::TenantCache;
use async_trait::async_trait;
use mtapp_models::Attributes;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::str::FromStr;

/// Where tenant cache entries are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// In-process moka cache, private to this server.
    #[default]
    Memory,
    /// Shared redis instance, visible to every server process.
    Redis,
}

impl FromStr for CacheBackend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown cache backend '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub url: String,
    /// Entry lifetime in seconds; `None` keeps entries until deleted or evicted.
    pub ttl_seconds: Option<u64>,
    /// Upper bound on in-process entries (memory backend only).
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            url: "redis://localhost:6379".to_string(),
            ttl_seconds: None,
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            backend: match std::env::var("CACHE_BACKEND") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.backend,
            },
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            ttl_seconds: std::env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ttl| *ttl > 0),
            max_capacity: std::env::var("CACHE_MAX_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_capacity),
        })
    }
}

#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
}

impl Cache {
    pub async fn new(config: &CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self { manager })
    }

    /// Set a value in the cache with optional TTL (seconds)
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.manager.clone();

        if let Some(ttl) = ttl_seconds {
            conn.set_ex::<_, _, ()>(key, serialized, ttl).await?;
        } else {
            conn.set::<_, _, ()>(key, serialized).await?;
        }

        Ok(())
    }

    /// Get a value from the cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(s) => {
                let deserialized = serde_json::from_str(&s)?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }

    /// Delete a key from the cache
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Ping Redis to check connection
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

/// Tenant cache backed by the shared redis instance.
#[derive(Clone)]
pub struct RedisTenantCache {
    cache: Cache,
    ttl_seconds: Option<u64>,
}

impl RedisTenantCache {
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let cache = Cache::new(config).await?;
        cache.ping().await?;
        tracing::info!("Redis tenant cache connected at {}", config.url);

        Ok(Self::new(cache, config.ttl_seconds))
    }

    pub fn new(cache: Cache, ttl_seconds: Option<u64>) -> Self {
        Self { cache, ttl_seconds }
    }
}

#[async_trait]
impl TenantCache for RedisTenantCache {
    async fn read(&self, qualifier: &str) -> Result<Option<Attributes>> {
        self.cache.get(qualifier).await
    }

    async fn write(&self, qualifier: &str, attributes: &Attributes) -> Result<()> {
        self.cache.set(qualifier, attributes, self.ttl_seconds).await
    }

    async fn delete(&self, qualifier: &str) -> Result<()> {
        self.cache.delete(qualifier).await
    }
}

/// Cache key for a tenant selected by identifier.
pub fn tenant_cache_key(tenant_id: &str) -> String {
    format!("tenant:{}", tenant_id)
}
