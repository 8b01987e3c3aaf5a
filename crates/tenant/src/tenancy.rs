use crate::config::{Strategy, TenancyConfig};
use crate::context::TenantContext;
use crate::environment::Environment;
use crate::error::{Result, TenancyError};
use crate::guard::{RequestGuard, RequestTarget};
use crate::loader::{AttributeLoader, EntityLoader};
use mtapp_cache::TenantCache;
use std::sync::Arc;

/// Process-wide tenancy service: configuration plus the shared tenant
/// cache and entity loader. Holds no per-request state; every request gets
/// its own [`TenantContext`].
#[derive(Clone)]
pub struct Tenancy {
    inner: Arc<TenancyInner>,
}

struct TenancyInner {
    config: TenancyConfig,
    cache: Arc<dyn TenantCache>,
    loader: Arc<dyn EntityLoader>,
}

impl Tenancy {
    pub fn new(config: TenancyConfig, cache: Arc<dyn TenantCache>) -> Result<Self> {
        Self::with_loader(config, cache, Arc::new(AttributeLoader))
    }

    pub fn with_loader(
        config: TenancyConfig,
        cache: Arc<dyn TenantCache>,
        loader: Arc<dyn EntityLoader>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Tenancy configured: strategy={} model={} redirect={}",
            config.strategy.name(),
            config.model,
            config.redirect
        );

        Ok(Self {
            inner: Arc::new(TenancyInner {
                config,
                cache,
                loader,
            }),
        })
    }

    pub fn config(&self) -> &TenancyConfig {
        &self.inner.config
    }

    pub fn strategy(&self) -> &Strategy {
        &self.inner.config.strategy
    }

    pub(crate) fn cache(&self) -> &dyn TenantCache {
        self.inner.cache.as_ref()
    }

    pub(crate) fn loader(&self) -> &dyn EntityLoader {
        self.inner.loader.as_ref()
    }

    /// Context for one request. `target` answers whether the request is
    /// global under strategies that have no primary host.
    pub fn context(
        &self,
        env: Arc<dyn Environment>,
        target: Option<Arc<dyn RequestTarget>>,
    ) -> TenantContext {
        TenantContext::new(self.clone(), env, target)
    }

    /// Build the request guard for one group of routes. Fails with
    /// `MissingCapability` when the strategy needs a request target and
    /// none is given.
    pub fn guard(&self, target: Option<Arc<dyn RequestTarget>>) -> Result<RequestGuard> {
        if matches!(self.strategy(), Strategy::Session { .. }) && target.is_none() {
            return Err(TenancyError::MissingCapability(
                "the session strategy requires a request target implementing is_global_context"
                    .into(),
            ));
        }

        Ok(RequestGuard::new(self.clone(), target))
    }
}
