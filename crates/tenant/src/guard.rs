use crate::config::RedirectTarget;
use crate::context::{Context, TenantContext};
use crate::environment::Environment;
use crate::error::{Result, TenancyError};
use crate::tenancy::Tenancy;
use async_trait::async_trait;
use std::sync::Arc;

/// The handler group a request is routed to. Decides whether the request
/// runs in the global context when the strategy has no primary host.
#[async_trait]
pub trait RequestTarget: Send + Sync {
    async fn is_global_context(&self, env: &dyn Environment) -> bool;
}

/// Target whose answer does not depend on the request.
#[derive(Debug, Clone, Copy)]
pub struct StaticTarget {
    global: bool,
}

impl StaticTarget {
    pub fn global() -> Self {
        Self { global: true }
    }

    pub fn tenant() -> Self {
        Self { global: false }
    }
}

#[async_trait]
impl RequestTarget for StaticTarget {
    async fn is_global_context(&self, _env: &dyn Environment) -> bool {
        self.global
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(RedirectTarget),
}

/// Pre-request hook for one group of routes. Built through
/// [`Tenancy::guard`].
#[derive(Clone)]
pub struct RequestGuard {
    tenancy: Tenancy,
    target: Option<Arc<dyn RequestTarget>>,
}

impl RequestGuard {
    pub(crate) fn new(tenancy: Tenancy, target: Option<Arc<dyn RequestTarget>>) -> Self {
        Self { tenancy, target }
    }

    /// Fresh context for one request, bound to this guard's target.
    pub fn context(&self, env: Arc<dyn Environment>) -> TenantContext {
        self.tenancy.context(env, self.target.clone())
    }

    /// Redirect when a tenant is required but cannot be resolved. Only
    /// `TenantUndefined` is turned into a redirect; every other error is
    /// returned to the caller.
    pub async fn check(&self, context: &TenantContext) -> Result<GuardDecision> {
        if context.get_context().await? == Context::Global {
            return Ok(GuardDecision::Proceed);
        }

        match context.get_tenant().await {
            Ok(_) => Ok(GuardDecision::Proceed),
            Err(TenancyError::TenantUndefined(reason)) => {
                let redirect = self.tenancy.config().redirect.clone();
                tracing::warn!("No tenant for request ({}), redirecting to {}", reason, redirect);
                Ok(GuardDecision::Redirect(redirect))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TenancyConfig;
    use crate::environment::RequestEnv;
    use mtapp_cache::{CacheError, MemoryTenantCache, TenantCache};
    use mtapp_models::{Attributes, Tenant};
    use serde_json::json;

    /// Cache backend that is unreachable.
    struct DownCache;

    #[async_trait]
    impl TenantCache for DownCache {
        async fn read(&self, _qualifier: &str) -> mtapp_cache::Result<Option<Attributes>> {
            Err(CacheError::InvalidConfig("cache unavailable".to_string()))
        }

        async fn write(&self, _qualifier: &str, _attributes: &Attributes) -> mtapp_cache::Result<()> {
            Err(CacheError::InvalidConfig("cache unavailable".to_string()))
        }

        async fn delete(&self, _qualifier: &str) -> mtapp_cache::Result<()> {
            Err(CacheError::InvalidConfig("cache unavailable".to_string()))
        }
    }

    fn tenancy(config: TenancyConfig) -> Tenancy {
        let config = config.with_redirect(RedirectTarget::new("/tenants/select"));
        Tenancy::new(config, Arc::new(MemoryTenantCache::default())).unwrap()
    }

    fn env(host: &str) -> Arc<dyn Environment> {
        Arc::new(RequestEnv::with_host(host))
    }

    #[test]
    fn test_session_guard_requires_target() {
        let tenancy = tenancy(TenancyConfig::session("Auth.User.Tenant"));

        assert!(matches!(
            tenancy.guard(None),
            Err(TenancyError::MissingCapability(_))
        ));
        assert!(tenancy.guard(Some(Arc::new(StaticTarget::tenant()))).is_ok());
    }

    #[test]
    fn test_domain_guard_without_target() {
        let tenancy = tenancy(TenancyConfig::domain("app.example.com"));
        assert!(tenancy.guard(None).is_ok());
    }

    #[tokio::test]
    async fn test_global_proceeds() {
        let guard = tenancy(TenancyConfig::domain("app.example.com")).guard(None).unwrap();
        let ctx = guard.context(env("app.example.com"));

        assert_eq!(guard.check(&ctx).await.unwrap(), GuardDecision::Proceed);
    }

    #[tokio::test]
    async fn test_missing_tenant_redirects_once() {
        let guard = tenancy(TenancyConfig::domain("app.example.com")).guard(None).unwrap();
        let ctx = guard.context(env("tenantA.example.com"));

        assert_eq!(
            guard.check(&ctx).await.unwrap(),
            GuardDecision::Redirect(RedirectTarget::new("/tenants/select"))
        );
    }

    #[tokio::test]
    async fn test_resolved_tenant_proceeds() {
        let guard = tenancy(TenancyConfig::domain("app.example.com")).guard(None).unwrap();
        let ctx = guard.context(env("tenantA.example.com"));
        ctx.set_tenant(&Tenant::new("a", Attributes::new())).await.unwrap();

        assert_eq!(guard.check(&ctx).await.unwrap(), GuardDecision::Proceed);
    }

    #[tokio::test]
    async fn test_session_global_target_proceeds_without_tenant() {
        let guard = tenancy(TenancyConfig::session("Auth.User.Tenant"))
            .guard(Some(Arc::new(StaticTarget::global())))
            .unwrap();
        let ctx = guard.context(Arc::new(RequestEnv::default()));

        assert_eq!(guard.check(&ctx).await.unwrap(), GuardDecision::Proceed);
    }

    #[tokio::test]
    async fn test_session_tenant_target_redirects_without_tenant() {
        let guard = tenancy(TenancyConfig::session("Auth.User.Tenant"))
            .guard(Some(Arc::new(StaticTarget::tenant())))
            .unwrap();
        let ctx = guard.context(Arc::new(RequestEnv::default()));

        assert!(matches!(
            guard.check(&ctx).await.unwrap(),
            GuardDecision::Redirect(_)
        ));
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let cache = Arc::new(MemoryTenantCache::default());
        cache
            .write("tenantA.example.com", &json!({"name": "No id"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        let tenancy = Tenancy::new(TenancyConfig::domain("app.example.com"), cache).unwrap();
        let guard = tenancy.guard(None).unwrap();
        let ctx = guard.context(env("tenantA.example.com"));

        assert!(matches!(
            guard.check(&ctx).await,
            Err(TenancyError::Hydration(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_failure_is_not_a_redirect() {
        let config = TenancyConfig::domain("app.example.com")
            .with_redirect(RedirectTarget::new("/tenants/select"));
        let tenancy = Tenancy::new(config, Arc::new(DownCache)).unwrap();
        let guard = tenancy.guard(None).unwrap();
        let ctx = guard.context(env("tenantA.example.com"));

        assert!(matches!(guard.check(&ctx).await, Err(TenancyError::Cache(_))));
    }
}
