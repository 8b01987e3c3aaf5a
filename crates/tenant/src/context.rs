// Tenant context for request handling

use crate::config::Strategy;
use crate::environment::Environment;
use crate::error::{Result, TenancyError};
use crate::guard::RequestTarget;
use crate::qualifier::{resolve_qualifier, Qualifier};
use crate::tenancy::Tenancy;
use mtapp_models::Tenant;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Classification of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    /// Tenant-agnostic; tenant lookup is not allowed.
    Global,
    /// Tenant-scoped; a tenant is expected.
    Tenant,
    /// Reserved for application-defined contexts. Treated like `Tenant`.
    Custom(String),
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Global => f.write_str("global"),
            Context::Tenant => f.write_str("tenant"),
            Context::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// Per-request tenancy state.
///
/// Clones share the same memo, so handing a clone to handlers of the same
/// request keeps a single resolution. Never share one across requests.
#[derive(Clone)]
pub struct TenantContext {
    tenancy: Tenancy,
    env: Arc<dyn Environment>,
    target: Option<Arc<dyn RequestTarget>>,
    memo: Arc<RwLock<Option<(Qualifier, Tenant)>>>,
}

impl TenantContext {
    pub(crate) fn new(
        tenancy: Tenancy,
        env: Arc<dyn Environment>,
        target: Option<Arc<dyn RequestTarget>>,
    ) -> Self {
        Self {
            tenancy,
            env,
            target,
            memo: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn qualifier(&self) -> Option<Qualifier> {
        resolve_qualifier(self.tenancy.strategy(), self.env.as_ref()).await
    }

    /// A request target that declares itself global wins under every
    /// strategy except `None`; otherwise the strategy decides.
    pub async fn get_context(&self) -> Result<Context> {
        let context = match self.tenancy.strategy() {
            Strategy::None => Context::Global,
            _ if self.target_is_global().await => Context::Global,
            Strategy::Domain { primary_domain } => match self.qualifier().await {
                Some(q) if q.as_str().eq_ignore_ascii_case(primary_domain) => Context::Global,
                _ => Context::Tenant,
            },
            Strategy::Session { .. } => {
                if self.target.is_none() {
                    return Err(TenancyError::MissingCapability(
                        "request target does not implement is_global_context".into(),
                    ));
                }
                Context::Tenant
            }
        };

        tracing::debug!("Request context: {}", context);
        Ok(context)
    }

    async fn target_is_global(&self) -> bool {
        match &self.target {
            Some(target) => target.is_global_context(self.env.as_ref()).await,
            None => false,
        }
    }

    pub async fn is_primary(&self) -> Result<bool> {
        Ok(self.get_context().await? == Context::Global)
    }

    /// Resolve the tenant for this request.
    ///
    /// Only tenants previously stored with [`set_tenant`](Self::set_tenant)
    /// are found; a cache miss is `TenantUndefined`.
    pub async fn get_tenant(&self) -> Result<Tenant> {
        if self.is_primary().await? {
            return Err(TenancyError::InvalidContext);
        }

        let qualifier = self
            .qualifier()
            .await
            .ok_or_else(|| TenancyError::undefined("no tenant qualifier for this request"))?;

        if let Some((memo_qualifier, tenant)) = self.memo.read().await.as_ref() {
            if *memo_qualifier == qualifier {
                return Ok(tenant.clone());
            }
        }

        let attributes = self
            .tenancy
            .cache()
            .read(qualifier.as_str())
            .await?
            .ok_or_else(|| {
                TenancyError::undefined(format!("no cached tenant for qualifier {}", qualifier))
            })?;

        let tenant = self
            .tenancy
            .loader()
            .hydrate(&self.tenancy.config().model, attributes)?;
        tracing::debug!("Resolved tenant {} for qualifier {}", tenant.id, qualifier);

        *self.memo.write().await = Some((qualifier, tenant.clone()));
        Ok(tenant)
    }

    /// Make `tenant` the current tenant for this qualifier. Under the
    /// session strategy the tenant id is stored in the session first, which
    /// is what makes the qualifier resolvable.
    pub async fn set_tenant(&self, tenant: &Tenant) -> Result<()> {
        let session = match self.tenancy.strategy() {
            Strategy::Session { session_key } => {
                let previous = self.env.session_read(session_key).await;
                self.env.session_write(session_key, tenant.id.to_value()).await;
                Some((session_key, previous))
            }
            _ => None,
        };

        let written = match self.qualifier().await {
            Some(qualifier) => self
                .tenancy
                .cache()
                .write(qualifier.as_str(), &tenant.to_attributes())
                .await
                .map(|_| qualifier)
                .map_err(TenancyError::from),
            None => Err(TenancyError::undefined("no tenant qualifier for this request")),
        };

        // Leave the session as it was if the tenant could not be stored.
        let qualifier = match written {
            Ok(qualifier) => qualifier,
            Err(err) => {
                tracing::warn!("Failed to set tenant {}: {}", tenant.id, err);
                match session {
                    Some((key, Some(previous))) => self.env.session_write(key, previous).await,
                    Some((key, None)) => self.env.session_delete(key).await,
                    None => {}
                }
                return Err(err);
            }
        };

        tracing::info!("Tenant {} set for qualifier {}", tenant.id, qualifier);
        *self.memo.write().await = Some((qualifier, tenant.clone()));
        Ok(())
    }

    /// Forget the current tenant. Calling it again is a no-op.
    /// A failed cache delete leaves the session and memo untouched.
    pub async fn unset_tenant(&self) -> Result<()> {
        if let Some(qualifier) = self.qualifier().await {
            self.tenancy.cache().delete(qualifier.as_str()).await?;
            tracing::info!("Tenant unset for qualifier {}", qualifier);
        }

        if let Strategy::Session { session_key } = self.tenancy.strategy() {
            self.env.session_delete(session_key).await;
        }

        self.memo.write().await.take();
        Ok(())
    }
}
