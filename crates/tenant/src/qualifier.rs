// Qualifier resolution
// Derives the tenant cache key from the request host or the session

use crate::config::Strategy;
use crate::environment::Environment;
use mtapp_cache::tenant_cache_key;
use mtapp_models::TenantId;
use std::fmt;

/// Opaque key naming the tenant a request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Qualifier(String);

impl Qualifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Session qualifiers are namespaced so they never collide with other
    /// cache entries.
    pub fn for_tenant(id: &TenantId) -> Self {
        Self(tenant_cache_key(id.as_str()))
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the qualifier for the current request. Reads the environment
/// only; never writes.
pub async fn resolve_qualifier(strategy: &Strategy, env: &dyn Environment) -> Option<Qualifier> {
    match strategy {
        Strategy::Domain { .. } => env
            .host_name()
            .filter(|host| !host.is_empty())
            .map(|host| Qualifier(host.to_string())),
        Strategy::Session { session_key } => {
            let value = env.session_read(session_key).await?;
            let id = TenantId::from_value(&value);
            if id.is_none() {
                tracing::debug!("Session key {} holds no usable tenant id", session_key);
            }
            id.map(|id| Qualifier::for_tenant(&id))
        }
        Strategy::None => None,
    }
}
