use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Request-scoped view of the host and session that qualifiers are
/// derived from.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Host name the request was addressed to, without port.
    fn host_name(&self) -> Option<&str>;

    async fn session_read(&self, key: &str) -> Option<Value>;

    async fn session_write(&self, key: &str, value: Value);

    async fn session_delete(&self, key: &str);
}

/// Key/value state of one session, shared with the session store.
pub type SessionState = Arc<RwLock<HashMap<String, Value>>>;

/// Environment built from an incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestEnv {
    host: Option<String>,
    session: SessionState,
}

impl RequestEnv {
    pub fn new(host: Option<String>, session: SessionState) -> Self {
        Self { host, session }
    }

    /// Request for `host` with a fresh, empty session.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            session: SessionState::default(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }
}

#[async_trait]
impl Environment for RequestEnv {
    fn host_name(&self) -> Option<&str> {
        self.host.as_deref()
    }

    async fn session_read(&self, key: &str) -> Option<Value> {
        self.session.read().await.get(key).cloned()
    }

    async fn session_write(&self, key: &str, value: Value) {
        self.session.write().await.insert(key.to_string(), value);
    }

    async fn session_delete(&self, key: &str) {
        self.session.write().await.remove(key);
    }
}
