use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use moka::future::Cache;
use mtapp_tenant::SessionState;
use std::time::Duration;

/// Session cookie and lifetime settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Idle lifetime of a session, also sent as the cookie's Max-Age.
    pub max_age_seconds: u64,
    pub max_capacity: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "mtapp_session".to_string(),
            max_age_seconds: 86400,
            max_capacity: 100_000,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            max_age_seconds: std::env::var("SESSION_MAX_AGE_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.max_age_seconds),
            max_capacity: std::env::var("SESSION_MAX_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_capacity),
        }
    }
}

/// Session attached to one request.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub id: String,
    pub state: SessionState,
    pub is_new: bool,
}

/// Server-side session store. The cookie only carries the session id;
/// the key/value state stays in memory and is dropped after
/// `max_age_seconds` without a request.
pub struct SessionStore {
    sessions: Cache<String, SessionState>,
    cookie_name: String,
    max_age_seconds: u64,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_idle(Duration::from_secs(config.max_age_seconds))
            .build();

        Self {
            sessions,
            cookie_name: config.cookie_name.clone(),
            max_age_seconds: config.max_age_seconds,
        }
    }

    /// Extract the session ID from request cookies.
    pub fn extract_session_id(&self, headers: &HeaderMap) -> Option<String> {
        let cookie_header = headers.get(COOKIE)?.to_str().ok()?;
        let prefix = format!("{}=", self.cookie_name);
        cookie_header
            .split(';')
            .map(|s| s.trim())
            .find(|s| s.starts_with(&prefix))?
            .strip_prefix(&prefix)
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
    }

    /// Look up the session by id, or start a new one. New sessions are
    /// not stored until [`commit`](Self::commit) finds them non-empty.
    pub async fn load(&self, session_id: Option<String>) -> LoadedSession {
        if let Some(id) = session_id {
            if let Some(state) = self.sessions.get(&id).await {
                return LoadedSession {
                    id,
                    state,
                    is_new: false,
                };
            }
            tracing::debug!("Unknown session {}, starting a new one", id);
        }

        LoadedSession {
            id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::default(),
            is_new: true,
        }
    }

    /// Persist or drop the session after the request ran. Returns the
    /// Set-Cookie value to send, if any. A live session gets its cookie
    /// re-issued so the browser's Max-Age follows the server's idle timeout.
    pub async fn commit(&self, session: &LoadedSession) -> Option<String> {
        let empty = session.state.read().await.is_empty();

        match (session.is_new, empty) {
            (true, true) => None,
            (true, false) => {
                tracing::debug!("Created session {}", session.id);
                self.sessions
                    .insert(session.id.clone(), session.state.clone())
                    .await;
                Some(self.session_cookie(&session.id))
            }
            (false, false) => Some(self.session_cookie(&session.id)),
            (false, true) => {
                tracing::debug!("Destroyed empty session {}", session.id);
                self.sessions.invalidate(&session.id).await;
                Some(self.clear_cookie())
            }
        }
    }

    fn session_cookie(&self, session_id: &str) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.cookie_name, session_id, self.max_age_seconds
        )
    }

    /// Return a Set-Cookie header value that clears the session cookie.
    fn clear_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            self.cookie_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig::default())
    }

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_extract_session_id() {
        let store = store();

        assert_eq!(
            store.extract_session_id(&headers("theme=dark; mtapp_session=abc")),
            Some("abc".to_string())
        );
        assert_eq!(store.extract_session_id(&headers("mtapp_session=")), None);
        assert_eq!(store.extract_session_id(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_empty_new_session_is_not_stored() {
        let store = store();
        let session = store.load(None).await;

        assert!(session.is_new);
        assert_eq!(store.commit(&session).await, None);
        store.sessions.run_pending_tasks().await;
        assert_eq!(store.sessions.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = store();

        let session = store.load(None).await;
        session.state.write().await.insert("Auth.User.Tenant".into(), json!("acme"));
        let cookie = store.commit(&session).await.unwrap();
        assert!(cookie.starts_with(&format!("mtapp_session={}", session.id)));
        assert!(cookie.contains("Max-Age=86400"));

        let cookie_header = format!("mtapp_session={}", session.id);
        let loaded = store.load(store.extract_session_id(&headers(&cookie_header))).await;
        assert!(!loaded.is_new);
        assert_eq!(
            loaded.state.read().await.get("Auth.User.Tenant"),
            Some(&json!("acme"))
        );
        assert_eq!(store.commit(&loaded).await, Some(cookie));

        loaded.state.write().await.clear();
        let cleared = store.commit(&loaded).await.unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(store.load(store.extract_session_id(&headers(&cookie_header))).await.is_new);
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let store = SessionStore::new(&SessionConfig {
            max_age_seconds: 1,
            ..SessionConfig::default()
        });

        let session = store.load(None).await;
        session.state.write().await.insert("Auth.User.Tenant".into(), json!("acme"));
        assert!(store.commit(&session).await.unwrap().contains("Max-Age=1"));
        assert!(!store.load(Some(session.id.clone())).await.is_new);

        tokio::time::sleep(Duration::from_millis(1200)).await;

        let expired = store.load(Some(session.id.clone())).await;
        assert!(expired.is_new);
        assert_ne!(expired.id, session.id);
    }
}
