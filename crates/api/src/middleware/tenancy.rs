use crate::handlers::tenancy_error;
use crate::session::SessionStore;
use axum::{
    extract::{Request, State},
    http::{
        header::{HOST, LOCATION, SET_COOKIE},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use mtapp_tenant::{GuardDecision, RequestEnv, RequestGuard};
use std::sync::Arc;

/// Middleware state for one group of routes.
#[derive(Clone)]
pub struct TenancyState {
    pub guard: RequestGuard,
    pub sessions: Arc<SessionStore>,
}

/// Host the request was addressed to, without port.
pub fn request_host(request: &Request) -> Option<String> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host())?;

    let host = if host.starts_with('[') {
        host.split_inclusive(']').next().unwrap_or(host)
    } else {
        host.split(':').next().unwrap_or(host)
    };

    Some(host.to_string()).filter(|h| !h.is_empty())
}

/// Resolve the tenant context for the request, redirect when a tenant is
/// required but missing, and hand the context to handlers through request
/// extensions.
pub async fn tenancy_guard(
    State(state): State<TenancyState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract session ID from cookie (sync) before any async work
    let session_id = state.sessions.extract_session_id(request.headers());
    let session = state.sessions.load(session_id).await;
    let env = RequestEnv::new(request_host(&request), session.state.clone());
    let context = state.guard.context(Arc::new(env));

    match state.guard.check(&context).await {
        Ok(GuardDecision::Proceed) => {}
        Ok(GuardDecision::Redirect(target)) => {
            return (StatusCode::FOUND, [(LOCATION, target.as_str().to_string())]).into_response();
        }
        Err(err) => {
            tracing::error!("Tenant guard failed: {}", err);
            return tenancy_error(err).into_response();
        }
    }

    request.extensions_mut().insert(context);
    let mut response = next.run(request).await;

    if let Some(cookie) = state.sessions.commit(&session).await {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Invalid session cookie header: {}", e),
        }
    }

    response
}
