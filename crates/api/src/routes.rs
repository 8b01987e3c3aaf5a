use crate::handlers::{health, tenant};
use crate::middleware::{tenancy_guard, TenancyState};
use crate::session::SessionStore;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use mtapp_tenant::{StaticTarget, Tenancy};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the router. Global routes (health, tenant selection) and tenant
/// routes get separate guards so each group answers `is_global_context`
/// for itself.
pub fn build_router(tenancy: &Tenancy, sessions: Arc<SessionStore>) -> mtapp_tenant::Result<Router> {
    let global = TenancyState {
        guard: tenancy.guard(Some(Arc::new(StaticTarget::global())))?,
        sessions: sessions.clone(),
    };
    let tenant = TenancyState {
        guard: tenancy.guard(Some(Arc::new(StaticTarget::tenant())))?,
        sessions,
    };

    let global_routes = Router::new()
        .route("/health", get(health::health))
        .route(
            "/tenants/select",
            get(tenant::select_page).post(tenant::select_tenant),
        )
        .route_layer(from_fn_with_state(global, tenancy_guard));

    let tenant_routes = Router::new()
        .route(
            "/tenant",
            get(tenant::current_tenant).delete(tenant::clear_tenant),
        )
        .route_layer(from_fn_with_state(tenant, tenancy_guard));

    Ok(Router::new()
        .merge(global_routes)
        .merge(tenant_routes)
        .layer(TraceLayer::new_for_http()))
}
