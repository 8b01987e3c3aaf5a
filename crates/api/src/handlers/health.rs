use axum::{Extension, Json};
use mtapp_tenant::TenantContext;
use serde_json::{json, Value};

use super::{tenancy_error, ApiError};

/// Health check; also reports how the request was classified.
pub async fn health(Extension(context): Extension<TenantContext>) -> Result<Json<Value>, ApiError> {
    let classified = context.get_context().await.map_err(tenancy_error)?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "context": classified,
    })))
}
