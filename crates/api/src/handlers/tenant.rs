use axum::{http::StatusCode, Extension, Json};
use mtapp_models::{Attributes, Tenant};
use mtapp_tenant::TenantContext;
use serde::Serialize;
use serde_json::{json, Value};

use super::{tenancy_error, ApiError, ErrorResponse};

#[derive(Debug, Serialize)]
pub struct CurrentTenantResponse {
    pub qualifier: Option<String>,
    pub tenant: Tenant,
}

/// GET /tenants/select
pub async fn select_page(Extension(context): Extension<TenantContext>) -> Result<Json<Value>, ApiError> {
    let current = context.qualifier().await.map(|q| q.to_string());

    Ok(Json(json!({
        "message": "Select a tenant by posting its attributes (including id) to /tenants/select",
        "qualifier": current,
    })))
}

/// POST /tenants/select
pub async fn select_tenant(
    Extension(context): Extension<TenantContext>,
    Json(attributes): Json<Attributes>,
) -> Result<Json<Tenant>, ApiError> {
    let tenant = Tenant::from_attributes(attributes).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "invalid_tenant",
                "Tenant attributes must include a string or numeric id",
            )),
        )
    })?;

    context.set_tenant(&tenant).await.map_err(tenancy_error)?;
    Ok(Json(tenant))
}

/// GET /tenant
pub async fn current_tenant(
    Extension(context): Extension<TenantContext>,
) -> Result<Json<CurrentTenantResponse>, ApiError> {
    let tenant = context.get_tenant().await.map_err(tenancy_error)?;
    let qualifier = context.qualifier().await.map(|q| q.to_string());

    Ok(Json(CurrentTenantResponse { qualifier, tenant }))
}

/// DELETE /tenant
pub async fn clear_tenant(Extension(context): Extension<TenantContext>) -> Result<StatusCode, ApiError> {
    context.unset_tenant().await.map_err(tenancy_error)?;
    Ok(StatusCode::NO_CONTENT)
}
