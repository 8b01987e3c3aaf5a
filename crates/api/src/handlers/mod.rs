pub mod health;
pub mod tenant;

use axum::{http::StatusCode, Json};
use mtapp_tenant::TenancyError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a tenancy failure onto an HTTP error.
pub fn tenancy_error(err: TenancyError) -> ApiError {
    let (status, code) = match &err {
        TenancyError::TenantUndefined(_) => (StatusCode::NOT_FOUND, "tenant_undefined"),
        TenancyError::InvalidContext => (StatusCode::INTERNAL_SERVER_ERROR, "invalid_context"),
        TenancyError::MissingCapability(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "missing_capability")
        }
        TenancyError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
        TenancyError::Cache(_) => (StatusCode::SERVICE_UNAVAILABLE, "cache_unavailable"),
        TenancyError::Hydration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "hydration_error"),
    };

    (status, Json(ErrorResponse::new(code, &err.to_string())))
}
