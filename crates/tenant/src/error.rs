use thiserror::Error;

pub type Result<T> = std::result::Result<T, TenancyError>;

#[derive(Debug, Error)]
pub enum TenancyError {
    /// Tenant lookup attempted while the request is in the global context.
    #[error("Tenant cannot be resolved from the global context")]
    InvalidContext,

    #[error("Tenant not defined: {0}")]
    TenantUndefined(String),

    #[error("Missing capability: {0}")]
    MissingCapability(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(#[from] mtapp_cache::CacheError),

    #[error("Hydration error: {0}")]
    Hydration(String),
}

impl TenancyError {
    pub fn undefined(reason: impl Into<String>) -> Self {
        Self::TenantUndefined(reason.into())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::TenantUndefined(_))
    }
}

impl From<::config::ConfigError> for TenancyError {
    fn from(err: ::config::ConfigError) -> Self {
        TenancyError::Config(err.to_string())
    }
}
