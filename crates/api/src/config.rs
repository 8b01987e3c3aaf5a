use crate::session::SessionConfig;
use mtapp_cache::CacheConfig;
use mtapp_tenant::TenancyConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub tenancy: TenancyConfig,
    pub cache: CacheConfig,
    pub session: SessionConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            tenancy: TenancyConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            session: SessionConfig::from_env(),
        })
    }
}
