// MTApp API Server
// Reference host for tenant resolution: sessions, tenant guard, demo routes

mod config;
mod handlers;
mod middleware;
mod routes;
mod session;

use config::Config;
use dotenvy::dotenv;
use session::SessionStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "info,mtapp_api=debug,mtapp_tenant=debug,tower_http=debug".to_string()
            }),
        )
        .init();

    tracing::info!("🚀 Starting MTApp API Server");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("🔌 Server: {}:{}", config.server_host, config.server_port);

    // Initialize tenant cache
    tracing::info!("⚡ Connecting tenant cache ({:?})...", config.cache.backend);
    let cache = mtapp_cache::connect(&config.cache).await?;
    tracing::info!("✅ Tenant cache ready");

    let tenancy = mtapp_tenant::Tenancy::new(config.tenancy.clone(), cache)?;
    let sessions = Arc::new(SessionStore::new(&config.session));
    tracing::info!("🍪 Sessions expire after {}s idle", config.session.max_age_seconds);

    let app = routes::build_router(&tenancy, sessions)?;

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🎉 Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
