//! # reviewd
//!
//! The entry point that assembles the review service from the adapters
//! selected at compile time. Store handles are constructed here and
//! injected — nothing below this file holds process-wide state.

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use api_adapters::{router, AppState};
use configs::AppConfig;
use services::ReviewService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("loading configuration")?;

    // 1. Storage backend
    #[cfg(feature = "db-postgres")]
    let repo: Arc<dyn domains::ReviewRepo> = {
        let url = config
            .database
            .url
            .as_ref()
            .context("database.url is required when built with db-postgres")?;
        Arc::new(storage_adapters::PostgresReviewRepo::connect(url.expose_secret()).await?)
    };
    #[cfg(not(feature = "db-postgres"))]
    let repo: Arc<dyn domains::ReviewRepo> = {
        tracing::warn!("using the in-memory review store; data will not survive a restart");
        Arc::new(storage_adapters::MemoryReviewRepo::new())
    };

    // 2. Identity backend
    #[cfg(feature = "auth-jwt")]
    let resolver: Arc<dyn domains::IdentityResolver> = Arc::new(
        auth_adapters::JwtResolver::new(config.auth.token_secret.expose_secret().as_bytes()),
    );
    #[cfg(not(feature = "auth-jwt"))]
    let resolver: Arc<dyn domains::IdentityResolver> = Arc::new(
        auth_adapters::SignedTokenResolver::new(config.auth.token_secret.expose_secret()),
    );

    // 3. Service + HTTP surface
    let service = Arc::new(ReviewService::new(repo));
    let state = AppState::new(service, resolver)
        .with_default_page_size(config.pagination.default_page_size)
        .with_max_page_size(config.pagination.max_page_size);
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "reviewd listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
