//! Postline - blog data service

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postline::{
    api::{self, AppState},
    config::Config,
    db::{verify_schema, DynDataService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postline=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Postline...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let service = connect(&config)?;

    // Schema drift is reported, not fatal
    let report = verify_schema(service.as_ref()).await;
    if report.is_compatible() {
        tracing::info!("Remote schema check passed");
    } else {
        for table in report.incompatible() {
            tracing::warn!("Remote schema mismatch: {}", table);
        }
    }

    let state = AppState::new(service, config.display.clock());

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "demo"))]
fn connect(config: &Config) -> Result<DynDataService> {
    config.validate()?;
    let service = postline::db::RestDataService::boxed(&config.service)?;
    tracing::info!("Data service: {}", config.service.url);
    Ok(service)
}

#[cfg(feature = "demo")]
fn connect(_config: &Config) -> Result<DynDataService> {
    tracing::info!("Demo mode: serving a seeded in-memory blog");
    Ok(std::sync::Arc::new(postline::db::MemoryDataService::demo()))
}
