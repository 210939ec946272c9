/// Tabiroku - personal travel-media sharing server
///
/// Serves a travel itinerary dataset with per-user landing pages, accepts
/// photo and video uploads grouped by prefecture, and keeps low-quality
/// preview artifacts fresh with a background compression job.

mod api;
mod config;
mod context;
mod error;
mod jobs;
mod media;
mod notifier;
mod server;
mod session;
mod store;
mod users;

use config::ServerConfig;
use context::AppContext;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabiroku=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;
    let ctx = Arc::new(ctx);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}
