use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use thingspeak_feed_cache::{
    api,
    config::Config,
    feed_cache::FeedCache,
    poller::PollerService,
    shutdown,
    thingspeak::ThingSpeakClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent; env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load config
    let config = Config::from_env()?;

    // Process-wide snapshot cache: empty until the first successful poll
    let cache = FeedCache::new();

    let client = ThingSpeakClient::new(
        &config.thingspeak_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let (trigger, shutdown) = shutdown::channel();

    // Spawn feed-polling task
    let poller = {
        let service = PollerService::new(client, cache.clone(), config.poll_config());
        tokio::spawn(service.run(shutdown.clone()))
    };

    // Translate Ctrl+C / SIGTERM into the shared shutdown signal
    tokio::spawn(async move {
        shutdown::os_signal().await;
        trigger.trigger();
    });

    // Start HTTP server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, static_dir = ?config.static_dir, "HTTP server listening");

    axum::serve(listener, api::router(cache, config.static_dir.as_deref()))
        .with_graceful_shutdown(shutdown.wait_owned())
        .await?;

    if let Err(e) = poller.await {
        error!(error = %e, "Feed polling task panicked");
    }

    info!("Shutdown complete");
    Ok(())
}
