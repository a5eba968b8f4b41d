use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use market_mirror::binance::BinanceClient;
use market_mirror::config::Config;
use market_mirror::metrics::ServiceMetrics;
use market_mirror::registry::BookRegistry;
use market_mirror::router::create_router;
use market_mirror::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!(
        pairs = ?config.trading_pairs,
        port = config.port,
        "starting market-mirror service"
    );

    let metrics = Arc::new(ServiceMetrics::new());
    let registry = Arc::new(BookRegistry::new(
        config.resync_gap_threshold,
        config.subscriber_queue_capacity,
        Arc::clone(&metrics),
    ));
    let venue = Arc::new(BinanceClient::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&metrics),
    ));

    // Books exist before the first frame arrives, so the query surface never
    // 404s a configured symbol.
    venue.initialize_books().await;

    let feed = {
        let venue = Arc::clone(&venue);
        tokio::spawn(async move { venue.run().await })
    };

    let state = AppState::new(Arc::clone(&registry), venue, metrics);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    // Shutdown order: stop accepting connections, close the upstream feed
    // (cancelling any pending reconnect timer), then drop the subscriber
    // queues so every relay loop ends and the server can drain.
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            feed.abort();
            registry.shutdown();
        })
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => tracing::error!(error = %err, "failed to listen for shutdown signal"),
    }
}
