//! Shared application state for the serving surfaces

use std::sync::Arc;
use std::time::Instant;

use crate::binance::BinanceClient;
use crate::metrics::ServiceMetrics;
use crate::registry::BookRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BookRegistry>,
    pub venue: Arc<BinanceClient>,
    pub metrics: Arc<ServiceMetrics>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        registry: Arc<BookRegistry>,
        venue: Arc<BinanceClient>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            registry,
            venue,
            metrics,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the supervisor wired the service together.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
