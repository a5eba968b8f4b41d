//! Venue feed client
//!
//! Maintains the upstream WebSocket to the venue's futures stream: connect,
//! subscribe to the per-symbol depth-diff streams, dispatch frames into the
//! registry, and reconnect with exponential backoff. An application-level
//! ping plus a read-idle watchdog guard against silent half-open sockets.
//!
//! Bootstrap comes in two flavors (see [`BootstrapMode`]): adopt the first
//! live diff, or align each book against a REST snapshot first.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use dashmap::DashMap;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::{sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use types::Symbol;

use crate::config::{BootstrapMode, Config};
use crate::events::{DepthSnapshot, DepthUpdate, SubscribeCommand, VenueMessage};
use crate::metrics::ServiceMetrics;
use crate::registry::BookRegistry;
use crate::validation;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Upstream client for the venue's depth-diff feed.
pub struct BinanceClient {
    config: Config,
    registry: Arc<BookRegistry>,
    metrics: Arc<ServiceMetrics>,
    http: reqwest::Client,
    connected: AtomicBool,
    reconnect_attempts: AtomicU32,
    next_command_id: AtomicU64,
    /// Command id → stream name, awaiting acknowledgement.
    pending_subscriptions: DashMap<u64, String>,
    /// Per-symbol diff buffers used by snapshot bootstrap.
    buffered: DashMap<Symbol, Vec<DepthUpdate>>,
}

impl BinanceClient {
    pub fn new(
        config: Config,
        registry: Arc<BookRegistry>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            config,
            registry,
            metrics,
            http: reqwest::Client::new(),
            connected: AtomicBool::new(false),
            reconnect_attempts: AtomicU32::new(0),
            next_command_id: AtomicU64::new(0),
            pending_subscriptions: DashMap::new(),
            buffered: DashMap::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Summary for `/health` and `/api/stats`.
    pub fn stats(&self) -> ClientStats {
        ClientStats {
            connected: self.is_connected(),
            reconnect_attempts: self.reconnect_attempts(),
            ws_url: self.config.ws_url.clone(),
            bootstrap_mode: match self.config.bootstrap_mode {
                BootstrapMode::Stream => "stream",
                BootstrapMode::Snapshot => "snapshot",
            },
        }
    }

    /// Create an empty book for every configured symbol, paced so later
    /// snapshot fetches do not land on the venue at the same instant.
    pub async fn initialize_books(&self) {
        for symbol in &self.config.trading_pairs {
            self.registry.ensure_book(symbol);
            info!(symbol = %symbol, "order book initialized");
            sleep(self.config.book_init_pacing).await;
        }
    }

    /// Drive the upstream connection until the reconnect cap is exhausted.
    pub async fn run(&self) {
        loop {
            match self.stream_once().await {
                Ok(()) => info!("venue stream closed"),
                Err(err) => warn!(error = %err, "venue stream failed"),
            }
            self.connected.store(false, Ordering::Relaxed);

            let attempt = self.reconnect_attempts.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt > self.config.max_reconnect_attempts {
                error!(
                    attempts = attempt - 1,
                    "reconnect attempts exhausted; staying disconnected"
                );
                return;
            }
            self.metrics.record_reconnect();

            let delay = self.config.reconnect_base_delay * 2u32.saturating_pow(attempt - 1);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "reconnecting to venue"
            );
            sleep(delay).await;
        }
    }

    /// One connection lifetime: open, subscribe, stream until close/error.
    async fn stream_once(&self) -> anyhow::Result<()> {
        info!(url = %self.config.ws_url, "connecting to venue stream");
        let (ws_stream, _) = connect_async(self.config.ws_url.as_str())
            .await
            .context("venue connect failed")?;
        let (mut write, mut read) = ws_stream.split();

        self.connected.store(true, Ordering::Relaxed);
        self.reconnect_attempts.store(0, Ordering::Relaxed);
        info!("venue stream open");

        // Give the venue a moment to accept the connection before sending
        // control messages.
        sleep(self.config.subscribe_delay).await;
        self.subscribe_all(&mut write).await?;

        let mut ping = tokio::time::interval(self.config.upstream_ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut idle = tokio::time::interval(Duration::from_secs(5));
        idle.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_rx = Instant::now();

        loop {
            tokio::select! {
                msg = read.next() => {
                    let Some(msg) = msg else {
                        return Ok(());
                    };
                    let msg = msg.context("venue read failed")?;
                    last_rx = Instant::now();
                    match msg {
                        Message::Text(text) => self.dispatch_frame(&text).await,
                        Message::Binary(bytes) => match String::from_utf8(bytes) {
                            Ok(text) => self.dispatch_frame(&text).await,
                            Err(_) => {
                                self.metrics.record_invalid_frame();
                                warn!("non-utf8 binary frame from venue");
                            }
                        },
                        Message::Ping(payload) => {
                            write.send(Message::Pong(payload)).await?;
                        }
                        Message::Pong(_) => {}
                        Message::Close(_) => {
                            info!("venue sent close frame");
                            return Ok(());
                        }
                        Message::Frame(_) => {}
                    }
                }
                _ = ping.tick() => {
                    write
                        .send(Message::Ping(Vec::new()))
                        .await
                        .context("venue ping failed")?;
                }
                _ = idle.tick() => {
                    if last_rx.elapsed() > self.config.read_idle_timeout {
                        bail!(
                            "venue stream idle for {}s; forcing reconnect",
                            last_rx.elapsed().as_secs()
                        );
                    }
                }
            }
        }
    }

    async fn subscribe_all(&self, write: &mut WsSink) -> anyhow::Result<()> {
        for symbol in &self.config.trading_pairs {
            let id = self.next_command_id.fetch_add(1, Ordering::Relaxed) + 1;
            let command = SubscribeCommand::depth(symbol, id);
            let payload = serde_json::to_string(&command)?;
            self.pending_subscriptions
                .insert(id, command.params[0].clone());
            write
                .send(Message::Text(payload))
                .await
                .context("subscribe send failed")?;
            info!(symbol = %symbol, id, "depth stream subscription sent");
        }
        Ok(())
    }

    async fn dispatch_frame(&self, text: &str) {
        match serde_json::from_str::<VenueMessage>(text) {
            Ok(VenueMessage::Depth(diff)) => self.handle_diff(diff).await,
            Ok(VenueMessage::Error(envelope)) => warn!(
                code = envelope.error.code,
                msg = %envelope.error.msg,
                "venue error message"
            ),
            Ok(VenueMessage::Ack(ack)) => match self.pending_subscriptions.remove(&ack.id) {
                Some((_, stream)) if ack.result.is_none() => {
                    info!(id = ack.id, stream = %stream, "subscription confirmed");
                }
                Some((_, stream)) => {
                    warn!(id = ack.id, stream = %stream, result = ?ack.result, "unexpected subscription result");
                }
                None => debug!(id = ack.id, "acknowledgement for unknown command id"),
            },
            Err(_) => {
                // A multiplexed stream carries event kinds this mirror does
                // not consume; only untagged garbage counts as malformed.
                match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(value) if value.get("e").is_some() => {
                        debug!(event = ?value.get("e"), "ignoring unhandled event kind");
                    }
                    _ => {
                        self.metrics.record_invalid_frame();
                        warn!("malformed frame from venue");
                    }
                }
            }
        }
    }

    async fn handle_diff(&self, diff: DepthUpdate) {
        if !validation::is_valid_diff_update(&diff) {
            self.metrics.record_invalid_frame();
            warn!(symbol = %diff.symbol, "discarding invalid depth diff");
            return;
        }

        let symbol = diff.symbol_key();
        match self.config.bootstrap_mode {
            BootstrapMode::Stream => {
                self.registry.apply_diff(&diff);
            }
            BootstrapMode::Snapshot => {
                let initialized = self
                    .registry
                    .with_book(&symbol, |book| book.last_update_id() > 0)
                    .unwrap_or(false);
                if initialized {
                    self.registry.apply_diff(&diff);
                    return;
                }

                let fetch_now = {
                    let mut buffer = self.buffered.entry(symbol.clone()).or_default();
                    buffer.push(diff);
                    buffer.len() == 1
                };
                if fetch_now {
                    self.bootstrap_from_snapshot(&symbol).await;
                }
            }
        }
    }

    /// Align an uninitialized book: fetch the REST snapshot, load it, then
    /// drain the buffered diffs through the normal sequence check (which
    /// discards anything the snapshot already covers).
    async fn bootstrap_from_snapshot(&self, symbol: &Symbol) {
        match self.get_snapshot(symbol).await {
            Ok(snapshot) => {
                if !self.registry.apply_snapshot(symbol, &snapshot) {
                    self.buffered.remove(symbol);
                    return;
                }
                let buffered = self
                    .buffered
                    .remove(symbol)
                    .map(|(_, diffs)| diffs)
                    .unwrap_or_default();
                let applied = buffered
                    .iter()
                    .filter(|diff| self.registry.apply_diff(diff))
                    .count();
                info!(
                    symbol = %symbol,
                    last_update_id = snapshot.last_update_id,
                    buffered = buffered.len(),
                    applied,
                    "book aligned from snapshot"
                );
            }
            Err(err) => {
                // Book stays uninitialized; the next diff restarts buffering.
                warn!(symbol = %symbol, error = %err, "snapshot fetch failed");
                self.buffered.remove(symbol);
            }
        }
    }

    /// Fetch a full-depth snapshot from the venue's REST endpoint.
    pub async fn get_snapshot(&self, symbol: &Symbol) -> anyhow::Result<DepthSnapshot> {
        let url = format!(
            "{}/fapi/v1/depth?symbol={}&limit={}",
            self.config.rest_url,
            symbol.to_uppercase(),
            self.config.depth_limit
        );
        debug!(url = %url, "fetching depth snapshot");

        let snapshot = self
            .http
            .get(&url)
            .send()
            .await
            .context("snapshot request failed")?
            .error_for_status()
            .context("snapshot request rejected")?
            .json::<DepthSnapshot>()
            .await
            .context("snapshot decode failed")?;
        Ok(snapshot)
    }
}

/// Feed-client summary for `/health` and `/api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub connected: bool,
    pub reconnect_attempts: u32,
    pub ws_url: String,
    pub bootstrap_mode: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BinanceClient {
        let config = Config::from_env().unwrap();
        let metrics = Arc::new(ServiceMetrics::new());
        let registry = Arc::new(BookRegistry::new(
            config.resync_gap_threshold,
            config.subscriber_queue_capacity,
            Arc::clone(&metrics),
        ));
        BinanceClient::new(config, registry, metrics)
    }

    #[test]
    fn test_initial_state_disconnected() {
        let client = client();
        assert!(!client.is_connected());
        assert_eq!(client.reconnect_attempts(), 0);

        let stats = client.stats();
        assert!(!stats.connected);
        assert_eq!(stats.bootstrap_mode, "stream");
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_books_creates_all_symbols() {
        let client = client();
        client.initialize_books().await;

        for symbol in &client.config.trading_pairs {
            assert!(client
                .registry
                .with_book(symbol, |book| book.last_update_id())
                .is_some());
        }
        assert_eq!(
            client.registry.book_count(),
            client.config.trading_pairs.len()
        );
    }
}
