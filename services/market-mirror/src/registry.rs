//! Book registry
//!
//! Owns every per-symbol book and the set of push-surface subscribers.
//! `apply_diff` is the ingestion critical path: it enforces the
//! sequence-continuity state machine, mutates the book, and fans the
//! post-apply snapshot out to subscribers. Fan-out uses `try_send` into each
//! subscriber's bounded queue; a full or closed queue removes the
//! subscriber, so the ingestion task never waits on a slow reader.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use types::{now_millis, Symbol};

use crate::events::{DepthSnapshot, DepthUpdate, PushFrame};
use crate::metrics::ServiceMetrics;
use crate::order_book::{BookSnapshot, OrderBook};
use crate::validation;

pub type SubscriberId = u64;

/// Registry of mirrored books and streaming subscribers.
pub struct BookRegistry {
    books: DashMap<Symbol, OrderBook>,
    subscribers: DashMap<SubscriberId, mpsc::Sender<PushFrame>>,
    next_subscriber_id: AtomicU64,
    subscriber_queue_capacity: usize,
    resync_gap_threshold: u64,
    metrics: Arc<ServiceMetrics>,
}

impl BookRegistry {
    pub fn new(
        resync_gap_threshold: u64,
        subscriber_queue_capacity: usize,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            books: DashMap::new(),
            subscribers: DashMap::new(),
            next_subscriber_id: AtomicU64::new(0),
            subscriber_queue_capacity,
            resync_gap_threshold,
            metrics,
        }
    }

    /// Create an empty book for `symbol` if none exists yet.
    pub fn ensure_book(&self, symbol: &Symbol) {
        self.books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol.clone()));
    }

    /// Number of mirrored books.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// All mirrored symbols, sorted.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.books.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    /// Run a read-only projection against one book.
    ///
    /// The closure runs under the book's shard lock and must stay brief.
    pub fn with_book<R>(&self, symbol: &Symbol, f: impl FnOnce(&OrderBook) -> R) -> Option<R> {
        self.books.get(symbol).map(|book| f(book.value()))
    }

    /// Snapshot one book, optionally truncated per side.
    pub fn snapshot(&self, symbol: &Symbol, limit: Option<usize>) -> Option<BookSnapshot> {
        self.with_book(symbol, |book| book.snapshot(limit))
    }

    /// Snapshot every book, keyed by symbol.
    pub fn all_snapshots(&self, limit: Option<usize>) -> BTreeMap<Symbol, BookSnapshot> {
        self.books
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot(limit)))
            .collect()
    }

    /// Apply a validated depth diff to its book.
    ///
    /// Three acceptance branches keyed by the book's `last_update_id`:
    /// an uninitialized book adopts the diff unconditionally (live-stream
    /// bootstrap); a gap beyond the resync threshold is adopted with a
    /// warning to keep the mirror live after a long disconnect; anything
    /// else must satisfy the continuity rule or the diff is dropped without
    /// mutating the book.
    ///
    /// A successful apply broadcasts the post-apply snapshot exactly once.
    pub fn apply_diff(&self, diff: &DepthUpdate) -> bool {
        if !validation::is_valid_diff_update(diff) {
            self.metrics.record_invalid_frame();
            warn!(symbol = %diff.symbol, "discarding malformed depth diff");
            return false;
        }

        let symbol = diff.symbol_key();
        let snapshot = {
            let mut book = self
                .books
                .entry(symbol.clone())
                .or_insert_with(|| OrderBook::new(symbol.clone()));
            let current = book.last_update_id();

            if current == 0 {
                debug!(
                    symbol = %symbol,
                    final_update_id = diff.final_update_id,
                    "bootstrapping book from live stream"
                );
            } else if diff.first_update_id > current
                && diff.first_update_id - current > self.resync_gap_threshold
            {
                warn!(
                    symbol = %symbol,
                    last_update_id = current,
                    first_update_id = diff.first_update_id,
                    "large sequence gap; adopting venue id"
                );
                self.metrics.record_resync();
            } else if !validation::sequence_ok(
                current,
                diff.first_update_id,
                diff.final_update_id,
            ) {
                warn!(
                    symbol = %symbol,
                    last_update_id = current,
                    first_update_id = diff.first_update_id,
                    final_update_id = diff.final_update_id,
                    "out-of-sequence diff dropped"
                );
                self.metrics.record_diff_dropped();
                return false;
            }

            for level in &diff.bids {
                if let Some((price, quantity)) = validation::sanitize_price_level(level) {
                    book.add_bid(price, quantity, 1);
                }
            }
            for level in &diff.asks {
                if let Some((price, quantity)) = validation::sanitize_price_level(level) {
                    book.add_ask(price, quantity, 1);
                }
            }
            book.update_last_update_id(diff.final_update_id);
            book.snapshot(None)
        };

        self.metrics.record_diff_applied();
        self.broadcast(PushFrame::OrderbookUpdate {
            symbol,
            data: snapshot,
            timestamp: now_millis(),
        });
        true
    }

    /// Load a full snapshot into a book, replacing its contents.
    ///
    /// Broadcasts nothing: push updates are diff-driven.
    pub fn apply_snapshot(&self, symbol: &Symbol, snapshot: &DepthSnapshot) -> bool {
        if !validation::is_valid_snapshot(snapshot) {
            self.metrics.record_invalid_frame();
            warn!(symbol = %symbol, "discarding malformed depth snapshot");
            return false;
        }

        let mut book = self
            .books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol.clone()));
        book.clear();
        for level in &snapshot.bids {
            if let Some((price, quantity)) = validation::sanitize_price_level(level) {
                book.add_bid(price, quantity, 1);
            }
        }
        for level in &snapshot.asks {
            if let Some((price, quantity)) = validation::sanitize_price_level(level) {
                book.add_ask(price, quantity, 1);
            }
        }
        book.update_last_update_id(snapshot.last_update_id);

        self.metrics.record_snapshot_applied();
        info!(
            symbol = %symbol,
            last_update_id = snapshot.last_update_id,
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            "loaded depth snapshot"
        );
        true
    }

    /// Register a streaming subscriber; returns its id and frame queue.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<PushFrame>) {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel(self.subscriber_queue_capacity);
        self.subscribers.insert(id, tx);
        debug!(subscriber_id = id, "subscriber registered");
        (id, rx)
    }

    /// Remove a streaming subscriber.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.remove(&id).is_some() {
            debug!(subscriber_id = id, "subscriber deregistered");
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Drop every subscriber queue, ending each relay loop.
    ///
    /// Part of shutdown: no new frames are deliverable afterwards.
    pub fn shutdown(&self) {
        self.subscribers.clear();
    }

    /// Fan a frame out to every subscriber queue.
    ///
    /// Ids are collected first so removal during iteration is safe. A
    /// subscriber whose queue is full or closed is removed before the next
    /// broadcast can reach it.
    pub fn broadcast(&self, frame: PushFrame) {
        let ids: Vec<SubscriberId> = self.subscribers.iter().map(|e| *e.key()).collect();
        for id in ids {
            let Some(sub) = self.subscribers.get(&id) else {
                continue;
            };
            let result = sub.value().try_send(frame.clone());
            drop(sub);

            match result {
                Ok(()) => self.metrics.record_broadcast(),
                Err(_) => {
                    self.subscribers.remove(&id);
                    self.metrics.record_subscriber_dropped();
                    warn!(subscriber_id = id, "dropping subscriber: queue full or closed");
                }
            }
        }
    }

    /// Per-book and subscriber stats for the stats endpoint.
    pub fn stats(&self) -> RegistryStats {
        let mut books: Vec<BookStats> = self
            .books
            .iter()
            .map(|entry| {
                let book = entry.value();
                BookStats {
                    symbol: book.symbol().clone(),
                    last_update_id: book.last_update_id(),
                    last_update_time: book.last_update_time(),
                    bid_levels: book.bid_depth(),
                    ask_levels: book.ask_depth(),
                }
            })
            .collect();
        books.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        RegistryStats {
            total_books: books.len(),
            subscribers: self.subscriber_count(),
            books,
        }
    }
}

/// Per-book summary for `/api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct BookStats {
    pub symbol: Symbol,
    pub last_update_id: u64,
    pub last_update_time: i64,
    pub bid_levels: usize,
    pub ask_levels: usize,
}

/// Registry-wide summary for `/api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_books: usize,
    pub subscribers: usize,
    pub books: Vec<BookStats>,
}
