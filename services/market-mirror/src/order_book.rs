//! In-memory mirrored order book
//!
//! Maintains a price-aggregated ladder per symbol from validated venue
//! diffs. Uses `BTreeMap` keyed by price for sorted iteration, so top-of-book
//! and top-N reads never re-sort. All arithmetic uses `Decimal`.
//!
//! A level is present in a side iff its quantity is positive: a diff change
//! with quantity zero deletes the level, anything else overwrites it.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::{now_millis, Price, Quantity, Symbol};

/// A single aggregated price level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// The price of this level.
    pub price: Price,
    /// Aggregate quantity resting at this price.
    pub quantity: Quantity,
    /// Number of orders behind the aggregate, when the venue reports it.
    pub count: u32,
    /// Last-touch timestamp (ms).
    pub timestamp: i64,
}

impl PriceLevel {
    fn new(price: Price, quantity: Quantity, count: u32) -> Self {
        Self {
            price,
            quantity,
            count,
            timestamp: now_millis(),
        }
    }

    /// Refresh quantity and count in place, advancing the touch timestamp.
    pub fn update(&mut self, quantity: Quantity, count: u32) {
        self.quantity = quantity;
        self.count = count;
        self.timestamp = now_millis();
    }
}

/// Per-symbol aggregated order book.
///
/// Bids are logically ordered descending, asks ascending; both sides are
/// stored ascending in a `BTreeMap` and the bid iterator is reversed.
/// `last_update_id` is the venue's monotone counter; zero means the book has
/// never been aligned with the feed.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    pub(crate) bids: BTreeMap<Decimal, PriceLevel>,
    pub(crate) asks: BTreeMap<Decimal, PriceLevel>,
    last_update_id: u64,
    last_update_time: i64,
}

impl OrderBook {
    /// Create an empty, uninitialized book for the given symbol.
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_update_id: 0,
            last_update_time: 0,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Write or replace the bid level at `price`; a zero quantity deletes it.
    ///
    /// Deleting a missing level is a no-op.
    pub fn add_bid(&mut self, price: Price, quantity: Quantity, count: u32) {
        Self::apply_level(&mut self.bids, price, quantity, count);
        self.last_update_time = now_millis();
    }

    /// Write or replace the ask level at `price`; a zero quantity deletes it.
    pub fn add_ask(&mut self, price: Price, quantity: Quantity, count: u32) {
        Self::apply_level(&mut self.asks, price, quantity, count);
        self.last_update_time = now_millis();
    }

    /// Same effect as [`add_bid`](Self::add_bid), but a no-op when no level
    /// exists at `price`.
    pub fn update_bid(&mut self, price: Price, quantity: Quantity, count: u32) {
        if self.bids.contains_key(&price.as_decimal()) {
            self.add_bid(price, quantity, count);
        }
    }

    /// Same effect as [`add_ask`](Self::add_ask), but a no-op when no level
    /// exists at `price`.
    pub fn update_ask(&mut self, price: Price, quantity: Quantity, count: u32) {
        if self.asks.contains_key(&price.as_decimal()) {
            self.add_ask(price, quantity, count);
        }
    }

    fn apply_level(
        side: &mut BTreeMap<Decimal, PriceLevel>,
        price: Price,
        quantity: Quantity,
        count: u32,
    ) {
        if quantity.is_zero() {
            side.remove(&price.as_decimal());
        } else {
            side.entry(price.as_decimal())
                .and_modify(|level| level.update(quantity, count))
                .or_insert_with(|| PriceLevel::new(price, quantity, count));
        }
    }

    /// Top-N bid levels, best (highest price) first. No limit = whole side.
    pub fn bids(&self, limit: Option<usize>) -> Vec<PriceLevel> {
        let iter = self.bids.values().rev().cloned();
        match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }

    /// Top-N ask levels, best (lowest price) first. No limit = whole side.
    pub fn asks(&self, limit: Option<usize>) -> Vec<PriceLevel> {
        let iter = self.asks.values().cloned();
        match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }

    /// Highest-priced bid level.
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.values().next_back()
    }

    /// Lowest-priced ask level.
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.values().next()
    }

    /// Best ask minus best bid.
    ///
    /// Negative under a transient venue crossing; absent if either side is
    /// empty.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => {
                Some(ask.price.as_decimal() - bid.price.as_decimal())
            }
            _ => None,
        }
    }

    /// Midpoint of the touch, absent if either side is empty.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => {
                Some((bid.price.as_decimal() + ask.price.as_decimal()) / Decimal::from(2))
            }
            _ => None,
        }
    }

    /// Number of bid price levels.
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of ask price levels.
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Last applied venue update id (0 = uninitialized).
    pub fn last_update_id(&self) -> u64 {
        self.last_update_id
    }

    pub fn last_update_time(&self) -> i64 {
        self.last_update_time
    }

    /// Adopt the venue's update id after a successful apply.
    ///
    /// Registry bookkeeping only.
    pub fn update_last_update_id(&mut self, id: u64) {
        self.last_update_id = id;
        self.last_update_time = now_millis();
    }

    /// Drop all levels and reset the update id to uninitialized.
    ///
    /// Invoked only while loading a full snapshot.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.last_update_id = 0;
        self.last_update_time = now_millis();
    }

    /// Composite point-in-time view of the book, optionally truncated to the
    /// top `limit` levels per side.
    pub fn snapshot(&self, limit: Option<usize>) -> BookSnapshot {
        BookSnapshot {
            symbol: self.symbol.clone(),
            last_update_id: self.last_update_id,
            last_update_time: self.last_update_time,
            bids: self.bids(limit),
            asks: self.asks(limit),
            spread: self.spread(),
            mid_price: self.mid_price(),
            total_bids: self.bid_depth(),
            total_asks: self.ask_depth(),
        }
    }
}

/// A snapshot of the order book at a point in time.
///
/// `total_bids`/`total_asks` count the whole side even when the level lists
/// are truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub last_update_id: u64,
    pub last_update_time: i64,
    /// Bids in descending price order (best first).
    pub bids: Vec<PriceLevel>,
    /// Asks in ascending price order (best first).
    pub asks: Vec<PriceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mid_price: Option<Decimal>,
    pub total_bids: usize,
    pub total_asks: usize,
}
