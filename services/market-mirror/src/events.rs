//! Wire envelopes for the venue feed and the push surface
//!
//! The upstream stream multiplexes heterogeneous JSON payloads: depth diffs
//! tagged by event kind, subscription acknowledgements, and error envelopes.
//! Each shape gets its own record and the dispatcher tries them in order of
//! specificity, so malformed frames are rejected at the parse boundary
//! instead of deep inside the apply path.
//!
//! Push frames mirror the outbound contract: `welcome`,
//! `orderbooks_snapshot`, `orderbook_update`, and `pong`, all tagged by
//! `type` and stamped with a millisecond timestamp.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use types::Symbol;

use crate::order_book::BookSnapshot;

/// Event-kind marker carried by depth diffs.
pub const DEPTH_UPDATE_EVENT: &str = "depthUpdate";

/// A raw `[price, quantity]` pair as delivered by the venue.
///
/// Both fields are decimal strings; quantity `"0"` marks a deletion.
pub type RawLevel = (String, String);

/// Incremental depth diff.
///
/// Covers venue update ids `first_update_id..=final_update_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthUpdate {
    /// Event-kind marker, `depthUpdate` for diffs.
    #[serde(rename = "e")]
    pub event_type: String,
    /// Uppercase symbol as tagged by the venue.
    #[serde(rename = "s")]
    pub symbol: String,
    /// First update id covered by this diff (`U`).
    #[serde(rename = "U")]
    pub first_update_id: u64,
    /// Final update id covered by this diff (`u`).
    #[serde(rename = "u")]
    pub final_update_id: u64,
    /// Bid changes.
    #[serde(rename = "b")]
    pub bids: Vec<RawLevel>,
    /// Ask changes.
    #[serde(rename = "a")]
    pub asks: Vec<RawLevel>,
}

impl DepthUpdate {
    /// Lowercase symbol used as the registry key.
    pub fn symbol_key(&self) -> Symbol {
        Symbol::new(&self.symbol)
    }
}

/// Full-depth snapshot from the venue's REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

/// Stream subscription control message.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeCommand {
    pub method: &'static str,
    pub params: Vec<String>,
    pub id: u64,
}

impl SubscribeCommand {
    /// Subscribe to the 100 ms depth-diff stream for one symbol.
    pub fn depth(symbol: &Symbol, id: u64) -> Self {
        Self {
            method: "SUBSCRIBE",
            params: vec![format!("{}@depth@100ms", symbol)],
            id,
        }
    }
}

/// Acknowledgement of a subscription control message.
///
/// The venue replies `{"result": null, "id": <n>}` on success.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeAck {
    pub result: Option<serde_json::Value>,
    pub id: u64,
}

/// Error envelope sent by the venue on a rejected control message.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueErrorMessage {
    pub error: VenueError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueError {
    pub code: i64,
    pub msg: String,
}

/// Any frame the venue can deliver on the multiplexed stream.
///
/// Variants are tried most-specific first; frames matching none of them are
/// handled by the client's fallback path (unknown event kinds are
/// debug-logged, everything else is a malformed frame).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VenueMessage {
    Depth(DepthUpdate),
    Error(VenueErrorMessage),
    Ack(SubscribeAck),
}

/// Control frames accepted from a push-surface subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Ping,
    Subscribe { symbol: String },
}

/// Frames delivered to push-surface subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushFrame {
    Welcome {
        message: String,
        timestamp: i64,
    },
    OrderbooksSnapshot {
        data: BTreeMap<Symbol, BookSnapshot>,
        timestamp: i64,
    },
    OrderbookUpdate {
        symbol: Symbol,
        data: BookSnapshot,
        timestamp: i64,
    },
    Pong {
        timestamp: i64,
    },
}
