//! Market Mirror Service
//!
//! Maintains live, per-symbol aggregated order books for a configured set of
//! perpetual-futures symbols by consuming the venue's incremental depth-diff
//! stream, and exposes the mirrored state over HTTP (snapshots and derived
//! analytics) and WebSocket (push updates).
//!
//! # Architecture
//!
//! ```text
//!   Venue WS feed                 Venue REST (snapshot bootstrap)
//!        │                              │
//!    ┌───▼──────┐                       │
//!    │ Binance  │◄──────────────────────┘
//!    │ Client   │  ← parses, validates, dispatches
//!    └───┬──────┘
//!        │ validated diffs
//!    ┌───▼──────┐
//!    │ Registry │  ← sequence state machine, book mutation
//!    └───┬──────┘
//!        │ post-apply snapshots
//!   ┌────┴─────────────┐
//!   │                  │
//! ┌─▼───────────┐  ┌───▼────────┐
//! │ Query (HTTP)│  │ Push (WS)  │
//! └─────────────┘  └────────────┘
//! ```
//!
//! The ingestion task is the single writer for every book; a slow WebSocket
//! subscriber never blocks it (per-subscriber bounded queues, drop on
//! overflow).

pub mod analytics;
pub mod binance;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod order_book;
pub mod registry;
pub mod router;
pub mod state;
pub mod validation;

/// Library version, surfaced by `/api/stats`.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
