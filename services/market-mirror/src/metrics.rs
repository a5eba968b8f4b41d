//! Service counters
//!
//! Atomic counters covering the ingestion and fan-out paths, surfaced by
//! `/api/stats`. Resyncs get their own counter so a large-gap adoption is
//! observable and not just a warn line in the log.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Core metrics for the mirror service.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    /// Diffs applied to a book (including bootstrap and resync applies).
    pub diffs_applied: AtomicU64,
    /// Diffs dropped by the sequence-continuity check.
    pub diffs_dropped: AtomicU64,
    /// Large-gap adoptions.
    pub resyncs: AtomicU64,
    /// Full snapshots loaded into a book.
    pub snapshots_applied: AtomicU64,
    /// Upstream frames that failed parsing or validation.
    pub invalid_frames: AtomicU64,
    /// Push frames handed to subscriber queues.
    pub broadcasts_sent: AtomicU64,
    /// Subscribers removed for a full or closed queue.
    pub subscribers_dropped: AtomicU64,
    /// Upstream reconnect attempts.
    pub reconnects: AtomicU64,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_diff_applied(&self) {
        self.diffs_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_diff_dropped(&self) {
        self.diffs_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resync(&self) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_applied(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_frame(&self) {
        self.invalid_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self) {
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_subscriber_dropped(&self) {
        self.subscribers_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy for the stats endpoint.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            diffs_applied: self.diffs_applied.load(Ordering::Relaxed),
            diffs_dropped: self.diffs_dropped.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            snapshots_applied: self.snapshots_applied.load(Ordering::Relaxed),
            invalid_frames: self.invalid_frames.load(Ordering::Relaxed),
            broadcasts_sent: self.broadcasts_sent.load(Ordering::Relaxed),
            subscribers_dropped: self.subscribers_dropped.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`ServiceMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub diffs_applied: u64,
    pub diffs_dropped: u64,
    pub resyncs: u64,
    pub snapshots_applied: u64,
    pub invalid_frames: u64,
    pub broadcasts_sent: u64,
    pub subscribers_dropped: u64,
    pub reconnects: u64,
}
