//! Feed validator
//!
//! Pure predicates over inbound venue payloads, applied before anything
//! touches a book. Typed parsing already guarantees shape; these checks
//! guard the numeric domain (positive prices, non-negative quantities) and
//! the diff-continuity rule.

use types::{Price, Quantity};

use crate::events::{DepthSnapshot, DepthUpdate, RawLevel, DEPTH_UPDATE_EVENT};

/// A `[price, quantity]` pair is valid when both parse as decimals with
/// price > 0 and quantity ≥ 0.
pub fn is_valid_price_level(level: &RawLevel) -> bool {
    sanitize_price_level(level).is_some()
}

/// Parse a raw level into its numeric form, or None if invalid.
pub fn sanitize_price_level(level: &RawLevel) -> Option<(Price, Quantity)> {
    let price = Price::parse(&level.0)?;
    let quantity = Quantity::parse(&level.1)?;
    Some((price, quantity))
}

/// A diff is valid when it carries the depth event kind, a non-empty symbol,
/// and only valid levels on both sides.
pub fn is_valid_diff_update(diff: &DepthUpdate) -> bool {
    diff.event_type == DEPTH_UPDATE_EVENT
        && !diff.symbol.trim().is_empty()
        && diff.bids.iter().all(is_valid_price_level)
        && diff.asks.iter().all(is_valid_price_level)
}

/// A snapshot is valid when it carries a positive update id and only valid
/// levels on both sides.
pub fn is_valid_snapshot(snapshot: &DepthSnapshot) -> bool {
    snapshot.last_update_id > 0
        && snapshot.bids.iter().all(is_valid_price_level)
        && snapshot.asks.iter().all(is_valid_price_level)
}

/// The venue's diff-continuity rule: the diff `[first, final]` must cover the
/// expected next id, `current + 1`.
pub fn sequence_ok(current: u64, first_update_id: u64, final_update_id: u64) -> bool {
    first_update_id <= current + 1 && final_update_id >= current + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: &str, qty: &str) -> RawLevel {
        (price.to_string(), qty.to_string())
    }

    fn diff(bids: Vec<RawLevel>, asks: Vec<RawLevel>) -> DepthUpdate {
        DepthUpdate {
            event_type: DEPTH_UPDATE_EVENT.to_string(),
            symbol: "BTCUSDT".to_string(),
            first_update_id: 101,
            final_update_id: 105,
            bids,
            asks,
        }
    }

    #[test]
    fn test_valid_price_level() {
        assert!(is_valid_price_level(&level("50000.00", "1.5")));
        assert!(is_valid_price_level(&level("50000.00", "0")));
    }

    #[test]
    fn test_invalid_price_levels() {
        assert!(!is_valid_price_level(&level("0", "1.5")));
        assert!(!is_valid_price_level(&level("-50000", "1.5")));
        assert!(!is_valid_price_level(&level("50000", "-1")));
        assert!(!is_valid_price_level(&level("fifty", "1.5")));
        assert!(!is_valid_price_level(&level("50000", "one")));
        assert!(!is_valid_price_level(&level("NaN", "1")));
        assert!(!is_valid_price_level(&level("Infinity", "1")));
    }

    #[test]
    fn test_sanitize_price_level() {
        let (price, qty) = sanitize_price_level(&level("50000.50", "0.25")).unwrap();
        assert_eq!(price, Price::parse("50000.50").unwrap());
        assert_eq!(qty, Quantity::parse("0.25").unwrap());

        assert!(sanitize_price_level(&level("", "1")).is_none());
    }

    #[test]
    fn test_valid_diff_update() {
        assert!(is_valid_diff_update(&diff(
            vec![level("50000", "1.5")],
            vec![level("50001", "0")],
        )));
    }

    #[test]
    fn test_diff_rejects_wrong_event_kind() {
        let mut d = diff(vec![], vec![]);
        d.event_type = "aggTrade".to_string();
        assert!(!is_valid_diff_update(&d));
    }

    #[test]
    fn test_diff_rejects_empty_symbol() {
        let mut d = diff(vec![], vec![]);
        d.symbol = "  ".to_string();
        assert!(!is_valid_diff_update(&d));
    }

    #[test]
    fn test_diff_rejects_any_bad_level() {
        assert!(!is_valid_diff_update(&diff(
            vec![level("50000", "1.5"), level("bad", "1")],
            vec![],
        )));
    }

    #[test]
    fn test_valid_snapshot() {
        let snap = DepthSnapshot {
            last_update_id: 160,
            bids: vec![level("50000", "1.0")],
            asks: vec![level("50001", "2.0")],
        };
        assert!(is_valid_snapshot(&snap));
    }

    #[test]
    fn test_snapshot_rejects_zero_update_id() {
        let snap = DepthSnapshot {
            last_update_id: 0,
            bids: vec![],
            asks: vec![],
        };
        assert!(!is_valid_snapshot(&snap));
    }

    #[test]
    fn test_sequence_ok_covers_expected_next_id() {
        // Diff exactly continues the book.
        assert!(sequence_ok(100, 101, 105));
        // Diff overlaps the book but still covers 101.
        assert!(sequence_ok(100, 95, 101));
        // Diff entirely in the past.
        assert!(!sequence_ok(100, 95, 100));
        // Diff starts beyond the expected next id (gap).
        assert!(!sequence_ok(100, 102, 110));
    }

    #[test]
    fn test_sequence_ok_replay_of_same_diff_fails() {
        // After applying [101, 105] the book sits at 105; replaying the same
        // diff no longer covers 106.
        assert!(sequence_ok(100, 101, 105));
        assert!(!sequence_ok(105, 101, 105));
    }
}
