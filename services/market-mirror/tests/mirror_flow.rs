//! End-to-end ingestion tests for the mirror service
//!
//! Drives the validator → registry → book → broadcast pipeline with literal
//! venue payloads and checks the externally observable guarantees: books
//! converge to the venue state, out-of-sequence diffs never mutate, each
//! applied diff produces exactly one push frame, and subscribers observe a
//! monotone sequence of update ids.

use std::sync::Arc;

use market_mirror::events::{DepthSnapshot, DepthUpdate, PushFrame, DEPTH_UPDATE_EVENT};
use market_mirror::metrics::ServiceMetrics;
use market_mirror::registry::BookRegistry;
use rust_decimal::Decimal;
use types::{Price, Quantity, Side, SideFilter, Symbol};

fn registry() -> (Arc<ServiceMetrics>, BookRegistry) {
    let metrics = Arc::new(ServiceMetrics::new());
    let registry = BookRegistry::new(1000, 64, Arc::clone(&metrics));
    (metrics, registry)
}

fn level(price: &str, qty: &str) -> (String, String) {
    (price.to_string(), qty.to_string())
}

fn diff(
    first: u64,
    last: u64,
    bids: Vec<(String, String)>,
    asks: Vec<(String, String)>,
) -> DepthUpdate {
    DepthUpdate {
        event_type: DEPTH_UPDATE_EVENT.to_string(),
        symbol: "BTCUSDT".to_string(),
        first_update_id: first,
        final_update_id: last,
        bids,
        asks,
    }
}

fn symbol() -> Symbol {
    Symbol::new("btcusdt")
}

#[test]
fn snapshot_then_diffs_converges_to_venue_state() {
    let (_, reg) = registry();

    let snapshot = DepthSnapshot {
        last_update_id: 100,
        bids: vec![level("50000", "1.5"), level("49999", "2.0")],
        asks: vec![level("50001", "1.0"), level("50002", "3.0")],
    };
    assert!(reg.apply_snapshot(&symbol(), &snapshot));

    // Replace the best bid, delete the deep ask, add a new ask.
    assert!(reg.apply_diff(&diff(
        101,
        103,
        vec![level("50000", "0.5")],
        vec![level("50002", "0"), level("50003", "4.0")],
    )));

    let snap = reg.snapshot(&symbol(), None).unwrap();
    assert_eq!(snap.last_update_id, 103);

    let bid_view: Vec<(Price, Quantity)> =
        snap.bids.iter().map(|l| (l.price, l.quantity)).collect();
    assert_eq!(
        bid_view,
        vec![
            (Price::from_u64(50000), Quantity::parse("0.5").unwrap()),
            (Price::from_u64(49999), Quantity::parse("2.0").unwrap()),
        ]
    );

    let ask_view: Vec<(Price, Quantity)> =
        snap.asks.iter().map(|l| (l.price, l.quantity)).collect();
    assert_eq!(
        ask_view,
        vec![
            (Price::from_u64(50001), Quantity::parse("1.0").unwrap()),
            (Price::from_u64(50003), Quantity::parse("4.0").unwrap()),
        ]
    );

    assert_eq!(snap.spread.unwrap(), Decimal::from(1));
}

#[test]
fn snapshot_with_zero_diffs_round_trips() {
    let (_, reg) = registry();

    let snapshot = DepthSnapshot {
        last_update_id: 42,
        bids: vec![level("50000.10", "1.5"), level("49999.90", "0.25")],
        asks: vec![level("50001.00", "2.0")],
    };
    assert!(reg.apply_snapshot(&symbol(), &snapshot));

    let snap = reg.snapshot(&symbol(), None).unwrap();
    assert_eq!(snap.last_update_id, 42);
    assert_eq!(snap.total_bids, 2);
    assert_eq!(snap.total_asks, 1);
    assert_eq!(snap.bids[0].price, Price::parse("50000.10").unwrap());
    assert_eq!(snap.bids[1].price, Price::parse("49999.90").unwrap());
    assert_eq!(snap.asks[0].quantity, Quantity::parse("2.0").unwrap());
}

#[test]
fn out_of_sequence_diff_never_mutates() {
    let (metrics, reg) = registry();

    assert!(reg.apply_diff(&diff(100, 100, vec![level("50000", "1.0")], vec![])));
    assert!(reg.apply_diff(&diff(101, 105, vec![level("50001", "2.0")], vec![])));

    // Replay and stale diffs must both be rejected without touching levels.
    assert!(!reg.apply_diff(&diff(101, 105, vec![level("50001", "9.9")], vec![])));
    assert!(!reg.apply_diff(&diff(103, 104, vec![level("40000", "1.0")], vec![])));

    let snap = reg.snapshot(&symbol(), None).unwrap();
    assert_eq!(snap.last_update_id, 105);
    assert_eq!(snap.bids.len(), 2);
    assert_eq!(snap.bids[0].quantity, Quantity::parse("2.0").unwrap());
    assert_eq!(metrics.snapshot().diffs_dropped, 2);
}

#[test]
fn large_gap_is_adopted_and_counted() {
    let (metrics, reg) = registry();

    assert!(reg.apply_diff(&diff(100, 100, vec![level("50000", "1.0")], vec![])));
    assert!(reg.apply_diff(&diff(5000, 5010, vec![level("50005", "2.0")], vec![])));

    assert_eq!(reg.snapshot(&symbol(), None).unwrap().last_update_id, 5010);
    assert_eq!(metrics.snapshot().resyncs, 1);
    assert_eq!(metrics.snapshot().diffs_applied, 2);
}

#[test]
fn subscribers_observe_monotone_update_ids() {
    let (_, reg) = registry();
    let (_id, mut rx) = reg.subscribe();

    assert!(reg.apply_diff(&diff(1, 3, vec![level("50000", "1.0")], vec![])));
    assert!(reg.apply_diff(&diff(4, 6, vec![level("50000", "2.0")], vec![])));
    assert!(!reg.apply_diff(&diff(4, 6, vec![level("50000", "3.0")], vec![])));
    assert!(reg.apply_diff(&diff(7, 9, vec![level("50001", "1.0")], vec![])));

    let mut seen = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        match frame {
            PushFrame::OrderbookUpdate { symbol: s, data, .. } => {
                assert_eq!(s, symbol());
                seen.push(data.last_update_id);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    // One frame per applied diff, strictly increasing ids, nothing for the
    // rejected replay.
    assert_eq!(seen, vec![3, 6, 9]);
}

#[test]
fn crossed_book_reports_negative_spread() {
    let (_, reg) = registry();

    assert!(reg.apply_diff(&diff(
        1,
        1,
        vec![level("50002", "1.0")],
        vec![level("50000", "1.0")],
    )));

    let snap = reg.snapshot(&symbol(), None).unwrap();
    assert_eq!(snap.spread.unwrap(), Decimal::from(-2));
    assert_eq!(snap.mid_price.unwrap(), Decimal::from(50001));
}

#[test]
fn analytics_reflect_applied_diffs() {
    let (_, reg) = registry();

    assert!(reg.apply_diff(&diff(
        1,
        5,
        vec![level("99", "1"), level("98", "2"), level("97", "5")],
        vec![level("100", "2"), level("101", "3"), level("102", "10")],
    )));

    let acc = reg
        .with_book(&symbol(), |book| {
            book.accumulated_to_price(Price::from_u64(98), SideFilter::Bids)
        })
        .unwrap();
    let bids = acc.bids.unwrap();
    assert_eq!(bids.quantity, Decimal::from(3));
    assert_eq!(bids.cost, Decimal::from(295));

    let impact = reg
        .with_book(&symbol(), |book| {
            book.market_impact(Quantity::parse("4").unwrap(), Side::Buy)
        })
        .unwrap()
        .unwrap();
    assert_eq!(impact.total_cost, Decimal::from(402));
    assert_eq!(
        impact.average_price,
        Decimal::from_str_exact("100.5").unwrap()
    );
    assert!(impact.can_fill);

    let profile = reg
        .with_book(&symbol(), |book| book.liquidity_profile(2))
        .unwrap();
    assert_eq!(profile.bids.len(), 2);
    assert_eq!(profile.bids[1].accumulated_quantity, Decimal::from(3));
}

#[test]
fn malformed_and_foreign_levels_are_rejected_whole() {
    let (metrics, reg) = registry();

    // One bad level poisons the whole diff; the book stays untouched.
    assert!(!reg.apply_diff(&diff(
        1,
        1,
        vec![level("50000", "1.0"), level("-1", "1.0")],
        vec![],
    )));
    assert_eq!(reg.book_count(), 0);
    assert_eq!(metrics.snapshot().invalid_frames, 1);
}

#[test]
fn per_symbol_isolation() {
    let (_, reg) = registry();

    let mut eth = diff(1, 1, vec![level("3000", "10")], vec![]);
    eth.symbol = "ETHUSDT".to_string();

    assert!(reg.apply_diff(&diff(1, 1, vec![level("50000", "1.0")], vec![])));
    assert!(reg.apply_diff(&eth));

    assert_eq!(reg.book_count(), 2);
    let btc = reg.snapshot(&Symbol::new("btcusdt"), None).unwrap();
    let eth = reg.snapshot(&Symbol::new("ethusdt"), None).unwrap();
    assert_eq!(btc.bids[0].price, Price::from_u64(50000));
    assert_eq!(eth.bids[0].price, Price::from_u64(3000));
}
