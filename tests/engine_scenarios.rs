//! End-to-end engine scenarios: submission, matching, time-in-force, cancels,
//! stops, and expiry against a BTCUSDT-style symbol.

use matchbook::{
    CancelError, Engine, InMemoryEventSink, OrderRequest, OrderStatus, OrderType, OwnerId,
    RejectReason, Side, Symbol, SymbolConfig, TimeInForce,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn btcusdt() -> SymbolConfig {
    SymbolConfig {
        symbol: Symbol::new("BTCUSDT"),
        tick_size: dec("0.01"),
        lot_size: dec("0.0001"),
        min_quantity: dec("0.0001"),
        max_quantity: dec("1000"),
        min_price: dec("0.01"),
        max_price: dec("1000000"),
        quote_precision: 2,
    }
}

fn request(
    side: Side,
    order_type: OrderType,
    qty: &str,
    price: Option<&str>,
    tif: TimeInForce,
    owner: u64,
) -> OrderRequest {
    OrderRequest {
        symbol: Symbol::new("BTCUSDT"),
        side,
        order_type,
        quantity: dec(qty),
        price: price.map(dec),
        stop_price: None,
        time_in_force: tif,
        owner: OwnerId(owner),
        client_order_id: None,
        expires_at: None,
        timestamp: 1,
    }
}

fn limit(side: Side, qty: &str, price: &str, owner: u64) -> OrderRequest {
    request(side, OrderType::Limit, qty, Some(price), TimeInForce::GTC, owner)
}

/// The worked example: rest a sell, partially take it, then reject a market
/// sell against the now-empty bid side.
#[test]
fn btcusdt_walkthrough() {
    let mut engine = Engine::new(btcusdt());

    let ack = engine
        .submit_order(limit(Side::Sell, "1.0000", "50000.00", 1))
        .unwrap();
    assert_eq!(ack.status, OrderStatus::Open);
    assert_eq!(
        engine.depth(5).asks,
        vec![(dec("50000.00"), dec("1.0000"))]
    );

    let ack = engine
        .submit_order(limit(Side::Buy, "0.6000", "50000.00", 2))
        .unwrap();
    assert_eq!(ack.status, OrderStatus::Filled);
    assert_eq!(ack.trades.len(), 1);
    assert_eq!(ack.trades[0].price, dec("50000.00"));
    assert_eq!(ack.trades[0].quantity, dec("0.6000"));
    assert_eq!(
        engine.depth(5).asks,
        vec![(dec("50000.00"), dec("0.4000"))]
    );

    let ack = engine
        .submit_order(request(
            Side::Sell,
            OrderType::Market,
            "0.5000",
            None,
            TimeInForce::GTC,
            3,
        ))
        .unwrap();
    assert_eq!(ack.status, OrderStatus::Rejected);
    assert_eq!(ack.reason, Some(RejectReason::NoLiquidity));
}

/// Equal-price resting orders fill in strict arrival order.
#[test]
fn price_time_priority_fifo_at_equal_price() {
    let mut engine = Engine::new(btcusdt());
    let mut resting_ids = Vec::new();
    for owner in 1..=4u64 {
        let ack = engine
            .submit_order(limit(Side::Sell, "0.2000", "50000.00", owner))
            .unwrap();
        resting_ids.push(ack.order_id.unwrap());
    }

    // Crossing buy smaller than total depth: consumes the first 2.5 orders.
    let ack = engine
        .submit_order(limit(Side::Buy, "0.5000", "50000.00", 9))
        .unwrap();
    let makers: Vec<_> = ack.trades.iter().map(|t| t.maker_order_id).collect();
    assert_eq!(makers, vec![resting_ids[0], resting_ids[1], resting_ids[2]]);
    assert_eq!(ack.trades[2].quantity, dec("0.1000"));
    assert_eq!(
        engine.get_order(resting_ids[2]).unwrap().status,
        OrderStatus::PartiallyFilled
    );
    assert_eq!(
        engine.get_order(resting_ids[3]).unwrap().status,
        OrderStatus::Open
    );
}

/// A marketable limit always executes at the maker's price, never its own.
#[test]
fn price_improvement_goes_to_the_taker() {
    let mut engine = Engine::new(btcusdt());
    engine
        .submit_order(limit(Side::Sell, "1.0000", "100.00", 1))
        .unwrap();

    let ack = engine
        .submit_order(limit(Side::Buy, "1.0000", "105.00", 2))
        .unwrap();
    assert_eq!(ack.trades.len(), 1);
    assert_eq!(ack.trades[0].price, dec("100.00"), "fills at maker price");
}

/// FOK that cannot fully fill: zero trades, book identical to before.
#[test]
fn fok_atomicity_leaves_book_untouched() {
    let mut engine = Engine::new(btcusdt());
    engine
        .submit_order(limit(Side::Sell, "0.3000", "100.00", 1))
        .unwrap();
    engine
        .submit_order(limit(Side::Buy, "0.1000", "99.00", 2))
        .unwrap();
    let before = engine.depth(10);

    let ack = engine
        .submit_order(request(
            Side::Buy,
            OrderType::Limit,
            "0.5000",
            Some("100.00"),
            TimeInForce::FOK,
            3,
        ))
        .unwrap();
    assert_eq!(ack.status, OrderStatus::Rejected);
    assert_eq!(ack.reason, Some(RejectReason::FokUnsatisfiable));
    assert!(ack.trades.is_empty());

    let after = engine.depth(10);
    assert_eq!(before.bids, after.bids);
    assert_eq!(before.asks, after.asks);
}

/// FOK availability excludes the submitter's own resting orders.
#[test]
fn fok_pre_check_skips_self_liquidity() {
    let mut engine = Engine::new(btcusdt());
    engine
        .submit_order(limit(Side::Sell, "0.5000", "100.00", 7))
        .unwrap();
    engine
        .submit_order(limit(Side::Sell, "0.2000", "100.00", 2))
        .unwrap();

    // 0.7 rests at 100, but only 0.2 belongs to other owners.
    let ack = engine
        .submit_order(request(
            Side::Buy,
            OrderType::Limit,
            "0.5000",
            Some("100.00"),
            TimeInForce::FOK,
            7,
        ))
        .unwrap();
    assert_eq!(ack.reason, Some(RejectReason::FokUnsatisfiable));
    assert!(ack.trades.is_empty());
}

/// An IOC remainder never shows up in later depth queries.
#[test]
fn ioc_remainder_absent_from_depth() {
    let mut engine = Engine::new(btcusdt());
    engine
        .submit_order(limit(Side::Sell, "0.2000", "100.00", 1))
        .unwrap();

    let ack = engine
        .submit_order(request(
            Side::Buy,
            OrderType::Limit,
            "1.0000",
            Some("100.00"),
            TimeInForce::IOC,
            2,
        ))
        .unwrap();
    assert_eq!(ack.trades.len(), 1);
    assert_eq!(ack.status, OrderStatus::Cancelled);
    assert!(engine.depth(10).bids.is_empty());
    assert!(engine.depth(10).asks.is_empty());
}

/// Two same-owner orders that would cross produce zero trades, and other
/// owners' liquidity is still reachable behind a self order.
#[test]
fn self_trade_prevention_skips_to_next_maker() {
    let sink = InMemoryEventSink::new();
    let mut engine = Engine::with_sink(btcusdt(), Arc::new(sink.clone()));

    engine
        .submit_order(limit(Side::Sell, "0.3000", "100.00", 7))
        .unwrap();
    engine
        .submit_order(limit(Side::Sell, "0.3000", "100.00", 2))
        .unwrap();

    let ack = engine
        .submit_order(limit(Side::Buy, "0.3000", "100.00", 7))
        .unwrap();
    assert_eq!(ack.trades.len(), 1);
    assert_eq!(ack.status, OrderStatus::Filled);
    // The fill came from owner 2's order; owner 7's own ask still rests.
    assert_eq!(
        engine.depth(5).asks,
        vec![(dec("100.00"), dec("0.3000"))]
    );
    for trade in sink.trades() {
        assert_ne!(trade.maker_order_id, trade.taker_order_id);
    }
}

/// Cancelling a terminal order twice reports failure both times and emits
/// no events.
#[test]
fn idempotent_cancel_of_terminal_order() {
    let sink = InMemoryEventSink::new();
    let mut engine = Engine::with_sink(btcusdt(), Arc::new(sink.clone()));
    let id = engine
        .submit_order(limit(Side::Sell, "1.0000", "100.00", 1))
        .unwrap()
        .order_id
        .unwrap();
    assert!(engine.cancel_order(id).unwrap().success);

    sink.clear();
    for _ in 0..2 {
        let result = engine.cancel_order(id).unwrap();
        assert!(!result.success);
        assert!(matches!(
            result.reason,
            Some(CancelError::NotCancellable { .. })
        ));
    }
    assert!(sink.trades().is_empty());
    assert!(sink.status_changes().is_empty());
}

/// Stop-limit chain: one trade arms a stop whose execution arms another.
#[test]
fn cascading_stop_limits_arm_in_sequence() {
    let mut engine = Engine::new(btcusdt());

    // Two sell stops below the market.
    let mut stop_a = request(
        Side::Sell,
        OrderType::StopLimit,
        "0.1000",
        Some("98.00"),
        TimeInForce::GTC,
        1,
    );
    stop_a.stop_price = Some(dec("100.00"));
    let stop_a_id = engine.submit_order(stop_a).unwrap().order_id.unwrap();

    let mut stop_b = request(
        Side::Sell,
        OrderType::StopLimit,
        "0.1000",
        Some("97.00"),
        TimeInForce::GTC,
        2,
    );
    stop_b.stop_price = Some(dec("99.00"));
    let stop_b_id = engine.submit_order(stop_b).unwrap().order_id.unwrap();

    // Bids for the armed stops to hit.
    engine.submit_order(limit(Side::Buy, "0.1000", "99.00", 3)).unwrap();
    engine.submit_order(limit(Side::Buy, "0.1000", "98.00", 4)).unwrap();

    // Trade at 100 arms stop A; its fill at 99 arms stop B.
    engine.submit_order(limit(Side::Sell, "0.1000", "100.00", 5)).unwrap();
    engine.submit_order(limit(Side::Buy, "0.1000", "100.00", 6)).unwrap();

    assert_eq!(
        engine.get_order(stop_a_id).unwrap().status,
        OrderStatus::Filled
    );
    assert_eq!(
        engine.get_order(stop_b_id).unwrap().status,
        OrderStatus::Filled
    );
    assert_eq!(engine.last_trade_price(), Some(dec("98.00")));
}

/// GTD sweep cancels only due orders and reports them as expired.
#[test]
fn gtd_expiry_sweep() {
    let mut engine = Engine::new(btcusdt());
    let mut due = limit(Side::Buy, "0.5000", "99.00", 1);
    due.expires_at = Some(1000);
    let due_id = engine.submit_order(due).unwrap().order_id.unwrap();

    let mut later = limit(Side::Buy, "0.5000", "98.00", 1);
    later.expires_at = Some(2000);
    let later_id = engine.submit_order(later).unwrap().order_id.unwrap();

    assert!(engine.expire_gtd_orders(999).unwrap().is_empty());
    let expired = engine.expire_gtd_orders(1000).unwrap();
    assert_eq!(expired, vec![due_id]);
    assert_eq!(engine.get_order(due_id).unwrap().status, OrderStatus::Expired);
    assert_eq!(engine.get_order(later_id).unwrap().status, OrderStatus::Open);
    assert_eq!(engine.depth(5).bids, vec![(dec("98.00"), dec("0.5000"))]);
}

/// Client order ids are echoed back on the acceptance.
#[test]
fn client_order_id_round_trips() {
    let mut engine = Engine::new(btcusdt());
    let mut req = limit(Side::Sell, "1.0000", "100.00", 1);
    req.client_order_id = Some("client-42".into());
    let ack = engine.submit_order(req).unwrap();
    assert_eq!(ack.client_order_id.as_deref(), Some("client-42"));
    let view = engine.get_order(ack.order_id.unwrap()).unwrap();
    assert_eq!(view.client_order_id.as_deref(), Some("client-42"));
}
