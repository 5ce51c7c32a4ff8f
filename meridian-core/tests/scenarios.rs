//! End-to-end scenario tests (§8): one test per concrete input/output
//! pair the component design is built against, exercising the public
//! crate surface the way an external caller would rather than reaching
//! into private module internals.

use std::cell::RefCell;

use meridian_core::config::{MeanReversionParams, RiskLimits, TwapParams, VwapParams};
use meridian_core::domain::{OrderType, Quote, Side, Symbol, Venue};
use meridian_core::handlers::PositionManager;
use meridian_core::risk::{RiskCheckRequest, RiskEngine};
use meridian_core::strategy::{MeanReversion, Strategy, StrategyContext, Twap, Vwap};

fn aapl() -> Symbol {
    Symbol::new("AAPL", Venue::Nasdaq)
}

/// Scenario 1: Long round trip. Fill BUY 100 @ 15000 then SELL 100 @
/// 15500 on AAPL; position goes flat with realizedPnl = 50000.
#[test]
fn long_round_trip_closes_flat_with_expected_realized_pnl() {
    let positions = PositionManager::new(100);
    positions.apply_fill(&aapl(), Side::Buy, 100, 15000).unwrap();
    positions.apply_fill(&aapl(), Side::Sell, 100, 15500).unwrap();

    let position = positions.get(&aapl()).unwrap();
    assert_eq!(position.quantity, 0);
    assert_eq!(position.realized_pnl, 50_000);
    assert_eq!(position.unrealized_pnl, 0);
}

/// Scenario 2: Position reversal. BUY 100 @ 15000 then SELL 150 @
/// 15100 flips the position short with a fresh average entry at the
/// reversal price.
#[test]
fn position_reversal_closes_then_reopens_short() {
    let positions = PositionManager::new(100);
    positions.apply_fill(&aapl(), Side::Buy, 100, 15000).unwrap();
    positions.apply_fill(&aapl(), Side::Sell, 150, 15100).unwrap();

    let position = positions.get(&aapl()).unwrap();
    assert_eq!(position.quantity, -50);
    assert_eq!(position.realized_pnl, 10_000);
    assert_eq!(position.avg_entry_price, 15100);
}

struct FakeContext {
    now_ns: u64,
    volumes: std::collections::HashMap<usize, i64>,
    submitted: RefCell<Vec<(Side, i64)>>,
}

impl StrategyContext for FakeContext {
    fn now_ns(&self) -> u64 {
        self.now_ns
    }
    fn latest_quote(&self, _symbol: &Symbol) -> Option<Quote> {
        None
    }
    fn historical_volume(&self, _symbol: &Symbol, bucket: usize) -> i64 {
        *self.volumes.get(&bucket).unwrap_or(&0)
    }
    fn submit_order(&self, _symbol: &Symbol, side: Side, _order_type: OrderType, quantity: i64, _limit_price: Option<i64>) -> u64 {
        self.submitted.borrow_mut().push((side, quantity));
        1
    }
}

fn top_of_book(symbol: &Symbol, bid: i64, ask: i64, bid_size: i64, ask_size: i64) -> Quote {
    Quote { symbol: symbol.clone(), bid_price: bid, ask_price: ask, bid_size, ask_size, received_at: 0, sequence_number: 0, price_scale: 100 }
}

/// Scenario 3: VWAP participation cap. targetQuantity=1000, visible ask
/// size=100, maxParticipationRate=0.25 ⇒ the next slice is ≤ 25.
#[test]
fn vwap_slice_never_exceeds_the_participation_cap() {
    let symbol = aapl();
    let mut strategy = Vwap::new(
        symbol.clone(),
        Side::Buy,
        VwapParams { target_quantity: 1000, start_ns: 0, end_ns: 1_000, max_participation_rate: 0.25, limit_price: None, historical_buckets: 1 },
    );
    strategy.start();

    let ctx = FakeContext { now_ns: 10, volumes: std::collections::HashMap::from([(0, 1)]), submitted: RefCell::new(Vec::new()) };
    strategy.on_quote(&ctx, &top_of_book(&symbol, 100_00, 100_01, 50, 100));

    let (_, quantity) = *ctx.submitted.borrow().last().expect("expected a slice to be submitted");
    assert!(quantity <= 25, "slice {quantity} exceeds the 25% participation cap on size 100");
}

/// Scenario 4: TWAP catch-up. A 10-slice plan where one slice elapsed
/// with zero fills; the next slice's target exceeds the flat per-slice
/// share and total submission so far stays within two slices' worth.
#[test]
fn twap_catches_up_after_a_missed_slice() {
    let symbol = aapl();
    let mut strategy = Twap::new(
        symbol.clone(),
        Side::Buy,
        TwapParams { target_quantity: 1000, start_ns: 0, end_ns: 1_000, slice_interval_ns: 100, max_participation_rate: 1.0, limit_price: None },
    );
    strategy.start();

    let ctx = FakeContext { now_ns: 150, volumes: std::collections::HashMap::new(), submitted: RefCell::new(Vec::new()) };
    strategy.on_quote(&ctx, &top_of_book(&symbol, 99_00, 101_00, 1000, 1000));

    let (_, quantity) = *ctx.submitted.borrow().last().expect("expected a catch-up slice");
    assert!(quantity > 100, "expected a catch-up slice beyond one period's 100-share, got {quantity}");
    let total: i64 = ctx.submitted.borrow().iter().map(|(_, q)| q).sum();
    assert!(total <= 200, "current slice plus one catch-up should not exceed 200, got {total}");
}

/// Scenario 5: Circuit breaker trip. threshold=3, three consecutive
/// oversized orders trip it; the next (otherwise valid) order is
/// rejected with a `CircuitBreaker` reason, and after the cooldown
/// elapses the breaker closes again on the first approval.
#[test]
fn circuit_breaker_trips_after_threshold_failures_and_recovers_after_cooldown() {
    let limits = RiskLimits { max_order_size: 10, circuit_breaker_threshold: 3, circuit_breaker_cooldown_ms: 60_000, ..RiskLimits::default() };
    let engine = RiskEngine::new(&limits);

    let oversized = RiskCheckRequest { side: Side::Buy, quantity: 1_000, price: 100, position_qty: 0, net_exposure: 0, gross_exposure: 0, orders_today: 0, notional_today: 0, total_pnl: 0 };
    for t in 0..3 {
        assert!(engine.check(&oversized, t).is_err());
    }

    let valid = RiskCheckRequest { quantity: 5, ..oversized };
    let rejection = engine.check(&valid, 3).unwrap_err();
    assert!(rejection.rule_name.starts_with("CircuitBreaker"), "expected CircuitBreaker rejection, got {}", rejection.rule_name);

    let after_cooldown_ns = 61_000 * 1_000_000;
    assert!(engine.check(&valid, after_cooldown_ns).is_ok());
    assert_eq!(engine.circuit_state(), meridian_core::risk::CircuitState::Closed);
}

/// Scenario 6: MeanReversion entry. lookback=20, entryZ=2.0; 20 mids
/// hovering around 150 followed by one deep dip to μ − 3σ triggers a
/// single BUY with the reported Z-score at or below −2.0.
#[test]
fn mean_reversion_enters_long_on_a_deep_negative_z_score() {
    let symbol = aapl();
    let mut strategy = MeanReversion::new(symbol.clone(), MeanReversionParams { lookback_period: 20, entry_z_score: 2.0, exit_z_score: 0.5, max_position_size: 1000 });
    strategy.start();

    let ctx = FakeContext { now_ns: 0, volumes: std::collections::HashMap::new(), submitted: RefCell::new(Vec::new()) };
    let warmup = [
        148_00, 149_00, 150_00, 151_00, 152_00, 149_00, 150_00, 151_00, 150_00, 149_00, 150_00, 151_00, 150_00, 149_00, 150_00, 151_00, 150_00, 149_00, 150_00,
    ];
    for mid in warmup {
        strategy.on_quote(&ctx, &top_of_book(&symbol, mid - 1, mid + 1, 100, 100));
    }
    assert!(ctx.submitted.borrow().is_empty(), "no signal expected before a deep deviation");

    strategy.on_quote(&ctx, &top_of_book(&symbol, 99_99, 100_01, 100, 100));

    let reading = strategy.reading().expect("lookback should be full");
    assert!(reading.z_score <= -2.0, "expected z-score <= -2.0, got {}", reading.z_score);
    let (side, _) = *ctx.submitted.borrow().last().unwrap();
    assert_eq!(side, Side::Buy);
}
