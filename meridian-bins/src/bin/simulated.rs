//! Runs the engine against an in-memory simulated venue: a synthetic
//! quote feed drives the ring, and a resting VWAP strategy periodically
//! turns quotes into order intents (mirrors the teacher's
//! `*_simulated.rs` convention of a synthetic feed closure driving a
//! single strategy/executor pairing, generalized to the ring-based
//! engine and a [`meridian_core::strategy::Vwap`] instance run on the
//! caller's thread rather than inside a consumer stage).

use anyhow::Result;
use clap::Parser;
use meridian_bins::common::{init_logging, print_status, CommonArgs};
use meridian_core::config::{Config, VwapParams};
use meridian_core::domain::{OrderType, Quote, Side, Symbol, Venue};
use meridian_core::engine::Engine;
use meridian_core::ring::EventPayload;
use meridian_core::strategy::{Strategy, StrategyContext, Vwap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn mono_ns() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1_000, Ordering::Relaxed)
}

fn epoch_ns() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_nanos() as u64
}

/// Hands the engine's synchronous `submit_order` path to the strategy
/// runtime as its [`StrategyContext`] (§4.5).
struct EngineContext<'a> {
    engine: &'a Engine,
}

impl StrategyContext for EngineContext<'_> {
    fn now_ns(&self) -> u64 {
        mono_ns()
    }
    fn latest_quote(&self, _symbol: &Symbol) -> Option<Quote> {
        None
    }
    fn historical_volume(&self, _symbol: &Symbol, _bucket: usize) -> i64 {
        1_000
    }
    fn submit_order(&self, symbol: &Symbol, side: Side, order_type: OrderType, quantity: i64, limit_price: Option<i64>) -> u64 {
        match self.engine.submit_order(symbol.clone(), side, order_type, meridian_core::domain::TimeInForce::Day, quantity, limit_price, None, None) {
            Ok(client_id) => client_id,
            Err(rejection) => {
                tracing::warn!(%rejection, "vwap slice rejected pre-trade");
                0
            }
        }
    }
}

fn main() -> Result<()> {
    let args = CommonArgs::parse();
    init_logging(&args.log_level)?;

    tracing::info!("=== Meridian: Simulated Venue Demo ===");
    tracing::info!(symbol = %args.symbol, ticks = args.ticks, "starting");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let engine = Engine::new(Config::development(), mono_ns, epoch_ns);
    let symbol = Symbol::new(&args.symbol, Venue::Simulated);

    let mut strategy = Vwap::new(
        symbol.clone(),
        Side::Buy,
        VwapParams { target_quantity: 10_000, start_ns: 0, end_ns: args.ticks * 1_000, max_participation_rate: 0.1, limit_price: None, historical_buckets: 1 },
    );
    strategy.start();
    let ctx = EngineContext { engine: &engine };

    let base_bid = 150_00i64;
    for tick in 0..args.ticks {
        if !running.load(Ordering::Relaxed) {
            break;
        }
        let now = mono_ns();
        let wobble = (tick % 20) as i64 - 10;
        let top = Quote {
            symbol: symbol.clone(),
            bid_price: base_bid + wobble,
            ask_price: base_bid + wobble + 2,
            bid_size: 500,
            ask_size: 500,
            received_at: now,
            sequence_number: tick,
            price_scale: 100,
        };
        strategy.on_quote(&ctx, &top);
        engine.publish_quote(EventPayload::QuoteUpdate {
            symbol: top.symbol,
            bid_price: top.bid_price,
            ask_price: top.ask_price,
            bid_size: top.bid_size,
            ask_size: top.ask_size,
            received_at: top.received_at,
            sequence_number: top.sequence_number,
            price_scale: top.price_scale,
        })?;
    }

    std::thread::sleep(std::time::Duration::from_millis(50));
    print_status(&engine.status());
    Ok(())
}
