//! Staged handler chain (§2, §4.1, §5): OrderHandler -> PositionHandler
//! -> MetricsHandler, each pinned to one ring consumer stage. Stage
//! `N+1` never observes a sequence before stage `N` has advanced past
//! it (enforced by [`crate::ring::RingBuffer`]).
//!
//! No teacher file runs a staged consumer chain directly; the shape is
//! grounded on the teacher's single-purpose processing units (the
//! `RiskManager`/`execution` split) generalized into a linear pipeline,
//! and each stage's internal bookkeeping reuses `order_manager` /
//! `position_manager` / `metrics` exactly as those modules already do.

pub mod position_manager;

pub use position_manager::PositionManager;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::metrics::EngineMetrics;
use crate::order_manager::OrderManager;
use crate::ring::{EventPayload, HandlerStage, RingBuffer, WaitStrategy};

/// A single consumer stage's processing of one event.
pub trait StageHandler: Send + Sync {
    fn handle(&self, payload: &EventPayload, now_ns: u64);
}

/// Stage 0: translates ring events into [`OrderManager`] state. A
/// `NewOrder` event registers a fresh `Order`; the remaining variants
/// drive its status transitions (§4.2).
pub struct OrderHandler {
    orders: Arc<OrderManager>,
}

impl OrderHandler {
    pub fn new(orders: Arc<OrderManager>) -> Self {
        Self { orders }
    }
}

impl StageHandler for OrderHandler {
    fn handle(&self, payload: &EventPayload, now_ns: u64) {
        use crate::domain::{Order, OrderStatus};
        match payload {
            EventPayload::NewOrder { client_id, symbol, side, order_type, time_in_force, quantity, limit_price, stop_price, strategy_id } => {
                let mut order = Order::new(symbol.clone(), *side, *order_type, *time_in_force, *quantity, now_ns);
                order.client_id = *client_id;
                order.limit_price = *limit_price;
                order.stop_price = *stop_price;
                order.strategy_id = *strategy_id;
                self.orders.register(order);
            }
            EventPayload::OrderAccepted { client_id, venue_order_id, ts_ns } => {
                self.orders.bind_venue_id(*client_id, venue_order_id.clone());
                let _ = self.orders.apply_transition(*client_id, OrderStatus::Accepted, *ts_ns);
            }
            EventPayload::OrderRejected { client_id, ts_ns, .. } => {
                let _ = self.orders.apply_transition(*client_id, OrderStatus::Rejected, *ts_ns);
            }
            EventPayload::OrderFilled { client_id, fill_quantity, fill_price, ts_ns } => {
                let _ = self.orders.apply_fill(*client_id, *fill_quantity, *fill_price, *ts_ns);
            }
            EventPayload::OrderCancelled { client_id, ts_ns } => {
                let _ = self.orders.apply_transition(*client_id, OrderStatus::Cancelled, *ts_ns);
            }
            EventPayload::CancelOrder { .. } | EventPayload::QuoteUpdate { .. } | EventPayload::TradeUpdate(_) | EventPayload::Heartbeat { .. } | EventPayload::Shutdown | EventPayload::Empty => {}
        }
    }
}

/// Stage 1: applies fills to the per-symbol [`PositionManager`] and
/// marks positions on quote/trade updates. Fills carry only a client
/// id, so the order's symbol/side is looked up from [`OrderManager`]
/// (already updated by stage 0, since stage 1 never runs ahead of it).
pub struct PositionHandlerStage {
    orders: Arc<OrderManager>,
    positions: Arc<PositionManager>,
}

impl PositionHandlerStage {
    pub fn new(orders: Arc<OrderManager>, positions: Arc<PositionManager>) -> Self {
        Self { orders, positions }
    }
}

impl StageHandler for PositionHandlerStage {
    fn handle(&self, payload: &EventPayload, _now_ns: u64) {
        match payload {
            EventPayload::OrderFilled { client_id, fill_quantity, fill_price, .. } => {
                if let Some(order) = self.orders.get(*client_id) {
                    let _ = self.positions.apply_fill(&order.symbol, order.side, *fill_quantity, *fill_price);
                }
            }
            EventPayload::QuoteUpdate { symbol, bid_price, ask_price, .. } => {
                let mid = (bid_price + ask_price) / 2;
                self.positions.mark(symbol, mid);
            }
            EventPayload::TradeUpdate(trade) => {
                self.positions.mark(&trade.symbol, trade.price);
            }
            _ => {}
        }
    }
}

/// Stage 2: terminal observer, updates atomic counters and latency
/// histograms only. Never mutates order/position state.
pub struct MetricsHandler {
    metrics: Arc<EngineMetrics>,
}

impl MetricsHandler {
    pub fn new(metrics: Arc<EngineMetrics>) -> Self {
        Self { metrics }
    }
}

impl StageHandler for MetricsHandler {
    fn handle(&self, payload: &EventPayload, now_ns: u64) {
        use std::sync::atomic::Ordering::Relaxed;
        self.metrics.metrics_stage_processed.fetch_add(1, Relaxed);
        match payload {
            EventPayload::OrderAccepted { ts_ns, .. } => {
                self.metrics.orders_accepted.fetch_add(1, Relaxed);
                self.metrics.publish_to_handler_ns.record(now_ns.saturating_sub(*ts_ns));
            }
            EventPayload::OrderRejected { ts_ns, .. } => {
                self.metrics.orders_rejected.fetch_add(1, Relaxed);
                self.metrics.publish_to_handler_ns.record(now_ns.saturating_sub(*ts_ns));
            }
            EventPayload::OrderFilled { ts_ns, .. } => {
                self.metrics.orders_filled.fetch_add(1, Relaxed);
                self.metrics.publish_to_handler_ns.record(now_ns.saturating_sub(*ts_ns));
            }
            EventPayload::OrderCancelled { ts_ns, .. } => {
                self.metrics.orders_cancelled.fetch_add(1, Relaxed);
                self.metrics.publish_to_handler_ns.record(now_ns.saturating_sub(*ts_ns));
            }
            _ => {}
        }
    }
}

/// Spawn a dedicated consumer thread draining ring `stage` with
/// `handler`, stopping once it observes `Shutdown` or `running` is
/// cleared. `now_ns` supplies the monotonic clock for latency
/// accounting so tests can inject a deterministic one.
pub fn spawn_stage(
    ring: Arc<RingBuffer>,
    stage: HandlerStage,
    wait: WaitStrategy,
    handler: Arc<dyn StageHandler>,
    running: Arc<AtomicBool>,
    now_ns: impl Fn() -> u64 + Send + 'static,
) -> JoinHandle<()> {
    let stage_idx = stage.index();
    std::thread::spawn(move || {
        let mut next = ring.next_for_stage(stage_idx);
        while running.load(Ordering::Relaxed) {
            let ceiling = ring.stage_ceiling(stage_idx);
            if next >= ceiling {
                wait.wait_once();
                continue;
            }
            let slot = ring.wait_for(next, &wait);
            let shutdown = matches!(slot.payload, EventPayload::Shutdown);
            handler.handle(&slot.payload, now_ns());
            ring.advance(stage_idx, next);
            next += 1;
            if shutdown {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderType, Side, TimeInForce, Venue};
    use crate::domain::Symbol;
    use crate::ring::EventPayload;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn order_handler_registers_new_order_and_accepts_it() {
        let orders = Arc::new(OrderManager::new());
        let handler = OrderHandler::new(orders.clone());
        let client_id = 7;
        handler.handle(
            &EventPayload::NewOrder {
                client_id,
                symbol: Symbol::new("AAPL", Venue::Nasdaq),
                side: Side::Buy,
                order_type: OrderType::Market,
                time_in_force: TimeInForce::Day,
                quantity: 10,
                limit_price: None,
                stop_price: None,
                strategy_id: None,
            },
            1,
        );
        assert!(orders.get(client_id).is_some());
        handler.handle(&EventPayload::OrderAccepted { client_id, venue_order_id: "V1".into(), ts_ns: 2 }, 2);
        assert_eq!(orders.get(client_id).unwrap().status, crate::domain::OrderStatus::Accepted);
    }

    #[test]
    fn position_handler_applies_fill_looked_up_from_order_manager() {
        let orders = Arc::new(OrderManager::new());
        let positions = Arc::new(PositionManager::new(100));
        let order_handler = OrderHandler::new(orders.clone());
        let position_handler = PositionHandlerStage::new(orders.clone(), positions.clone());
        let client_id = 1;
        let symbol = Symbol::new("AAPL", Venue::Nasdaq);
        order_handler.handle(
            &EventPayload::NewOrder {
                client_id,
                symbol: symbol.clone(),
                side: Side::Buy,
                order_type: OrderType::Market,
                time_in_force: TimeInForce::Day,
                quantity: 10,
                limit_price: None,
                stop_price: None,
                strategy_id: None,
            },
            1,
        );
        order_handler.handle(&EventPayload::OrderAccepted { client_id, venue_order_id: "V1".into(), ts_ns: 2 }, 2);
        let fill = EventPayload::OrderFilled { client_id, fill_quantity: 10, fill_price: 150_00, ts_ns: 3 };
        order_handler.handle(&fill, 3);
        position_handler.handle(&fill, 3);
        assert_eq!(positions.get(&symbol).unwrap().quantity, 10);
    }

    #[test]
    fn metrics_handler_counts_fills_and_records_latency() {
        let metrics = Arc::new(EngineMetrics::new());
        let handler = MetricsHandler::new(metrics.clone());
        handler.handle(&EventPayload::OrderFilled { client_id: 1, fill_quantity: 10, fill_price: 1, ts_ns: 5 }, 10);
        let snap = metrics.snapshot();
        assert_eq!(snap.orders_filled, 1);
        assert_eq!(snap.publish_to_handler.count(), 1);
    }

    #[test]
    fn spawn_stage_processes_events_and_stops_on_shutdown() {
        let ring = Arc::new(RingBuffer::new(8, 1, true));
        let wait = WaitStrategy::BusySpin;
        let metrics = Arc::new(EngineMetrics::new());
        let running = Arc::new(AtomicBool::new(true));
        let counter = AtomicU64::new(0);
        ring.publish(EventPayload::Heartbeat { ts_ns: counter.fetch_add(1, Ordering::Relaxed) }, &wait).unwrap();
        ring.publish(EventPayload::Shutdown, &wait).unwrap();
        let handler: Arc<dyn StageHandler> = Arc::new(MetricsHandler::new(metrics));
        let join = spawn_stage(ring, HandlerStage::Order, wait, handler, running, || 0);
        join.join().unwrap();
    }
}
