//! The trading engine aggregate (§9 design note: "lifting global
//! singletons into a single `Engine` aggregate with one-shot
//! drop-based shutdown").
//!
//! No teacher file assembles this particular singleton set, but the
//! shape — own the long-lived state, expose a narrow surface for
//! submitting intents and reading status, tear everything down once on
//! `Drop` — is grounded on `engine/generic::Engine`'s
//! `new/shutdown_signal/shutdown/stats` idiom, and the per-stage thread
//! pinning reuses the teacher's `perf/cpu.rs::pin_to_core` pattern over
//! its `core_affinity` dependency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use core_affinity::CoreId;

use crate::config::Config;
use crate::domain::{Order, OrderType, Side, Symbol, TimeInForce};
use crate::error::{ResourceExhaustion, RiskRejection};
use crate::handlers::{MetricsHandler, OrderHandler, PositionHandlerStage, PositionManager, StageHandler};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::order_manager::OrderManager;
use crate::persistence::{AuditCategory, AuditEvent, AuditLog, AuditSeverity, InMemoryAuditLog};
use crate::ring::{EventPayload, HandlerStage, RingBuffer, WaitStrategy};
use crate::risk::{CircuitState, RiskCheckRequest, RiskEngine};

mod cpu {
    use core_affinity::CoreId;

    /// Pin the current thread to `core`, logging rather than failing if
    /// the platform or core index refuses (matches the teacher's
    /// `perf/cpu.rs::pin_to_core`, minus the `anyhow` bail since a
    /// consumer thread pinning failure should degrade, not crash).
    pub fn pin_to_core(core: CoreId) {
        if core_affinity::set_for_current(core) {
            tracing::info!(core = core.id, "pinned consumer thread to core");
        } else {
            tracing::warn!(core = core.id, "failed to pin consumer thread, continuing unpinned");
        }
    }
}

/// A point-in-time read of engine health, combining fields the
/// distilled design note asked for verbatim (uptime, start time) with
/// the richer snapshot the "fuller contract" resolution favoured.
///
/// Timestamps follow this crate's convention of nanosecond epoch/
/// monotonic clocks rather than milliseconds (§3's `[AMBIENT]` clock
/// note); `DESIGN.md` records this as a deliberate unit substitution of
/// the distilled wording's "millis" fields, not a dropped field.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub running: bool,
    pub start_time_epoch_ns: u64,
    pub uptime_ns: u64,
    pub orders_registered: u64,
    pub circuit_state: CircuitState,
    pub metrics: MetricsSnapshot,
}

/// Owns every long-lived piece of engine state: the ring, the order
/// and position registries, the risk engine, metrics, and the three
/// pinned consumer threads. Dropping an `Engine` shuts it down exactly
/// once.
pub struct Engine {
    ring: Arc<RingBuffer>,
    orders: Arc<OrderManager>,
    positions: Arc<PositionManager>,
    risk: Arc<RiskEngine>,
    metrics: Arc<EngineMetrics>,
    audit: Arc<dyn AuditLog>,
    wait: WaitStrategy,
    running: Arc<AtomicBool>,
    stages: Vec<JoinHandle<()>>,
    start_time_epoch_ns: u64,
    now_mono_ns: fn() -> u64,
}

impl Engine {
    /// Wires the ring, registries, risk engine and metrics from
    /// `config`, then spawns the three pinned consumer threads
    /// (Order -> Position -> Metrics, §2, §5). `now_mono_ns` and
    /// `now_epoch_ns` are plain function pointers rather than boxed
    /// closures so each stage thread gets its own cheap copy, and so
    /// tests can inject a deterministic clock.
    pub fn new(config: Config, now_mono_ns: fn() -> u64, now_epoch_ns: fn() -> u64) -> Self {
        let ring = Arc::new(RingBuffer::new(config.ring.capacity, 3, config.ring.blocking));
        let orders = Arc::new(OrderManager::new());
        let positions = Arc::new(PositionManager::new(100));
        let risk = Arc::new(RiskEngine::new(&config.risk));
        let metrics = Arc::new(EngineMetrics::new());
        let audit: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::default());
        let wait: WaitStrategy = config.ring.wait_strategy.into();
        let running = Arc::new(AtomicBool::new(true));

        let core_ids = core_affinity::get_core_ids().unwrap_or_default();
        let mut core_ids = core_ids.into_iter();
        let mut next_core = move || core_ids.next();

        let order_handler = Arc::new(OrderHandler::new(orders.clone()));
        let position_handler = Arc::new(PositionHandlerStage::new(orders.clone(), positions.clone()));
        let metrics_handler = Arc::new(MetricsHandler::new(metrics.clone()));

        let stages = vec![
            Self::spawn_pinned(ring.clone(), HandlerStage::Order, wait, order_handler, running.clone(), now_mono_ns, next_core()),
            Self::spawn_pinned(ring.clone(), HandlerStage::Position, wait, position_handler, running.clone(), now_mono_ns, next_core()),
            Self::spawn_pinned(ring.clone(), HandlerStage::Metrics, wait, metrics_handler, running.clone(), now_mono_ns, next_core()),
        ];

        Self {
            ring,
            orders,
            positions,
            risk,
            metrics,
            audit,
            wait,
            running,
            stages,
            start_time_epoch_ns: now_epoch_ns(),
            now_mono_ns,
        }
    }

    fn spawn_pinned(
        ring: Arc<RingBuffer>,
        stage: HandlerStage,
        wait: WaitStrategy,
        handler: Arc<dyn StageHandler>,
        running: Arc<AtomicBool>,
        now_ns: fn() -> u64,
        core: Option<CoreId>,
    ) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name(format!("meridian-{:?}", stage).to_lowercase())
            .spawn(move || {
                if let Some(core) = core {
                    cpu::pin_to_core(core);
                }
                spawn_stage_inline(ring, stage, wait, handler, running, now_ns);
            })
            .expect("failed to spawn consumer stage thread")
    }

    pub fn orders(&self) -> &Arc<OrderManager> {
        &self.orders
    }

    pub fn positions(&self) -> &Arc<PositionManager> {
        &self.positions
    }

    pub fn risk(&self) -> &Arc<RiskEngine> {
        &self.risk
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn audit(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    /// Runs the synchronous pre-trade risk check against the current
    /// position/exposure/daily-counter state, and on approval publishes
    /// a `NewOrder` event. Never publishes on rejection (§4.4: "the
    /// pre-trade check is synchronous and runs before the NEW_ORDER
    /// event is published to the ring").
    #[allow(clippy::too_many_arguments)]
    pub fn submit_order(
        &self,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        quantity: i64,
        limit_price: Option<i64>,
        stop_price: Option<i64>,
        strategy_id: Option<u64>,
    ) -> Result<u64, RiskRejection> {
        let now_ns = (self.now_mono_ns)();
        let position_qty = self.positions.get(&symbol).map(|p| p.quantity).unwrap_or(0);
        let snapshot = self.positions.snapshot();
        let price = limit_price.or(stop_price).unwrap_or(0);

        let req = RiskCheckRequest {
            side,
            quantity,
            price,
            position_qty,
            net_exposure: snapshot.net_exposure as i128,
            gross_exposure: snapshot.gross_exposure as i128,
            orders_today: self.risk.orders_today(),
            notional_today: self.risk.notional_today(),
            total_pnl: snapshot.realized_pnl + snapshot.unrealized_pnl,
        };

        self.risk.check(&req, now_ns).map_err(|rejection| {
            self.audit.record(AuditEvent {
                epoch_ns: now_ns,
                category: AuditCategory::Risk,
                severity: AuditSeverity::Warning,
                message: format!("order rejected pre-trade: {rejection}"),
                details: None,
            });
            rejection
        })?;

        let order = Order::new(symbol.clone(), side, order_type, time_in_force, quantity, now_ns);
        let client_id = order.client_id;

        self.ring
            .publish(
                EventPayload::NewOrder {
                    client_id,
                    symbol,
                    side,
                    order_type,
                    time_in_force,
                    quantity,
                    limit_price,
                    stop_price,
                    strategy_id,
                },
                &self.wait,
            )
            .map_err(|e: ResourceExhaustion| RiskRejection::new("RingCapacity", e.to_string()))?;

        Ok(client_id)
    }

    /// Publishes a `CancelOrder` intent; cancellation is cooperative
    /// and may race with an in-flight fill (§5).
    pub fn cancel_order(&self, client_id: u64) -> Result<(), ResourceExhaustion> {
        self.ring.publish(EventPayload::CancelOrder { client_id }, &self.wait)?;
        Ok(())
    }

    pub fn publish_quote(&self, payload: EventPayload) -> Result<(), ResourceExhaustion> {
        debug_assert!(matches!(payload, EventPayload::QuoteUpdate { .. }));
        self.ring.publish(payload, &self.wait)?;
        Ok(())
    }

    pub fn publish_trade(&self, payload: EventPayload) -> Result<(), ResourceExhaustion> {
        debug_assert!(matches!(payload, EventPayload::TradeUpdate(_)));
        self.ring.publish(payload, &self.wait)?;
        Ok(())
    }

    pub fn status(&self) -> EngineStatus {
        let now = (self.now_mono_ns)();
        EngineStatus {
            running: self.running.load(Ordering::Relaxed),
            start_time_epoch_ns: self.start_time_epoch_ns,
            uptime_ns: now.saturating_sub(self.start_time_epoch_ns),
            orders_registered: self.orders.registered_count(),
            circuit_state: self.risk.circuit_state(),
            metrics: self.metrics.snapshot(),
        }
    }

    /// One-shot shutdown: publishes a single `Shutdown` event (every
    /// stage observes the same sequence independently, so one event
    /// suffices to stop all three) and joins the consumer threads.
    /// Idempotent; a second call is a no-op.
    pub fn shutdown(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.ring.publish(EventPayload::Shutdown, &self.wait);
        for handle in self.stages.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Re-implements `handlers::spawn_stage`'s drain loop inline so the
/// pinning call happens on the same thread before the loop starts;
/// calling `handlers::spawn_stage` here would spawn a second thread and
/// pin the wrong one.
fn spawn_stage_inline(
    ring: Arc<RingBuffer>,
    stage: HandlerStage,
    wait: WaitStrategy,
    handler: Arc<dyn StageHandler>,
    running: Arc<AtomicBool>,
    now_ns: fn() -> u64,
) {
    let stage_idx = stage.index();
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Venue;

    fn mono_ns() -> u64 {
        use std::sync::atomic::AtomicU64;
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    fn epoch_ns() -> u64 {
        1_700_000_000_000_000_000
    }

    #[test]
    fn submit_order_registers_and_publishes() {
        let mut engine = Engine::new(Config::testing(), mono_ns, epoch_ns);
        let symbol = Symbol::new("AAPL", Venue::Nasdaq);
        let client_id = engine
            .submit_order(symbol, Side::Buy, OrderType::Market, TimeInForce::Day, 10, None, None, None)
            .expect("risk check should pass under generous testing limits");
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(engine.orders().get(client_id).is_some());
        engine.shutdown();
    }

    #[test]
    fn status_reports_running_until_shutdown() {
        let mut engine = Engine::new(Config::testing(), mono_ns, epoch_ns);
        assert!(engine.status().running);
        engine.shutdown();
        assert!(!engine.status().running);
    }

    #[test]
    fn oversized_order_is_rejected_before_publish() {
        let mut config = Config::testing();
        config.risk.max_order_size = 1;
        let mut engine = Engine::new(config, mono_ns, epoch_ns);
        let symbol = Symbol::new("AAPL", Venue::Nasdaq);
        let result = engine.submit_order(symbol, Side::Buy, OrderType::Market, TimeInForce::Day, 100, None, None, None);
        assert!(result.is_err());
        engine.shutdown();
    }
}
