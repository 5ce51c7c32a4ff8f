//! Composable pre-trade risk engine with circuit breaker (§4.4).
//!
//! The synchronous check runs on the submit path, before a NEW_ORDER
//! event is published (§5: "The risk check for a NEW_ORDER
//! happens-before its publish"), so a rejection never reaches the ring
//! and can never corrupt downstream handler state.

pub mod circuit_breaker;
pub mod rules;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rules::{standard_rules, RiskCheckRequest, RiskRule};

use parking_lot::Mutex;

use crate::config::RiskLimits;
use crate::error::RiskRejection;

#[derive(Debug, Default, Clone, Copy)]
struct DailyCounters {
    orders_today: u32,
    notional_today: i128,
}

/// Ordered rule pipeline plus circuit breaker. `Vec<Box<dyn RiskRule>>`
/// generalizes the teacher's handful of inline `RiskManager` checks
/// (`risk/mod.rs::validate_signal`) into a pipeline rules can be added
/// to or reordered without touching this engine.
pub struct RiskEngine {
    rules: Vec<Box<dyn RiskRule>>,
    breaker: Mutex<CircuitBreaker>,
    daily: Mutex<DailyCounters>,
    listeners: parking_lot::RwLock<Vec<Box<dyn Fn(&RiskCheckRequest, bool) + Send + Sync>>>,
}

impl RiskEngine {
    pub fn new(limits: &RiskLimits) -> Self {
        let mut rules = standard_rules(limits);
        rules.sort_by_key(|r| r.priority());
        Self {
            rules,
            breaker: Mutex::new(CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: limits.circuit_breaker_threshold,
                cooldown_ms: limits.circuit_breaker_cooldown_ms,
            })),
            daily: Mutex::new(DailyCounters::default()),
            listeners: parking_lot::RwLock::new(Vec::new()),
        }
    }

    /// Evaluate `req` against every rule in ascending priority order,
    /// short-circuiting on the first rejection (§4.4). On approval,
    /// increments `ordersSubmittedToday` and notifies listeners.
    pub fn check(&self, req: &RiskCheckRequest, now_ns: u64) -> Result<(), RiskRejection> {
        {
            let mut breaker = self.breaker.lock();
            if !breaker.is_call_permitted(now_ns) {
                return Err(RiskRejection::new("CircuitBreaker", "open"));
            }
        }

        for rule in &self.rules {
            match rule.evaluate(req) {
                Ok(()) => continue,
                Err(reason) => {
                    self.breaker.lock().record_failure(now_ns);
                    self.notify(req, false);
                    return Err(RiskRejection::new(rule.name(), reason));
                }
            }
        }

        self.breaker.lock().record_success();
        {
            let mut daily = self.daily.lock();
            daily.orders_today += 1;
        }
        self.notify(req, true);
        Ok(())
    }

    /// §4.4: "On every recorded fill it increments `notionalTradedToday`
    /// by `fillQty × fillPrice`."
    pub fn record_fill(&self, fill_qty: i64, fill_price: i64) {
        let mut daily = self.daily.lock();
        daily.notional_today += fill_qty as i128 * fill_price as i128;
    }

    /// Zeroes all day counters and per-symbol rule state; positions are
    /// untouched (§4.4).
    pub fn reset_daily_counters(&self) {
        *self.daily.lock() = DailyCounters::default();
    }

    pub fn orders_today(&self) -> u32 {
        self.daily.lock().orders_today
    }

    pub fn notional_today(&self) -> i128 {
        self.daily.lock().notional_today
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.lock().state()
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&RiskCheckRequest, bool) + Send + Sync + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    fn notify(&self, req: &RiskCheckRequest, approved: bool) {
        for listener in self.listeners.read().iter() {
            listener(req, approved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;

    fn base_request() -> RiskCheckRequest {
        RiskCheckRequest {
            side: Side::Buy,
            quantity: 10,
            price: 100_00,
            position_qty: 0,
            net_exposure: 0,
            gross_exposure: 0,
            orders_today: 0,
            notional_today: 0,
            total_pnl: 0,
        }
    }

    #[test]
    fn valid_order_is_approved_and_counted() {
        let engine = RiskEngine::new(&RiskLimits::default());
        engine.check(&base_request(), 0).unwrap();
        assert_eq!(engine.orders_today(), 1);
    }

    #[test]
    fn oversized_order_is_rejected_with_rule_name() {
        let limits = RiskLimits { max_order_size: 5, ..RiskLimits::default() };
        let engine = RiskEngine::new(&limits);
        let err = engine.check(&base_request(), 0).unwrap_err();
        assert_eq!(err.rule_name, "MaxOrderSize");
    }

    #[test]
    fn circuit_breaker_trips_after_threshold_rejections() {
        let limits = RiskLimits { max_order_size: 1, circuit_breaker_threshold: 3, circuit_breaker_cooldown_ms: 60_000, ..RiskLimits::default() };
        let engine = RiskEngine::new(&limits);
        for _ in 0..3 {
            assert!(engine.check(&base_request(), 0).is_err());
        }
        let err = engine.check(&base_request(), 0).unwrap_err();
        assert_eq!(err.rule_name, "CircuitBreaker");
        assert_eq!(engine.circuit_state(), CircuitState::Open);
    }

    #[test]
    fn circuit_breaker_recovers_after_cooldown_on_valid_order() {
        let limits = RiskLimits { max_order_size: 1, circuit_breaker_threshold: 1, circuit_breaker_cooldown_ms: 1, ..RiskLimits::default() };
        let engine = RiskEngine::new(&limits);
        assert!(engine.check(&base_request(), 0).is_err());
        assert_eq!(engine.circuit_state(), CircuitState::Open);
        let mut ok_request = base_request();
        ok_request.quantity = 1;
        engine.check(&ok_request, 2_000_000).unwrap();
        assert_eq!(engine.circuit_state(), CircuitState::Closed);
    }

    #[test]
    fn reset_daily_counters_zeroes_without_touching_positions() {
        let engine = RiskEngine::new(&RiskLimits::default());
        engine.check(&base_request(), 0).unwrap();
        engine.record_fill(10, 100_00);
        engine.reset_daily_counters();
        assert_eq!(engine.orders_today(), 0);
        assert_eq!(engine.notional_today(), 0);
    }
}
