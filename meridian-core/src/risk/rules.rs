//! Standard pre-trade risk rules (§4.4), each a small struct holding
//! its own limit, evaluated against a [`RiskCheckRequest`] snapshot.
//!
//! Grounded on the teacher's `risk/mod.rs::RiskManager::validate_signal`
//! checks (order size / position limits / daily loss), generalized from
//! a handful of inline `if` checks into an ordered, composable
//! `Vec<Box<dyn RiskRule>>` so rules can be added, removed, or
//! reordered without touching the engine itself.

use crate::domain::Side;

/// Inputs a rule needs to decide whether a candidate order is
/// acceptable. Built by the caller (the synchronous submit path) from
/// the position manager's current state and the risk engine's running
/// day counters.
pub struct RiskCheckRequest {
    pub side: Side,
    pub quantity: i64,
    pub price: i64,
    pub position_qty: i64,
    pub net_exposure: i128,
    pub gross_exposure: i128,
    pub orders_today: u32,
    pub notional_today: i128,
    pub total_pnl: i64,
}

impl RiskCheckRequest {
    pub fn order_notional(&self) -> i128 {
        self.quantity as i128 * self.price as i128
    }

    pub fn signed_quantity(&self) -> i64 {
        self.quantity * self.side.sign()
    }

    fn signed_notional(&self) -> i128 {
        self.order_notional() * self.side.sign() as i128
    }
}

/// A single pre-trade check, ordered by ascending [`RiskRule::priority`]
/// (§4.4: "Rules must be evaluated in ascending priority; first
/// rejection short-circuits").
pub trait RiskRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn priority(&self) -> u32;
    /// `Err(reason)` rejects the order with a human-readable reason;
    /// the engine attaches the rule's stable name.
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String>;
}

pub struct MaxDailyLoss {
    pub limit: i64,
}
impl RiskRule for MaxDailyLoss {
    fn name(&self) -> &'static str {
        "MaxDailyLoss"
    }
    fn priority(&self) -> u32 {
        1
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        if req.total_pnl < -self.limit {
            return Err(format!("total P&L {} below -{}", req.total_pnl, self.limit));
        }
        Ok(())
    }
}

pub struct MaxDailyOrders {
    pub limit: u32,
}
impl RiskRule for MaxDailyOrders {
    fn name(&self) -> &'static str {
        "MaxDailyOrders"
    }
    fn priority(&self) -> u32 {
        5
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        if req.orders_today >= self.limit {
            return Err(format!("{} orders already submitted today, limit {}", req.orders_today, self.limit));
        }
        Ok(())
    }
}

pub struct MaxOrderSize {
    pub limit: i64,
}
impl RiskRule for MaxOrderSize {
    fn name(&self) -> &'static str {
        "MaxOrderSize"
    }
    fn priority(&self) -> u32 {
        10
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        if req.quantity > self.limit {
            return Err(format!("order quantity {} exceeds {}", req.quantity, self.limit));
        }
        Ok(())
    }
}

pub struct MaxOrderNotional {
    pub limit: i128,
}
impl RiskRule for MaxOrderNotional {
    fn name(&self) -> &'static str {
        "MaxOrderNotional"
    }
    fn priority(&self) -> u32 {
        11
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        let notional = req.order_notional();
        if notional > self.limit {
            return Err(format!("order notional {} exceeds {}", notional, self.limit));
        }
        Ok(())
    }
}

pub struct MaxPositionSize {
    pub limit: i64,
}
impl RiskRule for MaxPositionSize {
    fn name(&self) -> &'static str {
        "MaxPositionSize"
    }
    fn priority(&self) -> u32 {
        20
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        let projected = req.position_qty + req.signed_quantity();
        if projected.abs() > self.limit {
            return Err(format!("projected position {} exceeds {}", projected, self.limit));
        }
        Ok(())
    }
}

pub struct MaxDailyNotional {
    pub limit: i128,
}
impl RiskRule for MaxDailyNotional {
    fn name(&self) -> &'static str {
        "MaxDailyNotional"
    }
    fn priority(&self) -> u32 {
        30
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        let projected = req.notional_today + req.order_notional();
        if projected > self.limit {
            return Err(format!("notional traded today {} would exceed {}", projected, self.limit));
        }
        Ok(())
    }
}

pub struct MaxNetExposure {
    pub limit: i128,
}
impl RiskRule for MaxNetExposure {
    fn name(&self) -> &'static str {
        "MaxNetExposure"
    }
    fn priority(&self) -> u32 {
        40
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        let projected = (req.net_exposure + req.signed_notional()).abs();
        if projected > self.limit {
            return Err(format!("projected net exposure {} exceeds {}", projected, self.limit));
        }
        Ok(())
    }
}

pub struct MaxGrossExposure {
    pub limit: i128,
}
impl RiskRule for MaxGrossExposure {
    fn name(&self) -> &'static str {
        "MaxGrossExposure"
    }
    fn priority(&self) -> u32 {
        41
    }
    fn evaluate(&self, req: &RiskCheckRequest) -> Result<(), String> {
        let projected = req.gross_exposure + req.order_notional();
        if projected > self.limit {
            return Err(format!("projected gross exposure {} exceeds {}", projected, self.limit));
        }
        Ok(())
    }
}

/// The eight standard rules (§4.4 table) built from [`crate::config::RiskLimits`].
pub fn standard_rules(limits: &crate::config::RiskLimits) -> Vec<Box<dyn RiskRule>> {
    vec![
        Box::new(MaxDailyLoss { limit: limits.max_daily_loss }),
        Box::new(MaxDailyOrders { limit: limits.max_orders_per_day }),
        Box::new(MaxOrderSize { limit: limits.max_order_size }),
        Box::new(MaxOrderNotional { limit: limits.max_order_notional }),
        Box::new(MaxPositionSize { limit: limits.max_position_size }),
        Box::new(MaxDailyNotional { limit: limits.max_daily_notional }),
        Box::new(MaxNetExposure { limit: limits.max_net_exposure }),
        Box::new(MaxGrossExposure { limit: limits.max_gross_exposure }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(quantity: i64, price: i64) -> RiskCheckRequest {
        RiskCheckRequest {
            side: Side::Buy,
            quantity,
            price,
            position_qty: 0,
            net_exposure: 0,
            gross_exposure: 0,
            orders_today: 0,
            notional_today: 0,
            total_pnl: 0,
        }
    }

    #[test]
    fn max_order_size_rejects_oversized_orders() {
        let rule = MaxOrderSize { limit: 100 };
        assert!(rule.evaluate(&req(101, 1)).is_err());
        assert!(rule.evaluate(&req(100, 1)).is_ok());
    }

    #[test]
    fn max_position_size_uses_signed_projection() {
        let rule = MaxPositionSize { limit: 100 };
        let mut r = req(50, 1);
        r.position_qty = 60;
        assert!(rule.evaluate(&r).is_err());
        r.side = Side::Sell;
        assert!(rule.evaluate(&r).is_ok());
    }

    #[test]
    fn standard_rules_are_returned_in_ascending_priority_order() {
        let limits = crate::config::RiskLimits::default();
        let rules = standard_rules(&limits);
        let priorities: Vec<u32> = rules.iter().map(|r| r.priority()).collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable();
        assert_eq!(priorities, sorted);
    }
}
