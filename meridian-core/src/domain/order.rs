//! Mutable, poolable order record and its status machine.
//!
//! Unlike the typestate order FSM this grew out of, a single `Order` slot
//! is reused across many logical orders over its lifetime (see
//! [`ObjectPool`](crate::pool::ObjectPool)), so the state machine here is a
//! runtime-checked `transition` method rather than a distinct type per
//! status.

use crate::domain::Symbol;
use crate::error::ValidationError;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> u64 {
    NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// +1 for Buy, -1 for Sell. Used throughout P&L sign arithmetic.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderType {
    Market = 0,
    Limit = 1,
    Stop = 2,
    StopLimit = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimeInForce {
    Day = 0,
    Gtc = 1,
    Ioc = 2,
    Fok = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderStatus {
    Pending = 0,
    Submitted = 1,
    Accepted = 2,
    PartiallyFilled = 3,
    Filled = 4,
    Cancelled = 5,
    Rejected = 6,
    Expired = 7,
}

impl OrderStatus {
    /// Terminal statuses never transition again.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }

    /// Statuses the order manager's active-orders view includes.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Submitted
                | OrderStatus::Accepted
                | OrderStatus::PartiallyFilled
        )
    }

    /// Whether `from -> self` is a valid transition per the order status
    /// machine. Transitions not covered here are errors and must be
    /// ignored with a warning by the caller, not panicked on.
    fn reachable_from(self, from: OrderStatus) -> bool {
        use OrderStatus::*;
        if from.is_terminal() {
            return false;
        }
        match (from, self) {
            (Pending, Submitted) | (Pending, Rejected) => true,
            (Submitted, Accepted) | (Submitted, Rejected) => true,
            (Accepted, PartiallyFilled)
            | (Accepted, Filled)
            | (Accepted, Cancelled)
            | (Accepted, Rejected)
            | (Accepted, Expired) => true,
            (PartiallyFilled, PartiallyFilled)
            | (PartiallyFilled, Filled)
            | (PartiallyFilled, Cancelled)
            | (PartiallyFilled, Expired) => true,
            _ => false,
        }
    }
}

/// Mutable, poolable order. `reset` assigns a fresh monotonic client id
/// and clears every field, readying the slot for reuse by a new logical
/// order.
#[derive(Debug, Clone)]
pub struct Order {
    pub client_id: u64,
    pub venue_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub limit_price: Option<i64>,
    pub stop_price: Option<i64>,
    pub quantity: i64,
    pub filled_quantity: i64,
    pub avg_fill_price: i64,
    pub status: OrderStatus,
    pub reject_reason: Option<String>,
    pub strategy_id: Option<u64>,
    /// All timestamps below are monotonic-ns, used for latency metrics only.
    pub created_at: u64,
    pub updated_at: u64,
    pub submitted_at: Option<u64>,
    pub accepted_at: Option<u64>,
    pub first_fill_at: Option<u64>,
}

impl Order {
    pub fn new(
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        quantity: i64,
        now_ns: u64,
    ) -> Self {
        Self {
            client_id: next_client_id(),
            venue_order_id: None,
            symbol,
            side,
            order_type,
            time_in_force,
            limit_price: None,
            stop_price: None,
            quantity,
            filled_quantity: 0,
            avg_fill_price: 0,
            status: OrderStatus::Pending,
            reject_reason: None,
            strategy_id: None,
            created_at: now_ns,
            updated_at: now_ns,
            submitted_at: None,
            accepted_at: None,
            first_fill_at: None,
        }
    }

    #[inline]
    pub fn remaining_quantity(&self) -> i64 {
        self.quantity - self.filled_quantity
    }

    /// Validate and apply a status transition. Transitions not reachable
    /// from the current status return `Err` and leave the order
    /// unchanged; the caller logs a warning and drops the event rather
    /// than propagating a hard failure.
    pub fn transition(&mut self, new_status: OrderStatus, now_ns: u64) -> Result<(), ValidationError> {
        if !new_status.reachable_from(self.status) {
            return Err(ValidationError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{new_status:?}"),
            });
        }
        match (self.status, new_status) {
            (OrderStatus::Pending, OrderStatus::Submitted) => self.submitted_at = Some(now_ns),
            (_, OrderStatus::Accepted) => self.accepted_at = Some(now_ns),
            _ => {}
        }
        self.status = new_status;
        self.updated_at = now_ns;
        Ok(())
    }

    /// Apply a fill, updating the volume-weighted average fill price and
    /// transitioning to FILLED once the cumulative fill reaches quantity,
    /// otherwise PARTIALLY_FILLED.
    pub fn apply_fill(&mut self, fill_qty: i64, fill_price: i64, now_ns: u64) -> Result<(), ValidationError> {
        if self.first_fill_at.is_none() {
            self.first_fill_at = Some(now_ns);
        }
        // Wide intermediate: each term is a quantity*price product that
        // can approach 2^63 at crypto price scales, so the sum is done
        // in i128 before dividing back down to the new filled_quantity.
        let total_notional = self.avg_fill_price as i128 * self.filled_quantity as i128
            + fill_price as i128 * fill_qty as i128;
        self.filled_quantity += fill_qty;
        self.avg_fill_price = if self.filled_quantity > 0 {
            (total_notional / self.filled_quantity as i128) as i64
        } else {
            0
        };
        let target = if self.filled_quantity >= self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition(target, now_ns)
    }

    /// Reset this pool slot for reuse as a new logical order. Assigns a
    /// fresh monotonic client id; every other field is cleared.
    pub fn reset(&mut self, symbol: Symbol, side: Side, order_type: OrderType, time_in_force: TimeInForce, quantity: i64, now_ns: u64) {
        *self = Order::new(symbol, side, order_type, time_in_force, quantity, now_ns);
    }
}

impl Default for Order {
    /// Placeholder slot for pool pre-allocation only; never logically
    /// valid until `reset` assigns real field values.
    fn default() -> Self {
        Self {
            client_id: 0,
            venue_order_id: None,
            symbol: Symbol::new("", crate::domain::symbol::Venue::Simulated),
            side: Side::Buy,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Day,
            limit_price: None,
            stop_price: None,
            quantity: 0,
            filled_quantity: 0,
            avg_fill_price: 0,
            status: OrderStatus::Pending,
            reject_reason: None,
            strategy_id: None,
            created_at: 0,
            updated_at: 0,
            submitted_at: None,
            accepted_at: None,
            first_fill_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::Venue;

    fn test_order() -> Order {
        Order::new(Symbol::new("AAPL", Venue::Nasdaq), Side::Buy, OrderType::Limit, TimeInForce::Day, 100, 1)
    }

    #[test]
    fn client_ids_are_monotonic() {
        let a = test_order();
        let b = test_order();
        assert!(b.client_id > a.client_id);
    }

    #[test]
    fn happy_path_transitions() {
        let mut o = test_order();
        o.transition(OrderStatus::Submitted, 2).unwrap();
        o.transition(OrderStatus::Accepted, 3).unwrap();
        o.apply_fill(40, 150_00, 4).unwrap();
        assert_eq!(o.status, OrderStatus::PartiallyFilled);
        o.apply_fill(60, 151_00, 5).unwrap();
        assert_eq!(o.status, OrderStatus::Filled);
        assert_eq!(o.filled_quantity, 100);
    }

    #[test]
    fn rejects_invalid_transition() {
        let mut o = test_order();
        assert!(o.transition(OrderStatus::Filled, 2).is_err());
        assert_eq!(o.status, OrderStatus::Pending);
    }

    #[test]
    fn terminal_statuses_reject_further_transitions() {
        let mut o = test_order();
        o.transition(OrderStatus::Rejected, 2).unwrap();
        assert!(o.transition(OrderStatus::Submitted, 3).is_err());
    }

    #[test]
    fn vwap_fill_price_is_volume_weighted() {
        let mut o = test_order();
        o.transition(OrderStatus::Submitted, 2).unwrap();
        o.transition(OrderStatus::Accepted, 3).unwrap();
        o.apply_fill(50, 100_00, 4).unwrap();
        o.apply_fill(50, 200_00, 5).unwrap();
        assert_eq!(o.avg_fill_price, 150_00);
    }

    #[test]
    fn reset_assigns_fresh_client_id_and_clears_fields() {
        let mut o = test_order();
        o.transition(OrderStatus::Submitted, 2).unwrap();
        let old_id = o.client_id;
        o.reset(Symbol::new("MSFT", Venue::Nasdaq), Side::Sell, OrderType::Market, TimeInForce::Ioc, 10, 6);
        assert!(o.client_id > old_id);
        assert_eq!(o.status, OrderStatus::Pending);
        assert_eq!(o.filled_quantity, 0);
    }
}
