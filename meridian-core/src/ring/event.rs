//! Tagged-union event payload and the slot that carries it through the ring.
//!
//! Ring slots hold value copies of the relevant fields, never references
//! into a pooled `Order`/`Quote` (§9 design note) — a producer releases
//! its pool guard immediately after publishing.

use crate::domain::{OrderType, Side, Symbol, TimeInForce, Trade};

/// One entry in the tagged union of event kinds the ring carries.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Placeholder occupying a freshly allocated or just-consumed slot.
    Empty,
    NewOrder {
        client_id: u64,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        quantity: i64,
        limit_price: Option<i64>,
        stop_price: Option<i64>,
        strategy_id: Option<u64>,
    },
    CancelOrder {
        client_id: u64,
    },
    OrderAccepted {
        client_id: u64,
        venue_order_id: String,
        ts_ns: u64,
    },
    OrderRejected {
        client_id: u64,
        reason: String,
        ts_ns: u64,
    },
    /// Partial or full fill.
    OrderFilled {
        client_id: u64,
        fill_quantity: i64,
        fill_price: i64,
        ts_ns: u64,
    },
    OrderCancelled {
        client_id: u64,
        ts_ns: u64,
    },
    QuoteUpdate {
        symbol: Symbol,
        bid_price: i64,
        ask_price: i64,
        bid_size: i64,
        ask_size: i64,
        received_at: u64,
        sequence_number: u64,
        price_scale: i64,
    },
    TradeUpdate(Trade),
    Heartbeat {
        ts_ns: u64,
    },
    Shutdown,
}

impl Default for EventPayload {
    fn default() -> Self {
        EventPayload::Empty
    }
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Empty => "EMPTY",
            EventPayload::NewOrder { .. } => "NEW_ORDER",
            EventPayload::CancelOrder { .. } => "CANCEL_ORDER",
            EventPayload::OrderAccepted { .. } => "ORDER_ACCEPTED",
            EventPayload::OrderRejected { .. } => "ORDER_REJECTED",
            EventPayload::OrderFilled { .. } => "ORDER_FILLED",
            EventPayload::OrderCancelled { .. } => "ORDER_CANCELLED",
            EventPayload::QuoteUpdate { .. } => "QUOTE_UPDATE",
            EventPayload::TradeUpdate(_) => "TRADE_UPDATE",
            EventPayload::Heartbeat { .. } => "HEARTBEAT",
            EventPayload::Shutdown => "SHUTDOWN",
        }
    }
}

/// A single ring slot: the claimed sequence plus its payload. Overwritten
/// in place on every claim — the ring never allocates in steady state.
#[derive(Debug, Clone, Default)]
pub struct EventSlot {
    pub sequence: u64,
    pub payload: EventPayload,
}
