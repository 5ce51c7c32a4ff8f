//! Order and market-data port contracts (§4.6, §6). These are
//! interfaces only — core ships no venue adapter, only the abstract
//! boundary an adapter must implement.
//!
//! Grounded on the teacher's `execution/mod.rs::Executor` trait shape
//! (`place_order`/`cancel_order`/`get_active_orders`, a listener-style
//! fill pump) and `execution/journal.rs`'s append-only recorder idiom.
//! The teacher's `Executor` is synchronous, not `Future`-returning, and
//! this workspace carries no async runtime dependency, so these ports
//! stay synchronous too; an adapter backed by real network I/O runs its
//! own thread and feeds results back through the listener sink rather
//! than blocking the caller.

use crate::domain::{Order, OrderStatus, Quote, Symbol, Trade};
use crate::error::TransportError;

/// A status change an order port observed out-of-band (e.g. a fill or
/// cancel-ack arriving over a venue's WebSocket), to be translated into
/// a ring event by the adapter.
pub type OrderListener = Box<dyn Fn(&Order, OrderStatus, OrderStatus, u64) + Send + Sync>;

/// Per-venue order routing (§4.6 "Order port").
///
/// The adapter is responsible for translating venue-native prices to
/// the symbol's `priceScale` before handing a [`Quote`] or fill back
/// through a listener.
pub trait OrderPort: Send + Sync {
    fn submit_order(&self, order: &Order) -> Result<(), TransportError>;
    fn cancel_order(&self, client_id: u64) -> Result<(), TransportError>;
    fn modify_order(&self, client_id: u64, new_quantity: i64, new_limit_price: Option<i64>) -> Result<(), TransportError>;
    fn get_order(&self, client_id: u64) -> Option<Order>;
    fn open_orders(&self, symbol: Option<&Symbol>) -> Vec<Order>;
    fn cancel_all(&self, symbol: Option<&Symbol>) -> Result<(), TransportError>;
    fn add_listener(&self, listener: OrderListener);
}

/// A quote or trade pushed by a market-data adapter, to be copied into
/// a ring event by a thin adapter (§4.6 "Market-data port").
pub enum MarketDataEvent {
    Quote(Quote),
    Trade(Trade),
}

pub type MarketDataListener = Box<dyn Fn(&MarketDataEvent) + Send + Sync>;

/// Market-data subscription and snapshot access (§4.6, §6). Quote
/// timestamps must be epoch-ns and scale must match the symbol's
/// `priceScale`.
pub trait MarketDataPort: Send + Sync {
    fn subscribe_quotes(&self, symbol: &Symbol) -> Result<(), TransportError>;
    fn subscribe_trades(&self, symbol: &Symbol) -> Result<(), TransportError>;
    fn unsubscribe(&self, symbol: &Symbol) -> Result<(), TransportError>;
    fn get_quote(&self, symbol: &Symbol) -> Option<Quote>;
    fn get_recent_trades(&self, symbol: &Symbol, limit: usize) -> Vec<Trade>;
    fn add_listener(&self, listener: MarketDataListener);
}
