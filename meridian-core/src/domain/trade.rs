//! Executed-trade record.

use crate::domain::{Side, Symbol};

/// A single execution. `executedAt` is epoch-ns.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: i64,
    pub price: i64,
    pub client_order_id: u64,
    pub exchange_trade_id: Option<String>,
    pub executed_at: u64,
    pub commission: i64,
}
