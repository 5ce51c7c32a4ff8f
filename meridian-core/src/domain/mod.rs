//! Domain model: money/quantity conventions, `Symbol`, `Order`, `Quote`,
//! `Trade`, `Position`.
//!
//! Prices and quantities are integers; a price's minor-unit scale is
//! carried per-symbol (`priceScale`) rather than compiled in, since a
//! stock at 100 (cents) and a crypto pair at 100_000_000 (8 decimals)
//! coexist in the same engine. Timestamps are always integer
//! nanoseconds; monotonic-ns is used for latency measurement, epoch-ns
//! for anything crossing an external boundary, and the two are never
//! mixed in one field.

pub mod fixed_point;
mod order;
mod position;
mod quote;
mod symbol;
mod trade;

pub use order::{Order, OrderStatus, OrderType, Side, TimeInForce};
pub use position::{Position, PositionSnapshot};
pub use quote::Quote;
pub use symbol::{Symbol, Venue};
pub use trade::Trade;
