//! Meridian Core - Low-Latency Trading Engine Core
//!
//! Meridian is the hard, tightly coupled center of a trading system: a
//! single-writer lock-free event ring feeding a staged handler chain, an
//! order lifecycle and position/P&L engine, a composable pre-trade risk
//! engine with circuit breaker, and an algorithmic strategy runtime
//! (VWAP, TWAP, Momentum, Mean Reversion).
//!
//! ## Architecture
//! - **Zero heap allocations** in the steady-state hot path (pooled Order/Quote)
//! - **Cache-line aligned** event slots and position state
//! - **Lock-free** ring buffer with a busy-spin wait strategy
//! - **Synchronous risk check** happens-before every ring publish of an order intent
//!
//! ## Core Modules
//! - `domain`: money/quantity types, `Symbol`, `Order`, `Quote`, `Trade`, `Position`
//! - `pool`: lock-free object pool for poolable domain types
//! - `ring`: the event ring buffer and its wait strategy
//! - `handlers`: the OrderHandler -> PositionHandler -> MetricsHandler chain
//! - `order_manager`: live order registry and status transitions
//! - `risk`: ordered rule pipeline and circuit breaker
//! - `strategy`: strategy lifecycle and the four algorithm bodies
//! - `ports`: order/market-data port contracts (interfaces only)
//! - `persistence`: journal/audit/snapshot contracts (interfaces only)
//! - `metrics`: atomic counters and latency histograms
//! - `config`: recognized runtime configuration surface

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod order_manager;
pub mod persistence;
pub mod pool;
pub mod ports;
pub mod ring;
pub mod risk;
pub mod strategy;

pub use domain::{fixed_point, Order, OrderStatus, OrderType, Position, Quote, Side, Symbol, Trade, TimeInForce};
pub use engine::Engine;
pub use error::{InvariantViolation, ResourceExhaustion, RiskRejection, TransportError, ValidationError};

/// Re-exported error types for application-level call sites.
pub use anyhow::{Error, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::domain::{fixed_point, Order, OrderStatus, OrderType, Position, Quote, Side, Symbol, Trade};
    pub use crate::engine::Engine;
    pub use crate::pool::{ObjectPool, PoolGuard};
    pub use crate::ring::{EventSlot, RingBuffer, WaitStrategy};
    pub use crate::{Error, Result};
}
