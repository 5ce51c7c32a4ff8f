//! Error taxonomy for the trading engine core.
//!
//! Categories mirror the error-handling design: validation failures,
//! risk rejections, transport failures, invariant violations, and
//! resource exhaustion. Each category is its own `thiserror` enum so
//! call sites can match on category without parsing strings.

use crate::domain::Side;
use thiserror::Error;

/// Malformed order intent or invalid state transition request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("order quantity must be positive, got {quantity}")]
    NonPositiveQuantity { quantity: i64 },

    #[error("unknown symbol: {ticker}")]
    UnknownSymbol { ticker: String },

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidStatusTransition { from: String, to: String },
}

/// Structured rejection produced by the pre-trade risk pipeline.
///
/// Carries a stable rule name so callers can alert/aggregate on it without
/// string-matching the human-readable reason.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{rule_name}: {reason}")]
pub struct RiskRejection {
    pub rule_name: String,
    pub reason: String,
}

impl RiskRejection {
    pub fn new(rule_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            reason: reason.into(),
        }
    }

    /// A rule implementation panicked or returned an unexpected failure.
    /// Counts as a circuit-breaker failure like any other rejection.
    pub fn rule_error(rule_name: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::new(rule_name, format!("rule error: {detail}"))
    }
}

/// Adapter/venue transport failures. The core treats the terminal order
/// status as authoritative regardless of which transport error produced it.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection lost to venue {venue}")]
    ConnectionLost { venue: String },

    #[error("timed out waiting for venue {venue} after {millis}ms")]
    Timeout { venue: String, millis: u64 },

    #[error("venue {venue} rejected request: {reason}")]
    VenueRejected { venue: String, reason: String },
}

/// A fatal, unrecoverable state corruption. The handler chain logs,
/// emits an audit ERROR, and disables the risk engine with this reason
/// rather than crashing the process.
#[derive(Debug, Clone, Error)]
pub enum InvariantViolation {
    #[error("filled quantity {filled} exceeds order quantity {quantity} for order {client_id}")]
    FilledExceedsQuantity {
        client_id: u64,
        filled: i64,
        quantity: i64,
    },

    #[error("position sign inversion without crossing zero: old_qty={old_qty} delta={delta}")]
    SignInversionWithoutCrossingZero { old_qty: i64, delta: i64 },

    #[error("position accounting corrupted for {ticker}: {reason}")]
    PositionCorrupted { ticker: String, reason: String },

    #[error("fill side {side:?} inconsistent with order state")]
    InconsistentFillSide { side: Side },
}

/// The ring is full in non-blocking mode, or the object pool is
/// exhausted and had to fall back to a fresh allocation.
#[derive(Debug, Clone, Error)]
pub enum ResourceExhaustion {
    #[error("ring buffer full (capacity {capacity})")]
    BufferFull { capacity: usize },

    #[error("object pool exhausted, falling back to allocation (capacity {capacity})")]
    PoolExhausted { capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_rejection_display() {
        let r = RiskRejection::new("MaxOrderSize", "order.qty 10 > maxOrderSize 5");
        assert_eq!(format!("{r}"), "MaxOrderSize: order.qty 10 > maxOrderSize 5");
    }

    #[test]
    fn rule_error_prefixes_reason() {
        let r = RiskRejection::rule_error("MaxNetExposure", "division by zero");
        assert!(r.reason.starts_with("rule error:"));
    }
}
