//! Runtime configuration (§6 "Configuration surface" and the AMBIENT
//! config layer). The teacher loads a Cargo-feature-gated, compile-time
//! `Config` tree (`config/types.rs`) with nested `HuginnConfig` /
//! `ExecutionConfig` sections specific to its market-making deployment;
//! here every risk limit and strategy default is an ordinary runtime
//! field instead (the spec has no feature-gated tiers), but the
//! `serde`-derived struct shape and the named-preset constructor
//! pattern (`config/profiles.rs`) are kept.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ring::WaitStrategy as RingWaitStrategy;

/// Top-level engine configuration (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ring: RingConfig,
    pub risk: RiskLimits,
    pub strategy: StrategyDefaults,
}

impl Config {
    /// Conservative defaults suitable for a live deployment: a large
    /// ring, busy-spin waiting, and tight risk limits.
    pub fn production() -> Self {
        Self {
            ring: RingConfig::default(),
            risk: RiskLimits::default(),
            strategy: StrategyDefaults::default(),
        }
    }

    /// Small ring and park-based waiting so an interactive session
    /// doesn't spin a core at 100%.
    pub fn development() -> Self {
        Self {
            ring: RingConfig {
                capacity: 1024,
                wait_strategy: WaitStrategyKind::Park { millis: 1 },
                blocking: true,
            },
            risk: RiskLimits::default(),
            strategy: StrategyDefaults::default(),
        }
    }

    /// Small non-blocking ring and generous risk limits, for test
    /// harnesses that want deterministic `BufferFull` behaviour instead
    /// of spinning.
    pub fn testing() -> Self {
        Self {
            ring: RingConfig {
                capacity: 64,
                wait_strategy: WaitStrategyKind::BusySpin,
                blocking: false,
            },
            risk: RiskLimits {
                max_order_size: 1_000_000,
                max_order_notional: i128::MAX / 2,
                max_position_size: 1_000_000,
                max_orders_per_day: u32::MAX,
                max_daily_notional: i128::MAX / 2,
                max_daily_loss: i64::MAX / 2,
                max_drawdown_per_position: i64::MAX / 2,
                max_unrealized_loss_per_position: i64::MAX / 2,
                max_net_exposure: i128::MAX / 2,
                max_gross_exposure: i128::MAX / 2,
                circuit_breaker_threshold: u32::MAX,
                circuit_breaker_cooldown_ms: 0,
            },
            strategy: StrategyDefaults::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::production()
    }
}

/// Ring capacity and wait behaviour (§6, §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingConfig {
    pub capacity: usize,
    pub wait_strategy: WaitStrategyKind,
    /// Whether `publish` blocks-and-spins on a full ring (`true`) or
    /// returns `ResourceExhaustion::BufferFull` immediately (`false`).
    pub blocking: bool,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: crate::ring::DEFAULT_CAPACITY,
            wait_strategy: WaitStrategyKind::BusySpin,
            blocking: true,
        }
    }
}

/// Serde-friendly mirror of [`RingWaitStrategy`] (§6:
/// `waitStrategy ∈ {busy_spin, yield, park}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategyKind {
    BusySpin,
    Yield,
    Park { millis: u64 },
}

impl From<WaitStrategyKind> for RingWaitStrategy {
    fn from(kind: WaitStrategyKind) -> Self {
        match kind {
            WaitStrategyKind::BusySpin => RingWaitStrategy::BusySpin,
            WaitStrategyKind::Yield => RingWaitStrategy::Yield,
            WaitStrategyKind::Park { millis } => RingWaitStrategy::Park(Duration::from_millis(millis)),
        }
    }
}

/// Pre-trade risk limits (§4.4, §6). Units follow the symbol's fixed
/// point scale for prices/notionals; quantities and counts are plain
/// integers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_order_size: i64,
    pub max_order_notional: i128,
    pub max_position_size: i64,
    pub max_orders_per_day: u32,
    pub max_daily_notional: i128,
    pub max_daily_loss: i64,
    pub max_drawdown_per_position: i64,
    pub max_unrealized_loss_per_position: i64,
    pub max_net_exposure: i128,
    pub max_gross_exposure: i128,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown_ms: u64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: 10_000,
            max_order_notional: 1_000_000_00,
            max_position_size: 50_000,
            max_orders_per_day: 10_000,
            max_daily_notional: 50_000_000_00,
            max_daily_loss: 100_000_00,
            max_drawdown_per_position: 50_000_00,
            max_unrealized_loss_per_position: 25_000_00,
            max_net_exposure: 5_000_000_00,
            max_gross_exposure: 10_000_000_00,
            circuit_breaker_threshold: 10,
            circuit_breaker_cooldown_ms: 60_000,
        }
    }
}

/// Default per-strategy parameters (§6), overridable per strategy
/// instance via its own `StrategyParameters` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDefaults {
    pub momentum: MomentumParams,
    pub mean_reversion: MeanReversionParams,
    pub vwap: VwapParams,
    pub twap: TwapParams,
}

impl Default for StrategyDefaults {
    fn default() -> Self {
        Self {
            momentum: MomentumParams::default(),
            mean_reversion: MeanReversionParams::default(),
            vwap: VwapParams::default(),
            twap: TwapParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumParams {
    pub short_period: u32,
    pub long_period: u32,
    pub signal_threshold: f64,
    pub max_position_size: i64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self { short_period: 10, long_period: 30, signal_threshold: 0.02, max_position_size: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionParams {
    pub lookback_period: usize,
    pub entry_z_score: f64,
    pub exit_z_score: f64,
    pub max_position_size: i64,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self { lookback_period: 20, entry_z_score: 2.0, exit_z_score: 0.5, max_position_size: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VwapParams {
    pub target_quantity: i64,
    pub start_ns: u64,
    pub end_ns: u64,
    pub max_participation_rate: f64,
    pub limit_price: Option<i64>,
    pub historical_buckets: usize,
}

impl Default for VwapParams {
    fn default() -> Self {
        Self { target_quantity: 0, start_ns: 0, end_ns: 0, max_participation_rate: 0.25, limit_price: None, historical_buckets: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwapParams {
    pub target_quantity: i64,
    pub start_ns: u64,
    pub end_ns: u64,
    pub slice_interval_ns: u64,
    pub max_participation_rate: f64,
    pub limit_price: Option<i64>,
}

impl Default for TwapParams {
    fn default() -> Self {
        Self { target_quantity: 0, start_ns: 0, end_ns: 0, slice_interval_ns: 1_000_000_000, max_participation_rate: 0.25, limit_price: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_uses_the_default_ring_capacity() {
        let cfg = Config::production();
        assert_eq!(cfg.ring.capacity, crate::ring::DEFAULT_CAPACITY);
        assert!(cfg.ring.blocking);
    }

    #[test]
    fn testing_profile_is_non_blocking_with_a_small_ring() {
        let cfg = Config::testing();
        assert_eq!(cfg.ring.capacity, 64);
        assert!(!cfg.ring.blocking);
    }

    #[test]
    fn wait_strategy_kind_converts_into_ring_wait_strategy() {
        let park: RingWaitStrategy = WaitStrategyKind::Park { millis: 5 }.into();
        assert!(matches!(park, RingWaitStrategy::Park(d) if d.as_millis() == 5));
    }

    #[test]
    fn momentum_defaults_match_the_recognized_keys() {
        let d = MomentumParams::default();
        assert_eq!(d.short_period, 10);
        assert_eq!(d.long_period, 30);
        assert_eq!(d.max_position_size, 1000);
    }
}
