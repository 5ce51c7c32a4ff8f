//! Strategy runtime (§4.5): a lifecycle state machine, a `Context`
//! capability for non-mutating access to market state and order
//! submission, and the four algorithm bodies.
//!
//! The lifecycle is grounded on the teacher's `core/strategy_fsm.rs`
//! idiom (`INITIALIZED -> RUNNING -> {PAUSED <-> RUNNING} ->
//! {COMPLETED, CANCELLED}`), but re-expressed as a plain runtime enum
//! instead of move-based typestate: this runtime stores heterogeneous
//! strategy kinds behind one `Strategy` trait object and dispatches
//! `on_quote`/`on_fill`/`on_timer` dynamically, which a typestate chain
//! (one type per state, consumed on transition) cannot do.

pub mod mean_reversion;
pub mod momentum;
pub mod twap;
pub mod vwap;

pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;
pub use twap::Twap;
pub use vwap::Vwap;

use crate::domain::{OrderType, Quote, Side, Symbol, Trade};

/// §4.5: "Each strategy is a state machine with states {INITIALIZED,
/// RUNNING, PAUSED, COMPLETED, CANCELLED}."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyLifecycle {
    Initialized,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl StrategyLifecycle {
    /// A strategy in any non-RUNNING state is a no-op for `onQuote` /
    /// `onFill` / `onTimer` (§4.5).
    pub fn is_operational(self) -> bool {
        matches!(self, StrategyLifecycle::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StrategyLifecycle::Completed | StrategyLifecycle::Cancelled)
    }

    fn start(self) -> Self {
        match self {
            StrategyLifecycle::Initialized => StrategyLifecycle::Running,
            other => other,
        }
    }

    fn pause(self) -> Self {
        match self {
            StrategyLifecycle::Running => StrategyLifecycle::Paused,
            other => other,
        }
    }

    fn resume(self) -> Self {
        match self {
            StrategyLifecycle::Paused => StrategyLifecycle::Running,
            other => other,
        }
    }

    fn complete(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            StrategyLifecycle::Completed
        }
    }

    fn cancel(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            StrategyLifecycle::Cancelled
        }
    }
}

/// Which algorithm a [`Strategy`] trait object actually is, for
/// logging/metrics tagging without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Momentum,
    MeanReversion,
    Vwap,
    Twap,
}

/// Capability a strategy uses to observe the world and act on it. A
/// strategy must never mutate shared position state directly (§4.5);
/// every action goes through `submit_order`, which re-enters the engine
/// through the standard risk-checked path.
pub trait StrategyContext {
    fn now_ns(&self) -> u64;
    fn latest_quote(&self, symbol: &Symbol) -> Option<Quote>;
    /// Historical volume for bucket `bucket` of a symbol's volume
    /// profile (VWAP, §4.5.3). Buckets are strategy-profile-defined,
    /// not wall-clock.
    fn historical_volume(&self, symbol: &Symbol, bucket: usize) -> i64;
    /// Submit a marketable or limit order intent. Returns the
    /// newly-assigned client order id.
    fn submit_order(&self, symbol: &Symbol, side: Side, order_type: OrderType, quantity: i64, limit_price: Option<i64>) -> u64;
}

/// Shared behaviour across all four algorithms (§4.5: "Common inputs:
/// quote updates (onQuote), fill notifications (onFill), timer ticks
/// (onTimer)").
pub trait Strategy: Send {
    fn kind(&self) -> StrategyKind;
    fn lifecycle(&self) -> StrategyLifecycle;

    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);

    fn on_quote(&mut self, ctx: &dyn StrategyContext, quote: &Quote);
    fn on_fill(&mut self, ctx: &dyn StrategyContext, trade: &Trade);
    fn on_timer(&mut self, ctx: &dyn StrategyContext, now_ns: u64);
}

/// Shared lifecycle bookkeeping embedded in each algorithm struct,
/// avoiding four copies of the same transition table.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleState(StrategyLifecycle);

impl LifecycleState {
    pub fn new() -> Self {
        Self(StrategyLifecycle::Initialized)
    }

    pub fn get(&self) -> StrategyLifecycle {
        self.0
    }

    pub fn start(&mut self) {
        self.0 = self.0.start();
    }

    pub fn pause(&mut self) {
        self.0 = self.0.pause();
    }

    pub fn resume(&mut self) {
        self.0 = self.0.resume();
    }

    pub fn complete(&mut self) {
        self.0 = self.0.complete();
    }

    pub fn cancel(&mut self) {
        self.0 = self.0.cancel();
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialized_start_makes_it_operational() {
        let mut s = LifecycleState::new();
        assert!(!s.get().is_operational());
        s.start();
        assert!(s.get().is_operational());
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut s = LifecycleState::new();
        s.start();
        s.pause();
        assert!(!s.get().is_operational());
        s.resume();
        assert!(s.get().is_operational());
    }

    #[test]
    fn terminal_states_are_sticky() {
        let mut s = LifecycleState::new();
        s.start();
        s.cancel();
        assert_eq!(s.get(), StrategyLifecycle::Cancelled);
        s.start();
        assert_eq!(s.get(), StrategyLifecycle::Cancelled);
    }
}
