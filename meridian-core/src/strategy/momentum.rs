//! Momentum strategy (§4.5.1): per-symbol EMA crossover.

use crate::config::MomentumParams;
use crate::domain::{OrderType, Quote, Side, Symbol, Trade};
use crate::strategy::{LifecycleState, Strategy, StrategyContext, StrategyKind, StrategyLifecycle};

pub struct Momentum {
    symbol: Symbol,
    short_period: u32,
    long_period: u32,
    signal_threshold: f64,
    max_position_size: i64,
    short_ema: Option<f64>,
    long_ema: Option<f64>,
    /// The strategy's own view of its position, built up from fill
    /// notifications only; it never reads the shared position manager
    /// (§4.5: "A strategy must never mutate shared position state
    /// directly").
    position: i64,
    lifecycle: LifecycleState,
}

#[inline]
fn ema_alpha(period: u32) -> f64 {
    2.0 / (period as f64 + 1.0)
}

impl Momentum {
    pub fn new(symbol: Symbol, params: MomentumParams) -> Self {
        Self {
            symbol,
            short_period: params.short_period,
            long_period: params.long_period,
            signal_threshold: params.signal_threshold,
            max_position_size: params.max_position_size,
            short_ema: None,
            long_ema: None,
            position: 0,
            lifecycle: LifecycleState::new(),
        }
    }

    /// `(shortEMA - longEMA) / longEMA`, once both EMAs have a sample.
    pub fn signal(&self) -> Option<f64> {
        match (self.short_ema, self.long_ema) {
            (Some(s), Some(l)) if l != 0.0 => Some((s - l) / l),
            _ => None,
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }
}

impl Strategy for Momentum {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Momentum
    }

    fn lifecycle(&self) -> StrategyLifecycle {
        self.lifecycle.get()
    }

    fn start(&mut self) {
        self.lifecycle.start();
    }
    fn pause(&mut self) {
        self.lifecycle.pause();
    }
    fn resume(&mut self) {
        self.lifecycle.resume();
    }
    fn cancel(&mut self) {
        self.lifecycle.cancel();
    }

    fn on_quote(&mut self, ctx: &dyn StrategyContext, quote: &Quote) {
        if !self.lifecycle.get().is_operational() || quote.symbol != self.symbol {
            return;
        }
        let mid = quote.mid() as f64;
        self.short_ema = Some(match self.short_ema {
            Some(prev) => prev + ema_alpha(self.short_period) * (mid - prev),
            None => mid,
        });
        self.long_ema = Some(match self.long_ema {
            Some(prev) => prev + ema_alpha(self.long_period) * (mid - prev),
            None => mid,
        });

        let Some(signal) = self.signal() else { return };
        if signal.abs() < self.signal_threshold {
            return;
        }
        let target = (signal * self.max_position_size as f64).clamp(-(self.max_position_size as f64), self.max_position_size as f64).round() as i64;
        let gap = target - self.position;
        if gap == 0 {
            return;
        }
        let side = if gap > 0 { Side::Buy } else { Side::Sell };
        ctx.submit_order(&self.symbol, side, OrderType::Market, gap.abs(), None);
    }

    fn on_fill(&mut self, _ctx: &dyn StrategyContext, trade: &Trade) {
        if trade.symbol == self.symbol {
            self.position += trade.quantity * trade.side.sign();
        }
    }

    fn on_timer(&mut self, _ctx: &dyn StrategyContext, _now_ns: u64) {}
}
