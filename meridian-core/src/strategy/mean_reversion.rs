//! Mean reversion strategy (§4.5.2): rolling Z-score entry/exit over a
//! fixed lookback of mid prices.

use std::collections::VecDeque;

use crate::config::MeanReversionParams;
use crate::domain::{OrderType, Quote, Side, Symbol, Trade};
use crate::strategy::{LifecycleState, Strategy, StrategyContext, StrategyKind, StrategyLifecycle};

pub struct MeanReversion {
    symbol: Symbol,
    lookback_period: usize,
    entry_z_score: f64,
    exit_z_score: f64,
    max_position_size: i64,
    history: VecDeque<i64>,
    position: i64,
    lifecycle: LifecycleState,
}

/// Rolling mean/sample-stddev pair, plus the Z-score of the latest
/// sample and the visualization bands (§4.5.2: "Upper/lower bands
/// exposed for visualization = mean ± entryZ·stddev").
#[derive(Debug, Clone, Copy)]
pub struct ZScoreReading {
    pub mean: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub upper_band: f64,
    pub lower_band: f64,
}

impl MeanReversion {
    pub fn new(symbol: Symbol, params: MeanReversionParams) -> Self {
        Self {
            symbol,
            lookback_period: params.lookback_period,
            entry_z_score: params.entry_z_score,
            exit_z_score: params.exit_z_score,
            max_position_size: params.max_position_size,
            history: VecDeque::with_capacity(params.lookback_period),
            position: 0,
            lifecycle: LifecycleState::new(),
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    /// `None` until `lookback_period` samples have accumulated, or if
    /// the sample standard deviation is zero (§4.5.2).
    pub fn reading(&self) -> Option<ZScoreReading> {
        if self.history.len() < self.lookback_period {
            return None;
        }
        let n = self.history.len() as f64;
        let mean = self.history.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = self.history.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
        let std_dev = variance.sqrt();
        if std_dev == 0.0 {
            return None;
        }
        let latest = *self.history.back().unwrap() as f64;
        let z_score = (latest - mean) / std_dev;
        Some(ZScoreReading {
            mean,
            std_dev,
            z_score,
            upper_band: mean + self.entry_z_score * std_dev,
            lower_band: mean - self.entry_z_score * std_dev,
        })
    }

    fn push_sample(&mut self, mid: i64) {
        if self.history.len() == self.lookback_period {
            self.history.pop_front();
        }
        self.history.push_back(mid);
    }
}

impl Strategy for MeanReversion {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MeanReversion
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
        self.push_sample(quote.mid());
        let Some(reading) = self.reading() else { return };

        if self.position != 0 && reading.z_score.abs() <= self.exit_z_score {
            let side = if self.position > 0 { Side::Sell } else { Side::Buy };
            ctx.submit_order(&self.symbol, side, OrderType::Market, self.position.abs(), None);
            return;
        }

        if reading.z_score <= -self.entry_z_score {
            let gap = self.max_position_size - self.position;
            if gap > 0 {
                ctx.submit_order(&self.symbol, Side::Buy, OrderType::Market, gap, None);
            }
        } else if reading.z_score >= self.entry_z_score {
            let gap = -self.max_position_size - self.position;
            if gap < 0 {
                ctx.submit_order(&self.symbol, Side::Sell, OrderType::Market, gap.abs(), None);
            }
        }
    }

    fn on_fill(&mut self, _ctx: &dyn StrategyContext, trade: &Trade) {
        if trade.symbol == self.symbol {
            self.position += trade.quantity * trade.side.sign();
        }
    }

    fn on_timer(&mut self, _ctx: &dyn StrategyContext, _now_ns: u64) {}
}
