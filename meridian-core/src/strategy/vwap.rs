//! VWAP execution strategy (§4.5.3): participation-capped execution
//! against a historical volume profile.

use crate::config::VwapParams;
use crate::domain::{OrderType, Quote, Side, Symbol, Trade};
use crate::strategy::{LifecycleState, Strategy, StrategyContext, StrategyKind, StrategyLifecycle};

pub struct Vwap {
    symbol: Symbol,
    side: Side,
    target_quantity: i64,
    start_ns: u64,
    end_ns: u64,
    max_participation_rate: f64,
    limit_price: Option<i64>,
    historical_buckets: usize,
    filled: i64,
    lifecycle: LifecycleState,
}

impl Vwap {
    /// `side` picks the accumulation direction; the spec's recognized
    /// configuration keys (§6) don't carry one because they describe
    /// only magnitude, so this is a constructor-level decision, not a
    /// parsed config field.
    pub fn new(symbol: Symbol, side: Side, params: VwapParams) -> Self {
        Self {
            symbol,
            side,
            target_quantity: params.target_quantity,
            start_ns: params.start_ns,
            end_ns: params.end_ns,
            max_participation_rate: params.max_participation_rate,
            limit_price: params.limit_price,
            historical_buckets: params.historical_buckets.max(1),
            filled: 0,
            lifecycle: LifecycleState::new(),
        }
    }

    pub fn filled(&self) -> i64 {
        self.filled
    }

    fn bucket_index(&self, now_ns: u64) -> usize {
        if self.end_ns <= self.start_ns {
            return 0;
        }
        let span = self.end_ns - self.start_ns;
        let elapsed = now_ns.saturating_sub(self.start_ns).min(span);
        let fraction = elapsed as f64 / span as f64;
        ((fraction * self.historical_buckets as f64) as usize).min(self.historical_buckets - 1)
    }

    fn price_passes_limit(&self, venue_price: i64) -> bool {
        match (self.side, self.limit_price) {
            (Side::Buy, Some(limit)) => venue_price <= limit,
            (Side::Sell, Some(limit)) => venue_price >= limit,
            (_, None) => true,
        }
    }
}

impl Strategy for Vwap {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Vwap
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
        let now = ctx.now_ns();
        if now >= self.end_ns || self.filled >= self.target_quantity {
            self.lifecycle.complete();
            return;
        }
        if now < self.start_ns {
            return;
        }

        let bucket = self.bucket_index(now);
        let total_volume: i64 = (0..self.historical_buckets).map(|b| ctx.historical_volume(&self.symbol, b)).sum();
        if total_volume <= 0 {
            return;
        }
        let volume_through_bucket: i64 = (0..=bucket).map(|b| ctx.historical_volume(&self.symbol, b)).sum();
        let target_at_bucket = self.target_quantity * volume_through_bucket / total_volume;
        let under_fill = target_at_bucket - self.filled;
        if under_fill <= 0 {
            return;
        }

        let (current_liquidity, venue_price) = match self.side {
            Side::Buy => (quote.ask_size, quote.ask_price),
            Side::Sell => (quote.bid_size, quote.bid_price),
        };
        if !self.price_passes_limit(venue_price) {
            return;
        }
        let participation_cap = (self.max_participation_rate * current_liquidity as f64) as i64;
        let slice = under_fill.min(participation_cap).min(self.target_quantity - self.filled);
        if slice <= 0 {
            return;
        }
        ctx.submit_order(&self.symbol, self.side, OrderType::Limit, slice, self.limit_price);
    }

    fn on_fill(&mut self, _ctx: &dyn StrategyContext, trade: &Trade) {
        if trade.symbol == self.symbol {
            self.filled += trade.quantity;
            if self.filled >= self.target_quantity {
                self.lifecycle.complete();
            }
        }
    }

    fn on_timer(&mut self, ctx: &dyn StrategyContext, now_ns: u64) {
        if now_ns >= self.end_ns && self.lifecycle.get().is_operational() {
            self.lifecycle.complete();
        }
        let _ = ctx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Venue;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeContext {
        now_ns: u64,
        volumes: HashMap<usize, i64>,
        submitted: RefCell<Vec<i64>>,
    }

    impl StrategyContext for FakeContext {
        fn now_ns(&self) -> u64 {
            self.now_ns
        }
        fn latest_quote(&self, _symbol: &Symbol) -> Option<Quote> {
            None
        }
        fn historical_volume(&self, _symbol: &Symbol, bucket: usize) -> i64 {
            *self.volumes.get(&bucket).unwrap_or(&0)
        }
        fn submit_order(&self, _symbol: &Symbol, _side: Side, _order_type: OrderType, quantity: i64, _limit_price: Option<i64>) -> u64 {
            self.submitted.borrow_mut().push(quantity);
            1
        }
    }

    #[test]
    fn participation_rate_caps_the_slice() {
        let symbol = Symbol::new("AAPL", Venue::Nasdaq);
        let mut strat = Vwap::new(
            symbol.clone(),
            Side::Buy,
            VwapParams { target_quantity: 1000, start_ns: 0, end_ns: 100, max_participation_rate: 0.25, limit_price: None, historical_buckets: 1 },
        );
        strat.start();
        let ctx = FakeContext { now_ns: 10, volumes: HashMap::from([(0, 1)]), submitted: RefCell::new(Vec::new()) };
        let quote = Quote { symbol: symbol.clone(), bid_price: 100, ask_price: 101, bid_size: 50, ask_size: 100, received_at: 0, sequence_number: 0, price_scale: 100 };
        strat.on_quote(&ctx, &quote);
        let slice = *ctx.submitted.borrow().last().unwrap();
        assert!(slice <= 25, "slice {slice} should not exceed 25% of ask size 100");
    }

    #[test]
    fn completes_once_target_is_filled() {
        let symbol = Symbol::new("AAPL", Venue::Nasdaq);
        let mut strat = Vwap::new(symbol.clone(), Side::Buy, VwapParams { target_quantity: 10, start_ns: 0, end_ns: 100, max_participation_rate: 1.0, limit_price: None, historical_buckets: 1 });
        strat.start();
        let ctx = FakeContext { now_ns: 10, volumes: HashMap::from([(0, 1)]), submitted: RefCell::new(Vec::new()) };
        let trade = Trade { symbol: symbol.clone(), side: Side::Buy, quantity: 10, price: 100, client_order_id: 1, exchange_trade_id: None, executed_at: 1, commission: 0 };
        strat.on_fill(&ctx, &trade);
        assert_eq!(strat.lifecycle(), StrategyLifecycle::Completed);
    }
}
