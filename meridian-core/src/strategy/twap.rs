//! TWAP execution strategy (§4.5.4): uniform time slicing with
//! catch-up when prior slices under-delivered.

use crate::config::TwapParams;
use crate::domain::{OrderType, Quote, Side, Symbol, Trade};
use crate::strategy::{LifecycleState, Strategy, StrategyContext, StrategyKind, StrategyLifecycle};

pub struct Twap {
    symbol: Symbol,
    side: Side,
    target_quantity: i64,
    start_ns: u64,
    end_ns: u64,
    slice_interval_ns: u64,
    max_participation_rate: f64,
    limit_price: Option<i64>,
    filled: i64,
    lifecycle: LifecycleState,
}

impl Twap {
    pub fn new(symbol: Symbol, side: Side, params: TwapParams) -> Self {
        Self {
            symbol,
            side,
            target_quantity: params.target_quantity,
            start_ns: params.start_ns,
            end_ns: params.end_ns,
            slice_interval_ns: params.slice_interval_ns.max(1),
            max_participation_rate: params.max_participation_rate,
            limit_price: params.limit_price,
            filled: 0,
            lifecycle: LifecycleState::new(),
        }
    }

    pub fn filled(&self) -> i64 {
        self.filled
    }

    fn slice_count(&self) -> i64 {
        if self.end_ns <= self.start_ns {
            return 1;
        }
        let span = self.end_ns - self.start_ns;
        ((span + self.slice_interval_ns - 1) / self.slice_interval_ns) as i64
    }

    fn slice_target(&self) -> i64 {
        let n = self.slice_count().max(1);
        self.target_quantity / n
    }

    /// How many whole slices have elapsed at `now`, i.e. how much
    /// cumulative target prior slices would already have delivered
    /// (§4.5.4: "if under target for the current slice by more than
    /// what prior slices would have provided, catch up").
    fn elapsed_target(&self, now_ns: u64) -> i64 {
        if now_ns <= self.start_ns {
            return 0;
        }
        let elapsed_slices = (now_ns - self.start_ns) / self.slice_interval_ns + 1;
        (elapsed_slices as i64 * self.slice_target()).min(self.target_quantity)
    }

    fn price_passes_limit(&self, venue_price: i64) -> bool {
        match (self.side, self.limit_price) {
            (Side::Buy, Some(limit)) => venue_price <= limit,
            (Side::Sell, Some(limit)) => venue_price >= limit,
            (_, None) => true,
        }
    }
}

impl Strategy for Twap {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Twap
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

        let under_fill = self.elapsed_target(now) - self.filled;
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

    struct FakeContext {
        now_ns: u64,
        submitted: RefCell<Vec<i64>>,
    }

    impl StrategyContext for FakeContext {
        fn now_ns(&self) -> u64 {
            self.now_ns
        }
        fn latest_quote(&self, _symbol: &Symbol) -> Option<Quote> {
            None
        }
        fn historical_volume(&self, _symbol: &Symbol, _bucket: usize) -> i64 {
            0
        }
        fn submit_order(&self, _symbol: &Symbol, _side: Side, _order_type: OrderType, quantity: i64, _limit_price: Option<i64>) -> u64 {
            self.submitted.borrow_mut().push(quantity);
            1
        }
    }

    fn quote(symbol: &Symbol) -> Quote {
        Quote { symbol: symbol.clone(), bid_price: 99, ask_price: 101, bid_size: 1000, ask_size: 1000, received_at: 0, sequence_number: 0, price_scale: 100 }
    }

    #[test]
    fn catches_up_after_a_zero_fill_slice() {
        let symbol = Symbol::new("AAPL", Venue::Nasdaq);
        // 10 slices of 100 ns over 1000 ns target, 1000 total quantity -> 100 per slice.
        let mut strat = Twap::new(
            symbol.clone(),
            Side::Buy,
            TwapParams { target_quantity: 1000, start_ns: 0, end_ns: 1000, slice_interval_ns: 100, max_participation_rate: 1.0, limit_price: None },
        );
        strat.start();
        let ctx = FakeContext { now_ns: 150, submitted: RefCell::new(Vec::new()) };
        strat.on_quote(&ctx, &quote(&symbol));
        let slice = *ctx.submitted.borrow().last().unwrap();
        assert!(slice > 100, "expected catch-up slice beyond one period's share, got {slice}");
        let total_so_far: i64 = ctx.submitted.borrow().iter().sum();
        assert!(total_so_far <= 200, "current target plus one catch-up should not exceed 200, got {total_so_far}");
    }

    #[test]
    fn completes_on_end_time() {
        let symbol = Symbol::new("AAPL", Venue::Nasdaq);
        let mut strat = Twap::new(symbol.clone(), Side::Buy, TwapParams { target_quantity: 1000, start_ns: 0, end_ns: 1000, slice_interval_ns: 100, max_participation_rate: 1.0, limit_price: None });
        strat.start();
        let ctx = FakeContext { now_ns: 1000, submitted: RefCell::new(Vec::new()) };
        strat.on_quote(&ctx, &quote(&symbol));
        assert_eq!(strat.lifecycle(), StrategyLifecycle::Completed);
    }
}
