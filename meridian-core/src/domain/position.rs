//! Per-symbol position aggregate and its fill/mark-to-market arithmetic.

use crate::domain::{Side, Symbol};
use crate::error::InvariantViolation;

/// Per-symbol aggregate. Canonical state is owned exclusively by the
/// position manager (a `HashMap<Symbol, Position>` or `DashMap` where
/// concurrent snapshot reads are required); external readers only ever
/// see a [`PositionSnapshot`] value copy.
#[derive(Debug, Clone)]
pub struct Position {
    pub symbol: Symbol,
    /// Signed; positive long, negative short.
    pub quantity: i64,
    pub avg_entry_price: i64,
    pub realized_pnl: i64,
    pub last_mark_price: i64,
    pub unrealized_pnl: i64,
    /// Worst negative excursion of realized+unrealized, monotonically
    /// non-increasing.
    pub max_drawdown: i64,
    pub price_scale: i64,
}

impl Position {
    pub fn new(symbol: Symbol, price_scale: i64) -> Self {
        Self {
            symbol,
            quantity: 0,
            avg_entry_price: 0,
            realized_pnl: 0,
            last_mark_price: 0,
            unrealized_pnl: 0,
            max_drawdown: 0,
            price_scale,
        }
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    /// Apply a fill per the five position invariants: same-direction
    /// fills widen the average entry price; reducing fills realize P&L
    /// against the existing average and leave it unchanged; a fill that
    /// reverses sign first closes the old position at the old average,
    /// then opens the remainder fresh at the fill price.
    pub fn apply_fill(&mut self, side: Side, fill_qty: i64, fill_price: i64) -> Result<(), InvariantViolation> {
        if fill_qty <= 0 {
            return Err(InvariantViolation::PositionCorrupted {
                ticker: self.symbol.ticker().to_string(),
                reason: format!("non-positive fill quantity {fill_qty}"),
            });
        }
        let signed_fill = fill_qty * side.sign();
        let old_qty = self.quantity;

        if old_qty == 0 {
            // Flat -> open fresh.
            self.quantity = signed_fill;
            self.avg_entry_price = fill_price;
            return Ok(());
        }

        let same_direction = (old_qty > 0) == (signed_fill > 0);
        if same_direction {
            // (iii) widen the average. Wide intermediate: both terms are
            // quantity*price products that can each approach 2^63 at
            // crypto price scales, so the sum is computed in i128 before
            // dividing back down to the new (always-representable) i64.
            let new_qty = old_qty + signed_fill;
            let weighted = old_qty as i128 * self.avg_entry_price as i128
                + signed_fill as i128 * fill_price as i128;
            self.avg_entry_price = (weighted / new_qty as i128) as i64;
            self.quantity = new_qty;
            return Ok(());
        }

        // Reducing or reversing.
        let old_sign = if old_qty > 0 { 1 } else { -1 };
        let reduce_qty = fill_qty.min(old_qty.abs());
        let realized_delta =
            (fill_price - self.avg_entry_price) as i128 * reduce_qty as i128 * old_sign as i128;
        self.realized_pnl += realized_delta as i64;

        let new_qty = old_qty + signed_fill;
        if new_qty == 0 {
            self.avg_entry_price = 0;
        } else if (new_qty > 0) != (old_qty > 0) {
            // (v) sign reversal: remainder opens fresh at the fill price.
            self.avg_entry_price = fill_price;
        }
        // (iv) partial reduction without crossing zero: average preserved.
        self.quantity = new_qty;
        Ok(())
    }

    /// Mark-to-market against a new current price (quote mid, or last
    /// trade price on TRADE_UPDATE). Recomputes unrealized P&L and
    /// advances the monotonic drawdown floor.
    pub fn mark(&mut self, current_price: i64) {
        self.last_mark_price = current_price;
        let pnl = (current_price - self.avg_entry_price) as i128 * self.quantity as i128;
        self.unrealized_pnl = pnl as i64;
        let total = self.realized_pnl + self.unrealized_pnl;
        self.max_drawdown = self.max_drawdown.min(total);
    }

    #[inline]
    pub fn gross_exposure(&self) -> i64 {
        (self.quantity as i128 * self.last_mark_price as i128).abs() as i64
    }

    #[inline]
    pub fn net_exposure(&self) -> i64 {
        (self.quantity as i128 * self.last_mark_price as i128) as i64
    }
}

/// Value-copy, thread-shareable snapshot of aggregate portfolio state.
#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    pub total_positions: usize,
    pub active_positions: usize,
    pub realized_pnl: i64,
    pub unrealized_pnl: i64,
    pub gross_exposure: i64,
    pub net_exposure: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::Venue;

    fn sym() -> Symbol {
        Symbol::new("AAPL", Venue::Nasdaq)
    }

    #[test]
    fn opening_from_flat_sets_entry_price() {
        let mut p = Position::new(sym(), 100);
        p.apply_fill(Side::Buy, 10, 150_00).unwrap();
        assert_eq!(p.quantity, 10);
        assert_eq!(p.avg_entry_price, 150_00);
        assert!(!p.is_flat());
    }

    #[test]
    fn adding_same_direction_widens_average() {
        let mut p = Position::new(sym(), 100);
        p.apply_fill(Side::Buy, 10, 100_00).unwrap();
        p.apply_fill(Side::Buy, 10, 200_00).unwrap();
        assert_eq!(p.quantity, 20);
        assert_eq!(p.avg_entry_price, 150_00);
    }

    #[test]
    fn reducing_preserves_average_and_realizes_pnl() {
        let mut p = Position::new(sym(), 100);
        p.apply_fill(Side::Buy, 10, 100_00).unwrap();
        p.apply_fill(Side::Sell, 4, 120_00).unwrap();
        assert_eq!(p.quantity, 6);
        assert_eq!(p.avg_entry_price, 100_00);
        assert_eq!(p.realized_pnl, (120_00 - 100_00) * 4);
    }

    #[test]
    fn reversing_closes_then_opens_fresh() {
        let mut p = Position::new(sym(), 100);
        p.apply_fill(Side::Buy, 10, 100_00).unwrap();
        p.apply_fill(Side::Sell, 15, 110_00).unwrap();
        assert_eq!(p.quantity, -5);
        assert_eq!(p.realized_pnl, (110_00 - 100_00) * 10);
        assert_eq!(p.avg_entry_price, 110_00);
    }

    #[test]
    fn flattening_resets_entry_price() {
        let mut p = Position::new(sym(), 100);
        p.apply_fill(Side::Buy, 10, 100_00).unwrap();
        p.apply_fill(Side::Sell, 10, 105_00).unwrap();
        assert!(p.is_flat());
        assert_eq!(p.avg_entry_price, 0);
    }

    #[test]
    fn drawdown_is_monotonic() {
        let mut p = Position::new(sym(), 100);
        p.apply_fill(Side::Buy, 10, 100_00).unwrap();
        p.mark(90_00);
        let first = p.max_drawdown;
        assert!(first < 0);
        p.mark(120_00);
        // drawdown must not improve even though unrealized pnl did
        assert_eq!(p.max_drawdown, first);
        p.mark(50_00);
        assert!(p.max_drawdown < first);
    }
}
