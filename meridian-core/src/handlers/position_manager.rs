//! Per-symbol position aggregate registry (§4.3, §5: "PositionManager
//! ... writable only from handler stages; external reads go through
//! snapshot copies"). Generalizes the teacher's single global
//! `risk/types.rs::Position` into a map keyed by [`Symbol`], since this
//! engine trades more than one instrument concurrently.

use dashmap::DashMap;

use crate::domain::{Position, PositionSnapshot, Side, Symbol};
use crate::error::InvariantViolation;

pub struct PositionManager {
    positions: DashMap<Symbol, Position>,
    price_scale: i64,
}

impl PositionManager {
    pub fn new(price_scale: i64) -> Self {
        Self { positions: DashMap::new(), price_scale }
    }

    pub fn apply_fill(&self, symbol: &Symbol, side: Side, fill_qty: i64, fill_price: i64) -> Result<(), InvariantViolation> {
        let mut entry = self.positions.entry(symbol.clone()).or_insert_with(|| Position::new(symbol.clone(), self.price_scale));
        entry.apply_fill(side, fill_qty, fill_price)?;
        let current_price = entry.last_mark_price;
        if current_price != 0 {
            entry.mark(current_price);
        }
        Ok(())
    }

    pub fn mark(&self, symbol: &Symbol, current_price: i64) {
        let mut entry = self.positions.entry(symbol.clone()).or_insert_with(|| Position::new(symbol.clone(), self.price_scale));
        entry.mark(current_price);
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Position> {
        self.positions.get(symbol).map(|e| e.clone())
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        let mut total_positions = 0usize;
        let mut active_positions = 0usize;
        let mut realized_pnl = 0i64;
        let mut unrealized_pnl = 0i64;
        let mut gross_exposure = 0i64;
        let mut net_exposure = 0i64;
        for entry in self.positions.iter() {
            total_positions += 1;
            if !entry.is_flat() {
                active_positions += 1;
            }
            realized_pnl += entry.realized_pnl;
            unrealized_pnl += entry.unrealized_pnl;
            gross_exposure += entry.gross_exposure();
            net_exposure += entry.net_exposure();
        }
        PositionSnapshot { total_positions, active_positions, realized_pnl, unrealized_pnl, gross_exposure, net_exposure }
    }

    pub fn all_positions(&self) -> Vec<Position> {
        self.positions.iter().map(|e| e.clone()).collect()
    }
}
