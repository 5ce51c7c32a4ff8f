//! Live order registry (§4.6 order port glue, §5 "OrderManager ...
//! writable only from handler stages; external reads go through
//! snapshot copies").
//!
//! Grounded on the teacher's `core/order_fsm.rs` transition vocabulary,
//! re-expressed here as a registry around the mutable, poolable
//! [`Order`] rather than a move-based typestate chain (an `Order` slot
//! outlives many logical orders, see [`crate::pool::ObjectPool`]).
//! Lookup maps use `dashmap::DashMap` the way the teacher reaches for
//! concurrent maps elsewhere in its `core` module, since registration
//! and status updates both happen from the single OrderHandler stage
//! while reads (`get`, `open_orders`) may come from any thread.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{Order, OrderStatus};
use crate::error::ValidationError;

/// A status transition observed on a registered order, handed to
/// listeners so they can translate it into further ring events or
/// journal records.
#[derive(Debug, Clone)]
pub struct OrderStatusChange {
    pub client_id: u64,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub ts_ns: u64,
}

/// Registry of in-flight and recently terminal orders, indexed by both
/// the client-assigned id and the venue-assigned id once known.
pub struct OrderManager {
    by_client_id: DashMap<u64, Order>,
    venue_to_client: DashMap<String, u64>,
    listeners: parking_lot::RwLock<Vec<Box<dyn Fn(&OrderStatusChange) + Send + Sync>>>,
    registered: AtomicU64,
}

impl OrderManager {
    pub fn new() -> Self {
        Self {
            by_client_id: DashMap::new(),
            venue_to_client: DashMap::new(),
            listeners: parking_lot::RwLock::new(Vec::new()),
            registered: AtomicU64::new(0),
        }
    }

    /// Register a brand-new order. The first ring observation of a
    /// client order id is always this call (§5: risk check
    /// happens-before publish, so by the time the OrderHandler stage
    /// sees a NEW_ORDER event the order is already risk-approved).
    pub fn register(&self, order: Order) {
        self.registered.fetch_add(1, Ordering::Relaxed);
        self.by_client_id.insert(order.client_id, order);
    }

    /// Record the venue-assigned id once an order is accepted.
    pub fn bind_venue_id(&self, client_id: u64, venue_order_id: String) {
        if let Some(mut entry) = self.by_client_id.get_mut(&client_id) {
            self.venue_to_client.insert(venue_order_id.clone(), client_id);
            entry.venue_order_id = Some(venue_order_id);
        }
    }

    /// Apply a status transition, notifying listeners on success.
    /// Transitions unreachable from the order's current status are
    /// logged and dropped rather than propagated (§4.2).
    pub fn apply_transition(&self, client_id: u64, new_status: OrderStatus, now_ns: u64) -> Result<(), ValidationError> {
        let mut entry = match self.by_client_id.get_mut(&client_id) {
            Some(entry) => entry,
            None => {
                tracing::warn!(client_id, "transition for unknown order dropped");
                return Ok(());
            }
        };
        let old_status = entry.status;
        match entry.transition(new_status, now_ns) {
            Ok(()) => {
                drop(entry);
                self.notify(OrderStatusChange { client_id, old_status, new_status, ts_ns: now_ns });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(client_id, ?old_status, ?new_status, %err, "invalid order transition dropped");
                Err(err)
            }
        }
    }

    /// Apply a fill, notifying listeners with the resulting status
    /// (PARTIALLY_FILLED or FILLED per [`Order::apply_fill`]).
    pub fn apply_fill(&self, client_id: u64, fill_qty: i64, fill_price: i64, now_ns: u64) -> Result<(), ValidationError> {
        let mut entry = match self.by_client_id.get_mut(&client_id) {
            Some(entry) => entry,
            None => {
                tracing::warn!(client_id, "fill for unknown order dropped");
                return Ok(());
            }
        };
        let old_status = entry.status;
        entry.apply_fill(fill_qty, fill_price, now_ns)?;
        let new_status = entry.status;
        drop(entry);
        self.notify(OrderStatusChange { client_id, old_status, new_status, ts_ns: now_ns });
        Ok(())
    }

    pub fn get(&self, client_id: u64) -> Option<Order> {
        self.by_client_id.get(&client_id).map(|e| e.clone())
    }

    pub fn get_by_venue_id(&self, venue_order_id: &str) -> Option<Order> {
        let client_id = *self.venue_to_client.get(venue_order_id)?;
        self.get(client_id)
    }

    /// Orders in a non-terminal status (§4.6 `getOpenOrders`).
    pub fn open_orders(&self) -> Vec<Order> {
        self.by_client_id.iter().filter(|e| e.status.is_active()).map(|e| e.clone()).collect()
    }

    pub fn open_orders_for_symbol(&self, symbol: &crate::domain::Symbol) -> Vec<Order> {
        self.by_client_id.iter().filter(|e| e.status.is_active() && &e.symbol == symbol).map(|e| e.clone()).collect()
    }

    pub fn registered_count(&self) -> u64 {
        self.registered.load(Ordering::Relaxed)
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&OrderStatusChange) + Send + Sync + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    fn notify(&self, change: OrderStatusChange) {
        for listener in self.listeners.read().iter() {
            listener(&change);
        }
    }
}

impl Default for OrderManager {
    fn default() -> Self {
        Self::new()
    }
}
