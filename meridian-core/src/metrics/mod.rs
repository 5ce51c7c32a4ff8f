//! Engine metrics (§2 Metrics component, §7 AMBIENT prometheus export):
//! lock-free atomic counters plus a bucketed latency histogram with
//! percentile read-out, and an optional Prometheus registry mirroring
//! the teacher's `monitoring/metrics.rs::MetricsRegistry` shape.

mod histogram;
mod prometheus_export;

pub use histogram::{HistogramSnapshot, LatencyHistogram};
pub use prometheus_export::PrometheusExporter;

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache-aligned atomic counters owned by the `MetricsHandler` stage
/// (§5: "OrderMetrics counters are writable only from handler stages;
/// external reads go through snapshot copies").
pub struct EngineMetrics {
    pub events_published: CachePadded<AtomicU64>,
    pub order_stage_processed: CachePadded<AtomicU64>,
    pub position_stage_processed: CachePadded<AtomicU64>,
    pub metrics_stage_processed: CachePadded<AtomicU64>,
    pub orders_accepted: CachePadded<AtomicU64>,
    pub orders_rejected: CachePadded<AtomicU64>,
    pub orders_filled: CachePadded<AtomicU64>,
    pub orders_cancelled: CachePadded<AtomicU64>,
    pub risk_rejections: CachePadded<AtomicU64>,
    pub pool_fallback_allocations: CachePadded<AtomicU64>,
    /// Time from quote/order intent arrival to the slot being published.
    pub tick_to_publish_ns: LatencyHistogram,
    /// Time from publish to a handler stage observing the slot.
    pub publish_to_handler_ns: LatencyHistogram,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            events_published: CachePadded::new(AtomicU64::new(0)),
            order_stage_processed: CachePadded::new(AtomicU64::new(0)),
            position_stage_processed: CachePadded::new(AtomicU64::new(0)),
            metrics_stage_processed: CachePadded::new(AtomicU64::new(0)),
            orders_accepted: CachePadded::new(AtomicU64::new(0)),
            orders_rejected: CachePadded::new(AtomicU64::new(0)),
            orders_filled: CachePadded::new(AtomicU64::new(0)),
            orders_cancelled: CachePadded::new(AtomicU64::new(0)),
            risk_rejections: CachePadded::new(AtomicU64::new(0)),
            pool_fallback_allocations: CachePadded::new(AtomicU64::new(0)),
            tick_to_publish_ns: LatencyHistogram::new(),
            publish_to_handler_ns: LatencyHistogram::new(),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            order_stage_processed: self.order_stage_processed.load(Ordering::Relaxed),
            position_stage_processed: self.position_stage_processed.load(Ordering::Relaxed),
            metrics_stage_processed: self.metrics_stage_processed.load(Ordering::Relaxed),
            orders_accepted: self.orders_accepted.load(Ordering::Relaxed),
            orders_rejected: self.orders_rejected.load(Ordering::Relaxed),
            orders_filled: self.orders_filled.load(Ordering::Relaxed),
            orders_cancelled: self.orders_cancelled.load(Ordering::Relaxed),
            risk_rejections: self.risk_rejections.load(Ordering::Relaxed),
            pool_fallback_allocations: self.pool_fallback_allocations.load(Ordering::Relaxed),
            tick_to_publish: self.tick_to_publish_ns.snapshot(),
            publish_to_handler: self.publish_to_handler_ns.snapshot(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub events_published: u64,
    pub order_stage_processed: u64,
    pub position_stage_processed: u64,
    pub metrics_stage_processed: u64,
    pub orders_accepted: u64,
    pub orders_rejected: u64,
    pub orders_filled: u64,
    pub orders_cancelled: u64,
    pub risk_rejections: u64,
    pub pool_fallback_allocations: u64,
    pub tick_to_publish: HistogramSnapshot,
    pub publish_to_handler: HistogramSnapshot,
}

impl MetricsSnapshot {
    pub fn fill_rate(&self) -> f64 {
        if self.orders_accepted == 0 {
            0.0
        } else {
            self.orders_filled as f64 / self.orders_accepted as f64
        }
    }
}
