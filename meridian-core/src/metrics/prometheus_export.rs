//! Prometheus registry wrapping [`EngineMetrics`], grounded on the
//! teacher's `monitoring/metrics.rs::MetricsRegistry` (an `Arc<Registry>`
//! plus named `IntCounter`/`Histogram` families registered at
//! construction).

use crate::metrics::MetricsSnapshot;
use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};

/// Periodically fed from an [`EngineMetrics`] snapshot rather than wired
/// to the hot-path atomics directly, so Prometheus scraping never
/// contends with the handler chain.
pub struct PrometheusExporter {
    registry: Registry,
    events_published: IntCounter,
    orders_accepted: IntCounter,
    orders_rejected: IntCounter,
    orders_filled: IntCounter,
    orders_cancelled: IntCounter,
    risk_rejections: IntCounter,
    tick_to_publish_ns: Histogram,
    publish_to_handler_ns: Histogram,
}

impl PrometheusExporter {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events_published = IntCounter::with_opts(Opts::new(
            "meridian_events_published_total",
            "Total events published to the ring",
        ))?;
        let orders_accepted = IntCounter::with_opts(Opts::new("meridian_orders_accepted_total", "Orders accepted by a venue"))?;
        let orders_rejected = IntCounter::with_opts(Opts::new("meridian_orders_rejected_total", "Orders rejected (risk or venue)"))?;
        let orders_filled = IntCounter::with_opts(Opts::new("meridian_orders_filled_total", "Orders reaching FILLED"))?;
        let orders_cancelled = IntCounter::with_opts(Opts::new("meridian_orders_cancelled_total", "Orders reaching CANCELLED"))?;
        let risk_rejections = IntCounter::with_opts(Opts::new("meridian_risk_rejections_total", "Pre-trade risk rejections"))?;

        let latency_buckets = vec![
            100.0, 500.0, 1_000.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0, 1_000_000.0, 10_000_000.0,
        ];
        let tick_to_publish_ns = Histogram::with_opts(
            HistogramOpts::new("meridian_tick_to_publish_ns", "Tick-to-publish latency in nanoseconds")
                .buckets(latency_buckets.clone()),
        )?;
        let publish_to_handler_ns = Histogram::with_opts(
            HistogramOpts::new("meridian_publish_to_handler_ns", "Publish-to-handler latency in nanoseconds")
                .buckets(latency_buckets),
        )?;

        registry.register(Box::new(events_published.clone()))?;
        registry.register(Box::new(orders_accepted.clone()))?;
        registry.register(Box::new(orders_rejected.clone()))?;
        registry.register(Box::new(orders_filled.clone()))?;
        registry.register(Box::new(orders_cancelled.clone()))?;
        registry.register(Box::new(risk_rejections.clone()))?;
        registry.register(Box::new(tick_to_publish_ns.clone()))?;
        registry.register(Box::new(publish_to_handler_ns.clone()))?;

        Ok(Self {
            registry,
            events_published,
            orders_accepted,
            orders_rejected,
            orders_filled,
            orders_cancelled,
            risk_rejections,
            tick_to_publish_ns,
            publish_to_handler_ns,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Replace the counter values with an `EngineMetrics` snapshot.
    /// Prometheus counters are monotonic, so this only advances them by
    /// the delta since the last sync.
    pub fn sync(&self, previous: &MetricsSnapshot, current: &MetricsSnapshot) {
        self.events_published.inc_by(current.events_published.saturating_sub(previous.events_published));
        self.orders_accepted.inc_by(current.orders_accepted.saturating_sub(previous.orders_accepted));
        self.orders_rejected.inc_by(current.orders_rejected.saturating_sub(previous.orders_rejected));
        self.orders_filled.inc_by(current.orders_filled.saturating_sub(previous.orders_filled));
        self.orders_cancelled.inc_by(current.orders_cancelled.saturating_sub(previous.orders_cancelled));
        self.risk_rejections.inc_by(current.risk_rejections.saturating_sub(previous.risk_rejections));
        self.tick_to_publish_ns.observe(current.tick_to_publish.mean_ns());
        self.publish_to_handler_ns.observe(current.publish_to_handler.mean_ns());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::EngineMetrics;

    #[test]
    fn registers_without_error() {
        let exporter = PrometheusExporter::new().unwrap();
        assert!(!exporter.registry().gather().is_empty());
    }

    #[test]
    fn sync_only_advances_by_the_delta() {
        let exporter = PrometheusExporter::new().unwrap();
        let metrics = EngineMetrics::new();
        let before = metrics.snapshot();
        metrics.orders_accepted.fetch_add(5, std::sync::atomic::Ordering::Relaxed);
        let after = metrics.snapshot();
        exporter.sync(&before, &after);
        assert_eq!(exporter.orders_accepted.get(), 5);
    }
}
