//! Bucketed latency histogram with percentile read-out.
//!
//! Fixed power-of-two-width buckets over a nanosecond range, each an
//! independent atomic counter (cache-aligned like the teacher's
//! `perf/metrics.rs::Metrics`) so recording a sample never takes a lock.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bound (exclusive) of each bucket, in nanoseconds. The last
/// bucket is a catch-all for anything at or above its lower bound.
const BUCKET_BOUNDS_NS: &[u64] = &[
    100, 250, 500, 1_000, 2_500, 5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000,
    1_000_000, 5_000_000, 10_000_000, 50_000_000, u64::MAX,
];

/// Lock-free latency histogram. Records are `fetch_add`s into the bucket
/// matching the sample; percentiles are computed on demand from a
/// snapshot of the bucket counts.
pub struct LatencyHistogram {
    buckets: Vec<CachePadded<AtomicU64>>,
    count: CachePadded<AtomicU64>,
    sum_ns: CachePadded<AtomicU64>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self {
            buckets: (0..BUCKET_BOUNDS_NS.len()).map(|_| CachePadded::new(AtomicU64::new(0))).collect(),
            count: CachePadded::new(AtomicU64::new(0)),
            sum_ns: CachePadded::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    pub fn record(&self, latency_ns: u64) {
        let idx = BUCKET_BOUNDS_NS.iter().position(|&bound| latency_ns < bound).unwrap_or(BUCKET_BOUNDS_NS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_ns.fetch_add(latency_ns, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            bucket_bounds_ns: BUCKET_BOUNDS_NS.to_vec(),
            bucket_counts: self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect(),
            count: self.count.load(Ordering::Relaxed),
            sum_ns: self.sum_ns.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for b in &self.buckets {
            b.store(0, Ordering::Relaxed);
        }
        self.count.store(0, Ordering::Relaxed);
        self.sum_ns.store(0, Ordering::Relaxed);
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Value-copy snapshot of bucket counts at a point in time.
#[derive(Debug, Clone)]
pub struct HistogramSnapshot {
    bucket_bounds_ns: Vec<u64>,
    bucket_counts: Vec<u64>,
    count: u64,
    sum_ns: u64,
}

impl HistogramSnapshot {
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean_ns(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ns as f64 / self.count as f64
        }
    }

    /// Approximate percentile via the bucket boundary that first reaches
    /// the target rank. `p` is in `[0.0, 100.0]`.
    pub fn percentile(&self, p: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }
        let target = ((p / 100.0) * self.count as f64).ceil() as u64;
        let mut cumulative = 0u64;
        for (bound, &bucket_count) in self.bucket_bounds_ns.iter().zip(self.bucket_counts.iter()) {
            cumulative += bucket_count;
            if cumulative >= target {
                return *bound;
            }
        }
        *self.bucket_bounds_ns.last().unwrap_or(&0)
    }

    pub fn p50(&self) -> u64 {
        self.percentile(50.0)
    }

    pub fn p99(&self) -> u64 {
        self.percentile(99.0)
    }

    pub fn p999(&self) -> u64 {
        self.percentile(99.9)
    }
}
