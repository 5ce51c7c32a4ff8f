//! Wait strategies for producers (ring full) and consumers (slot not yet
//! published). Busy-spin is the low-latency default; yield/park trade
//! latency for CPU usage when pinned cores aren't available.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Spin on a relaxed-load check. Lowest latency, CPU-bound; the
    /// default for a dedicated/pinned consumer thread.
    BusySpin,
    /// Yield the OS thread slice between checks.
    Yield,
    /// Park the thread for a short fixed duration between checks.
    Park(Duration),
}

impl Default for WaitStrategy {
    fn default() -> Self {
        WaitStrategy::BusySpin
    }
}

impl WaitStrategy {
    #[inline]
    pub fn wait_once(&self) {
        match self {
            WaitStrategy::BusySpin => std::hint::spin_loop(),
            WaitStrategy::Yield => std::thread::yield_now(),
            WaitStrategy::Park(d) => std::thread::sleep(*d),
        }
    }
}
