//! Single-writer-per-slot, multi-producer / multi-consumer-stage event
//! ring (§4.1). Producers claim sequences by atomic-increment of a shared
//! cursor, write their slot, then publish it so consumers observe slots
//! strictly in sequence order. A fixed linear chain of consumer stages
//! each processes every slot before the next stage is allowed to.
//!
//! Grounded on the teacher's cache-line alignment discipline for hot
//! atomics (`perf/metrics.rs`'s `#[repr(C, align(64))]` counter bank, each
//! field hand-padded to its own line) and `perf/pools.rs`'s lock-free
//! `ArrayQueue` pool — no teacher file implements a disruptor-style ring
//! directly, so this is newly constructed from `std::sync::atomic`
//! primitives in the same low-level style. The teacher pads by hand with
//! `[u8; N]` filler fields; this module reaches for `crossbeam_utils`'s
//! `CachePadded` wrapper to get the same effect without hand-computing
//! the filler size per field, since the cursor count here is dynamic
//! (one per consumer stage) rather than the teacher's fixed field list.

use crate::error::ResourceExhaustion;
use crate::ring::event::{EventPayload, EventSlot};
use crate::ring::wait::WaitStrategy;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel published-sequence value meaning "slot not yet written for
/// this lap of the ring".
const UNPUBLISHED: u64 = u64::MAX;

struct Slot {
    cell: UnsafeCell<EventSlot>,
    published_seq: AtomicU64,
}

// SAFETY: a slot's `cell` is written by exactly one producer (the one that
// claimed its sequence) before `published_seq` is stored with Release
// ordering; every reader only inspects `cell` after observing the
// matching sequence in `published_seq` with Acquire ordering, which
// happens-before the write becomes visible.
unsafe impl Sync for Slot {}

/// Fixed-capacity (power-of-two) ring of reusable event slots.
pub struct RingBuffer {
    capacity: usize,
    mask: u64,
    slots: Box<[Slot]>,
    claim_cursor: CachePadded<AtomicU64>,
    /// Per-stage "next sequence this stage will process". Stage order in
    /// this vec IS the consumer chain order: `consumer_cursors[i]` may
    /// never run ahead of `consumer_cursors[i-1]`.
    consumer_cursors: Vec<CachePadded<AtomicU64>>,
    blocking: bool,
}

impl RingBuffer {
    /// `capacity` must be a power of two (the default is 65536, §6).
    /// `stages` is the number of sequential consumer stages in the chain
    /// (3 for OrderHandler → PositionHandler → MetricsHandler).
    pub fn new(capacity: usize, stages: usize, blocking: bool) -> Self {
        assert!(capacity.is_power_of_two(), "ring capacity must be a power of two");
        assert!(stages >= 1, "ring needs at least one consumer stage");
        let slots = (0..capacity)
            .map(|_| Slot {
                cell: UnsafeCell::new(EventSlot::default()),
                published_seq: AtomicU64::new(UNPUBLISHED),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let consumer_cursors = (0..stages).map(|_| CachePadded::new(AtomicU64::new(0))).collect();
        Self {
            capacity,
            mask: (capacity - 1) as u64,
            slots,
            claim_cursor: CachePadded::new(AtomicU64::new(0)),
            consumer_cursors,
            blocking,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stage_count(&self) -> usize {
        self.consumer_cursors.len()
    }

    #[inline]
    fn slowest_consumer_next(&self) -> u64 {
        self.consumer_cursors
            .iter()
            .map(|c| c.load(Ordering::Acquire))
            .min()
            .unwrap_or(0)
    }

    /// Claim the next sequence and publish `payload` into it. Blocks
    /// (spinning on `wait`) when the ring is full relative to the
    /// slowest consumer stage, unless the ring was constructed
    /// non-blocking, in which case it returns `BufferFull` immediately.
    pub fn publish(&self, payload: EventPayload, wait: &WaitStrategy) -> Result<u64, ResourceExhaustion> {
        loop {
            let seq = self.claim_cursor.load(Ordering::Relaxed);
            let slowest = self.slowest_consumer_next();
            if seq.wrapping_sub(slowest) >= self.capacity as u64 {
                if self.blocking {
                    wait.wait_once();
                    continue;
                }
                return Err(ResourceExhaustion::BufferFull { capacity: self.capacity });
            }
            if self
                .claim_cursor
                .compare_exchange_weak(seq, seq + 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }
            let idx = (seq & self.mask) as usize;
            // SAFETY: this producer alone holds sequence `seq`; no other
            // producer can claim it, and no consumer reads `cell` until
            // `published_seq` below is stored.
            unsafe {
                let slot = &mut *self.slots[idx].cell.get();
                slot.sequence = seq;
                slot.payload = payload;
            }
            self.slots[idx].published_seq.store(seq, Ordering::Release);
            return Ok(seq);
        }
    }

    /// Block (per `wait`) until sequence `seq` is published, then hand
    /// back a reference to its slot. `stage` identifies the calling
    /// consumer stage purely for documentation; the ring does not
    /// enforce per-stage isolation beyond the cursor ordering in
    /// `advance`.
    pub fn wait_for(&self, seq: u64, wait: &WaitStrategy) -> &EventSlot {
        let idx = (seq & self.mask) as usize;
        loop {
            if self.slots[idx].published_seq.load(Ordering::Acquire) == seq {
                break;
            }
            wait.wait_once();
        }
        // SAFETY: `published_seq == seq` happened-after the producer's
        // Release store of `cell`, so this Acquire load synchronizes with
        // it per the invariant documented on `Slot`.
        unsafe { &*self.slots[idx].cell.get() }
    }

    /// Record that consumer `stage` has finished processing `seq`,
    /// unblocking stage `stage + 1` (and, once all stages have advanced
    /// past a lap, producers waiting on ring capacity).
    pub fn advance(&self, stage: usize, seq: u64) {
        self.consumer_cursors[stage].store(seq + 1, Ordering::Release);
    }

    /// Next sequence stage `stage` should process, given where the
    /// previous stage in the chain (or the producers, for stage 0) has
    /// reached. Stage `N` may not read past what stage `N-1` has
    /// released.
    pub fn next_for_stage(&self, stage: usize) -> u64 {
        self.consumer_cursors[stage].load(Ordering::Acquire)
    }

    /// Highest sequence a stage may safely consume up to (exclusive):
    /// the previous stage's cursor for stage > 0, or the producer claim
    /// cursor for stage 0.
    pub fn stage_ceiling(&self, stage: usize) -> u64 {
        if stage == 0 {
            self.claim_cursor.load(Ordering::Acquire)
        } else {
            self.consumer_cursors[stage - 1].load(Ordering::Acquire)
        }
    }
}
