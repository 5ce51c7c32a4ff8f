//! Ring buffer performance benchmarks.
//!
//! What's measured:
//! - single-producer publish latency under busy-spin
//! - a consumer stage draining a sequence it's already caught up to
//!   (the `wait_for` fast path, no blocking)
//!
//! Why this matters: every order intent and every quote update crosses
//! the ring exactly once per stage; this is the hottest path in the
//! whole engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meridian_core::domain::{Symbol, Venue};
use meridian_core::ring::{EventPayload, RingBuffer, WaitStrategy};

fn quote_payload(seq: u64) -> EventPayload {
    EventPayload::QuoteUpdate {
        symbol: Symbol::new("AAPL", Venue::Nasdaq),
        bid_price: 150_00 + seq as i64,
        ask_price: 150_01 + seq as i64,
        bid_size: 100,
        ask_size: 100,
        received_at: seq,
        sequence_number: seq,
        price_scale: 100,
    }
}

fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_publish");
    group.significance_level(0.01).sample_size(1000);

    let ring = RingBuffer::new(1 << 16, 1, true);
    let wait = WaitStrategy::BusySpin;
    let mut seq = 0u64;

    group.bench_function("publish_quote_update", |b| {
        b.iter(|| {
            seq += 1;
            black_box(ring.publish(quote_payload(seq), &wait).unwrap());
        });
    });

    group.finish();
}

fn bench_wait_for_caught_up(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_consume");
    group.significance_level(0.01).sample_size(1000);

    let ring = RingBuffer::new(1 << 12, 1, true);
    let wait = WaitStrategy::BusySpin;
    for i in 0..1000 {
        ring.publish(quote_payload(i), &wait).unwrap();
    }

    group.bench_function("wait_for_published_slot", |b| {
        let mut seq = 0u64;
        b.iter(|| {
            let slot = ring.wait_for(seq % 1000, &wait);
            black_box(slot.sequence);
            seq += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_publish, bench_wait_for_caught_up);
criterion_main!(benches);
