//! Lock-free object pool for poolable domain types (`Order`, `Quote`).
//!
//! Pre-allocated at start-up so the steady-state hot path never calls the
//! allocator. Backed by `crossbeam::queue::ArrayQueue`, the same primitive
//! the teacher uses for its own object pools.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free pool of pre-allocated, reusable `T` slots.
pub struct ObjectPool<T: Default + Clone> {
    slots: Arc<ArrayQueue<T>>,
    capacity: usize,
    /// Counts fallback allocations when the pool was exhausted (§7
    /// resource-exhaustion: "pool exhausted ⇒ fallback to fresh
    /// allocation with a warning counter").
    fallback_allocations: Arc<AtomicU64>,
}

impl<T: Default + Clone> ObjectPool<T> {
    /// Pre-allocate `capacity` objects via `T::default()`. Do this once at
    /// start-up, never in the hot path.
    pub fn new(capacity: usize) -> Self {
        let slots = Arc::new(ArrayQueue::new(capacity));
        for _ in 0..capacity {
            slots.push(T::default()).ok();
        }
        Self {
            slots,
            capacity,
            fallback_allocations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Acquire a slot, wrapped in a [`PoolGuard`] that returns it on drop.
    /// Falls back to a fresh `T::default()` allocation (counted) rather
    /// than failing the caller when the pool is exhausted.
    #[inline]
    pub fn acquire(&self) -> PoolGuard<T> {
        let obj = match self.slots.pop() {
            Some(obj) => obj,
            None => {
                self.fallback_allocations.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(capacity = self.capacity, "object pool exhausted, falling back to allocation");
                T::default()
            }
        };
        PoolGuard {
            obj: Some(obj),
            pool: self.clone(),
        }
    }

    /// Try to acquire without a fallback allocation; `None` on exhaustion.
    #[inline]
    pub fn try_acquire(&self) -> Option<PoolGuard<T>> {
        self.slots.pop().map(|obj| PoolGuard {
            obj: Some(obj),
            pool: self.clone(),
        })
    }

    #[inline]
    fn release(&self, obj: T) {
        // Pool full (more releases than acquires, or capacity shrunk):
        // drop the object rather than corrupt the queue.
        let _ = self.slots.push(obj);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.slots.len()
    }

    pub fn fallback_allocations(&self) -> u64 {
        self.fallback_allocations.load(Ordering::Relaxed)
    }
}

impl<T: Default + Clone> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            capacity: self.capacity,
            fallback_allocations: Arc::clone(&self.fallback_allocations),
        }
    }
}

/// RAII handle returned by [`ObjectPool::acquire`]. Exclusively owns its
/// slot until dropped, at which point the slot is released back to the
/// pool — never while still referenced elsewhere (§3 lifecycle ownership).
pub struct PoolGuard<T: Default + Clone> {
    obj: Option<T>,
    pool: ObjectPool<T>,
}

impl<T: Default + Clone> PoolGuard<T> {
    pub fn get(&self) -> &T {
        self.obj.as_ref().expect("PoolGuard polled after release")
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.obj.as_mut().expect("PoolGuard polled after release")
    }

    /// Detach the inner value without returning it to the pool (e.g. to
    /// copy it into a ring event slot and let the guard's `Drop`
    /// immediately recycle an empty slot).
    pub fn into_inner(mut self) -> T {
        self.obj.take().expect("PoolGuard polled after release")
    }
}

impl<T: Default + Clone> std::ops::Deref for PoolGuard<T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: Default + Clone> std::ops::DerefMut for PoolGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut()
    }
}

impl<T: Default + Clone> Drop for PoolGuard<T> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            self.pool.release(obj);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Clone, PartialEq, Debug)]
    struct Widget {
        value: u64,
    }

    #[test]
    fn acquire_release_round_trips_capacity() {
        let pool = ObjectPool::<Widget>::new(4);
        assert_eq!(pool.available(), 4);
        let g = pool.acquire();
        assert_eq!(pool.available(), 3);
        drop(g);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn exhaustion_falls_back_with_counter() {
        let pool = ObjectPool::<Widget>::new(1);
        let _g1 = pool.acquire();
        assert_eq!(pool.try_acquire().map(|g| g.value), None);
        let g2 = pool.acquire();
        assert_eq!(g2.value, 0);
        assert_eq!(pool.fallback_allocations(), 1);
    }

    #[test]
    fn guard_deref_mut_mutates_slot() {
        let pool = ObjectPool::<Widget>::new(2);
        let mut g = pool.acquire();
        g.value = 42;
        assert_eq!(g.get().value, 42);
    }

    #[test]
    fn into_inner_detaches_without_releasing() {
        let pool = ObjectPool::<Widget>::new(1);
        let g = pool.acquire();
        assert_eq!(pool.available(), 0);
        let w = g.into_inner();
        assert_eq!(w.value, 0);
        assert_eq!(pool.available(), 0);
    }
}
