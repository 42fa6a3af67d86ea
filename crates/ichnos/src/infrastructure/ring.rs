//! Lock-free multi-producer, single-consumer ring buffer.
//!
//! The buffer carries fully-constructed records from many producer threads to
//! one consumer thread without locks. Slot *reservation* (a CAS on `tail`) is
//! deliberately decoupled from slot *publication* (a release store of the
//! per-slot ready flag): a consumer that observes `tail` past a slot but the
//! slot's flag still false knows the producer has claimed the slot without
//! finishing its write, and backs off instead of reading a torn record.
//!
//! # Memory Layout
//! `head` and `tail` live on separate cache lines so that producer CAS
//! traffic does not invalidate the consumer's line and vice versa.
//!
//! # Ordering protocol
//! - `tail` CAS: relaxed. It only reserves a slot index; no data rides on it.
//! - `ready[i] = true`: release. Single publication point for the record.
//! - `ready[i]` read: acquire. Pairs with the publication store.
//! - `head` store: release. Publishes slot reuse to producers.
//! - `head` read (producer): acquire. Pairs with the consumer's release.

use std::cell::UnsafeCell;
use std::mem::{self, MaybeUninit};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{TraceError, TraceResult};

/// Rounds `n` up to the smallest power of two that is at least 2.
///
/// Capacities 0 and 1 are both promoted to 2; powers of two of at least 2
/// are returned unchanged.
#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two().max(2)
}

/// Pads the wrapped value out to its own cache line.
#[repr(align(64))]
struct CachePadded<T>(T);

struct Slot<T> {
    /// False while the slot is unclaimed or claimed-but-unwritten.
    ready: AtomicBool,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded lock-free MPSC queue of fixed-size records.
///
/// `head` and `tail` are monotone 64-bit counters; they are never masked
/// until a slot index is needed, so `tail - head` is always the number of
/// occupied slots even across wrap-around.
///
/// `try_pop` must only ever be called from one thread at a time. The
/// transport is built for exactly one drain thread; `head` is mutated with a
/// plain store on that assumption.
pub struct MpscRingBuffer<T> {
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
    capacity: u64,
    mask: u64,
    slots: Box<[Slot<T>]>,
}

unsafe impl<T: Send> Send for MpscRingBuffer<T> {}
unsafe impl<T: Send> Sync for MpscRingBuffer<T> {}

impl<T> MpscRingBuffer<T> {
    /// Creates a buffer with at least `capacity` slots, rounded up to the
    /// next power of two (minimum 2).
    ///
    /// # Errors
    /// Returns [`TraceError::ZeroCapacity`] when `capacity` is 0.
    pub fn with_capacity(capacity: usize) -> TraceResult<Self> {
        if capacity == 0 {
            return Err(TraceError::ZeroCapacity);
        }
        let capacity = next_power_of_two(capacity);
        let slots = (0..capacity)
            .map(|_| Slot {
                ready: AtomicBool::new(false),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Box<[Slot<T>]>>();

        Ok(Self {
            head: CachePadded(AtomicU64::new(0)),
            tail: CachePadded(AtomicU64::new(0)),
            capacity: capacity as u64,
            mask: capacity as u64 - 1,
            slots,
        })
    }

    /// Effective (power-of-two) capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Snapshot of the number of occupied slots. Advisory only under
    /// concurrent use.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Relaxed);
        tail.wrapping_sub(head) as usize
    }

    /// True when no slot is occupied. Advisory only under concurrent use.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts to enqueue `value`. Never blocks.
    ///
    /// Returns the value back through `Err` when the buffer is full, leaving
    /// all shared state untouched. Callers construct the record on their own
    /// stack before calling, so a failed construction can never corrupt the
    /// queue.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let mut tail = self.tail.0.load(Ordering::Relaxed);
        loop {
            let head = self.head.0.load(Ordering::Acquire);
            if tail.wrapping_sub(head) >= self.capacity {
                return Err(value);
            }
            // Reservation only; publication rides on the ready flag below.
            match self.tail.0.compare_exchange_weak(
                tail,
                tail.wrapping_add(1),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => tail = observed,
            }
        }

        let slot = &self.slots[(tail & self.mask) as usize];
        // INVARIANT: the CAS above grants this thread exclusive ownership of
        // the slot until the ready store, and the acquire load of `head`
        // guarantees the consumer has finished with any previous occupant.
        unsafe { (*slot.value.get()).write(value) };
        slot.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Attempts to dequeue one record. Never blocks.
    ///
    /// Returns `None` when the buffer is empty, or when the next slot has
    /// been claimed by a producer that has not yet published its write.
    ///
    /// Must only be called from the single consumer thread; concurrent
    /// callers would race on `head`.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.0.load(Ordering::Relaxed);
        if head == self.tail.0.load(Ordering::Relaxed) {
            return None;
        }

        let slot = &self.slots[(head & self.mask) as usize];
        if !slot.ready.load(Ordering::Acquire) {
            // Claimed but not yet written. Treat as empty for now.
            return None;
        }

        // INVARIANT: ready == true means the producer's release store has
        // published the record; this thread now owns the slot contents.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.ready.store(false, Ordering::Relaxed);
        // The release store orders the flag reset before producers observe
        // the freed slot.
        self.head.0.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }
}

impl<T> Drop for MpscRingBuffer<T> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }
        // Exactly the slots in [head, tail) hold live records; everything
        // outside that range was never written or has already been moved out.
        let tail = self.tail.0.load(Ordering::Relaxed);
        let mut index = self.head.0.load(Ordering::Relaxed);
        while index != tail {
            let slot = &self.slots[(index & self.mask) as usize];
            unsafe { (*slot.value.get()).assume_init_drop() };
            index = index.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            MpscRingBuffer::<u64>::with_capacity(0),
            Err(TraceError::ZeroCapacity)
        ));
    }

    #[test]
    fn capacity_rounds_to_power_of_two() {
        assert_eq!(MpscRingBuffer::<u64>::with_capacity(1).unwrap().capacity(), 2);
        assert_eq!(MpscRingBuffer::<u64>::with_capacity(3).unwrap().capacity(), 4);
        assert_eq!(MpscRingBuffer::<u64>::with_capacity(4).unwrap().capacity(), 4);
        assert_eq!(MpscRingBuffer::<u64>::with_capacity(8192).unwrap().capacity(), 8192);
    }

    #[test]
    fn next_power_of_two_small_values() {
        assert_eq!(next_power_of_two(0), 2);
        assert_eq!(next_power_of_two(1), 2);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(4), 4);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(1000), 1024);
        assert_eq!(next_power_of_two(1025), 2048);
    }

    #[test]
    fn next_power_of_two_fixpoints() {
        for k in 1..48u32 {
            let p = 1usize << k;
            assert_eq!(next_power_of_two(p), p);
            assert_eq!(next_power_of_two(p - 1), p.max(2));
        }
    }

    #[test]
    fn fill_and_drain_in_order() {
        let rb = MpscRingBuffer::with_capacity(4).unwrap();
        for i in 0..4 {
            assert!(rb.try_push(i).is_ok());
        }
        assert!(rb.try_push(4).is_err());

        for expected in 0..4 {
            assert_eq!(rb.try_pop(), Some(expected));
        }
        assert_eq!(rb.try_pop(), None);
    }

    #[test]
    fn full_buffer_returns_value_back() {
        let rb = MpscRingBuffer::with_capacity(2).unwrap();
        assert!(rb.try_push(10).is_ok());
        assert!(rb.try_push(20).is_ok());
        assert_eq!(rb.try_push(30), Err(30));
        assert_eq!(rb.len(), 2);
    }

    #[test]
    fn wrap_around_preserves_fifo() {
        let rb = MpscRingBuffer::with_capacity(2).unwrap();
        assert!(rb.try_push(1).is_ok());
        assert!(rb.try_push(2).is_ok());
        assert!(rb.try_push(3).is_err());

        assert_eq!(rb.try_pop(), Some(1));
        assert!(rb.try_push(3).is_ok());
        assert_eq!(rb.try_pop(), Some(2));
        assert_eq!(rb.try_pop(), Some(3));
        assert_eq!(rb.try_pop(), None);
    }

    #[test]
    fn repeated_wrap_around() {
        let rb = MpscRingBuffer::with_capacity(4).unwrap();
        for round in 0..3 {
            for i in 0..4 {
                assert!(rb.try_push(round * 100 + i).is_ok());
            }
            for i in 0..2 {
                assert_eq!(rb.try_pop(), Some(round * 100 + i));
            }
            for i in 4..6 {
                assert!(rb.try_push(round * 100 + i).is_ok());
            }
            for i in 2..6 {
                assert_eq!(rb.try_pop(), Some(round * 100 + i));
            }
            assert_eq!(rb.try_pop(), None);
        }
    }

    #[test]
    fn pop_on_empty_is_none() {
        let rb = MpscRingBuffer::<String>::with_capacity(4).unwrap();
        assert_eq!(rb.try_pop(), None);
    }

    /// Non-trivial payload whose drops are observable. Deliberately not
    /// `Clone`: the transport must move records, never copy them.
    struct Payload {
        value: usize,
        _data: String,
        drops: Arc<AtomicUsize>,
    }

    impl Payload {
        fn new(value: usize, drops: &Arc<AtomicUsize>) -> Self {
            Self {
                value,
                _data: format!("payload-{value}"),
                drops: Arc::clone(drops),
            }
        }
    }

    impl Drop for Payload {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn popped_records_are_dropped_exactly_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let rb = MpscRingBuffer::with_capacity(8).unwrap();
        for i in 0..8 {
            assert!(rb.try_push(Payload::new(i, &drops)).is_ok());
        }
        assert_eq!(drops.load(Ordering::Relaxed), 0);

        for expected in 0..8 {
            let payload = rb.try_pop().unwrap();
            assert_eq!(payload.value, expected);
            drop(payload);
        }
        assert_eq!(drops.load(Ordering::Relaxed), 8);
    }

    #[test]
    fn leftover_records_are_dropped_with_the_buffer() {
        let drops = Arc::new(AtomicUsize::new(0));
        {
            let rb = MpscRingBuffer::with_capacity(4).unwrap();
            for i in 0..3 {
                assert!(rb.try_push(Payload::new(i, &drops)).is_ok());
            }
            assert_eq!(rb.try_pop().unwrap().value, 0);
            assert_eq!(drops.load(Ordering::Relaxed), 1);
        }
        // Two records were still in flight when the buffer was torn down.
        assert_eq!(drops.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn rejected_push_drops_the_value_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let rb = MpscRingBuffer::with_capacity(2).unwrap();
        assert!(rb.try_push(Payload::new(0, &drops)).is_ok());
        assert!(rb.try_push(Payload::new(1, &drops)).is_ok());

        let rejected = rb.try_push(Payload::new(2, &drops));
        assert!(rejected.is_err());
        drop(rejected);
        assert_eq!(drops.load(Ordering::Relaxed), 1);
        drop(rb);
        assert_eq!(drops.load(Ordering::Relaxed), 3);
    }
}
