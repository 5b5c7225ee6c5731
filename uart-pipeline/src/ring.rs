//! Fixed-capacity single-producer/single-consumer byte ring.
//!
//! The ring is the only state shared between the receive interrupt and the
//! deferred receive task. It never allocates and takes no locks: the producer
//! half is the sole writer of `tail` and of the slots, the consumer half is the
//! sole writer of `head`. Both indices are plain atomics that are only ever
//! loaded and stored, so the ring also works on cores without compare-and-swap.
//!
//! ## Overrun
//!
//! The ring does **not** detect overrun. If the producer writes more than
//! `N - 1` bytes that the consumer has not yet drained, `tail` laps `head` and
//! the unconsumed data, as well as the number of bytes the consumer believes to
//! be pending, become meaningless. Size `N` for the worst-case burst between two
//! consumer runs.
//!
//! ## Usage
//!
//! ```
//! use uart_pipeline::ring::RingBuffer;
//!
//! let mut ring: RingBuffer<16> = RingBuffer::new();
//! let (mut producer, mut consumer) = ring.split();
//!
//! producer.push(b'h');
//! producer.push(b'i');
//!
//! let mut out = [0u8; 2];
//! let mut i = 0;
//! consumer.drain_to(producer.tail(), |b| {
//!     out[i] = b;
//!     i += 1;
//! });
//! assert_eq!(&out, b"hi");
//! ```

use core::cell::UnsafeCell;
use core::sync::atomic::{fence, AtomicUsize, Ordering};

/// Default receive ring capacity.
pub const RX_BUFFER_SIZE: usize = 0x100;

/// A byte ring with room for `N - 1` unconsumed bytes.
pub struct RingBuffer<const N: usize = RX_BUFFER_SIZE> {
    buf: UnsafeCell<[u8; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// SAFETY: slot writes happen only through `Producer` and slot reads only
// through `Consumer`, and `split` hands out exactly one of each.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    /// Creates an empty ring. Usable in a `static`.
    pub const fn new() -> Self {
        assert!(N > 1, "ring capacity must be at least 2");
        Self {
            buf: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Number of slots in the ring.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Snapshot of the number of bytes written but not yet drained.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail + N - head) % N
    }

    /// Returns `true` if the snapshot shows no pending bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits the ring into its producer and consumer halves.
    ///
    /// Holding the `&mut` borrow for as long as the halves live is what
    /// guarantees a single producer and a single consumer.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let ring = &*self;
        (Producer { ring }, Consumer { ring })
    }

    const fn advance(index: usize) -> usize {
        (index + 1) % N
    }

    const fn retreat(index: usize) -> usize {
        (index + N - 1) % N
    }

    fn slot(&self, index: usize) -> *mut u8 {
        debug_assert!(index < N);
        // SAFETY: `index < N`, so the offset stays inside the array.
        unsafe { self.buf.get().cast::<u8>().add(index) }
    }
}

/// Write half of a [`RingBuffer`]. Owned by the interrupt context.
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Index of the next slot to be written.
    pub fn tail(&self) -> usize {
        // Only this half stores `tail`.
        self.ring.tail.load(Ordering::Relaxed)
    }

    /// Stores `byte` at `tail` and advances `tail`.
    pub fn push(&mut self, byte: u8) {
        let tail = self.tail();
        // SAFETY: the slot at `tail` is outside the consumer's window as long
        // as the ring is not overrun, and only the producer writes slots.
        unsafe { self.ring.slot(tail).write(byte) };
        self.ring
            .tail
            .store(RingBuffer::<N>::advance(tail), Ordering::Release);
    }

    /// Steps `tail` back over the most recently pushed byte.
    ///
    /// At `tail == 0` this wraps to `N - 1`.
    pub fn retract(&mut self) {
        let tail = self.tail();
        self.ring
            .tail
            .store(RingBuffer::<N>::retreat(tail), Ordering::Release);
    }
}

/// Read half of a [`RingBuffer`]. Owned by the deferred receive task.
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Index of the next slot to be read.
    pub fn head(&self) -> usize {
        // Only this half stores `head`.
        self.ring.head.load(Ordering::Relaxed)
    }

    /// Number of bytes between `head` and `tail`.
    pub fn available(&self, tail: usize) -> usize {
        (tail % N + N - self.head()) % N
    }

    /// Hands every byte from `head` up to (excluding) `tail` to `f`, in order,
    /// then moves `head` to `tail`. Returns the number of bytes handed out.
    ///
    /// `tail` is a value previously observed through [`Producer::tail`], so it
    /// is always below `N`.
    pub fn drain_to<F: FnMut(u8)>(&mut self, tail: usize, mut f: F) -> usize {
        debug_assert!(tail < N);
        let tail = tail % N;
        // Pairs with the release store of `tail` in `Producer::push`.
        fence(Ordering::Acquire);

        let mut head = self.head();
        let mut count = 0;
        while head != tail {
            // SAFETY: slots in `head..tail` were published by the producer and
            // are not written again until `head` moves past them.
            f(unsafe { self.ring.slot(head).read() });
            head = RingBuffer::<N>::advance(head);
            count += 1;
        }
        self.ring.head.store(head, Ordering::Release);
        count
    }
}
