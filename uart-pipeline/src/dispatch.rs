//! Hand-off from the receive interrupt to the deferred receive task.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Depth of the pending-dispatch queue in front of the receive task.
pub const RX_TASK_QUEUE_LEN: usize = 10;

/// Signal carried by dispatches that announce received data.
pub const RX_DATA_SIGNAL: u32 = 0;

/// One scheduler dispatch: a signal number and a word-sized parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dispatch {
    /// What the dispatch means. The receive task only acts on [`RX_DATA_SIGNAL`].
    pub signal: u32,
    /// For [`RX_DATA_SIGNAL`], the ring `tail` captured by the interrupt.
    pub param: usize,
}

impl Dispatch {
    /// A received-data dispatch carrying `tail`.
    pub const fn rx_data(tail: usize) -> Self {
        Dispatch {
            signal: RX_DATA_SIGNAL,
            param: tail,
        }
    }
}

/// A deferred-task scheduler the receive interrupt can post to.
///
/// Implementations must be callable from interrupt context. What happens when
/// the scheduler's queue is full is up to the implementation; returning
/// `false` reports that the dispatch was dropped.
pub trait Scheduler {
    /// Queues `dispatch` for the receive task.
    fn post(&self, dispatch: Dispatch) -> bool;
}

/// Bounded dispatch queue usable from interrupt and thread context.
///
/// A full queue rejects new dispatches. Since every received-data dispatch
/// carries the latest `tail`, a dropped one only delays delivery until the next
/// accepted dispatch.
pub struct DispatchQueue<const N: usize = RX_TASK_QUEUE_LEN> {
    queue: Mutex<RefCell<Deque<Dispatch, N>>>,
}

impl<const N: usize> Default for DispatchQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DispatchQueue<N> {
    /// Creates an empty queue. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Takes the oldest pending dispatch.
    pub fn pop(&self) -> Option<Dispatch> {
        critical_section::with(|cs| self.queue.borrow_ref_mut(cs).pop_front())
    }

    /// Number of pending dispatches.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.queue.borrow_ref(cs).len())
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Scheduler for DispatchQueue<N> {
    fn post(&self, dispatch: Dispatch) -> bool {
        let accepted =
            critical_section::with(|cs| self.queue.borrow_ref_mut(cs).push_back(dispatch).is_ok());
        if !accepted {
            warn!("dispatch queue full, dropped tail {}", dispatch.param);
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_post_order() {
        let queue: DispatchQueue = DispatchQueue::new();
        assert!(queue.is_empty());
        assert!(queue.post(Dispatch::rx_data(3)));
        assert!(queue.post(Dispatch { signal: 7, param: 0 }));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop(), Some(Dispatch::rx_data(3)));
        assert_eq!(queue.pop(), Some(Dispatch { signal: 7, param: 0 }));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn rejects_when_full() {
        let queue: DispatchQueue = DispatchQueue::new();
        for tail in 0..RX_TASK_QUEUE_LEN {
            assert!(queue.post(Dispatch::rx_data(tail)));
        }
        assert!(!queue.post(Dispatch::rx_data(99)));
        assert_eq!(queue.len(), RX_TASK_QUEUE_LEN);
        assert_eq!(queue.pop(), Some(Dispatch::rx_data(0)));
        assert!(queue.post(Dispatch::rx_data(99)));
    }
}
