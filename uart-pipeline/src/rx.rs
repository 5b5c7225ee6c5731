//! Interrupt-driven receive path.
//!
//! [`RxIsr`] runs in interrupt context: it drains the hardware receive FIFO
//! into the ring and posts the new `tail` to the scheduler. [`RxTask`] runs in
//! deferred context: for every received-data dispatch it hands the bytes
//! between its `head` and the posted `tail` to a [`ByteSink`], in order.
//!
//! A configurable sentinel byte (default [`SIGINT_BYTE`]) can be diverted to a
//! [`SignalHandler`] that runs synchronously in the interrupt. While a handler
//! is registered the sentinel never reaches the ring; without one it is
//! ordinary data.
//!
//! ## Usage
//!
//! ```ignore
//! static QUEUE: DispatchQueue = DispatchQueue::new();
//! static RX: Mutex<RefCell<Option<RxIsr<'static, Uart, DispatchQueue, fn(u8)>>>> =
//!     Mutex::new(RefCell::new(None));
//!
//! let (isr, task) = init_rx(ring, &UART, &QUEUE, &irq, &MainConfig::default())?;
//! critical_section::with(|cs| RX.borrow(cs).replace(Some(isr.with_signal_handler(on_ctrl_c as fn(u8)))));
//!
//! let mut task = task.with_sink(|b: u8| shell.feed(b));
//! loop {
//!     task.run_pending(&QUEUE);
//! }
//!
//! #[interrupt]
//! fn UART() {
//!     critical_section::with(|cs| {
//!         if let Some(isr) = RX.borrow_ref_mut(cs).as_mut() {
//!             isr.on_interrupt();
//!         }
//!     });
//! }
//! ```

use crate::device::UartDevice;
use crate::dispatch::{Dispatch, DispatchQueue, Scheduler, RX_DATA_SIGNAL};
use crate::ring::{Consumer, Producer, RX_BUFFER_SIZE};

/// Default out-of-band byte: ETX, what a terminal sends for Ctrl-C.
pub const SIGINT_BYTE: u8 = 0x03;

/// Receives ordinary bytes in deferred context.
pub trait ByteSink {
    /// Called once per received byte, in arrival order.
    fn accept(&mut self, byte: u8);
}

impl<F: FnMut(u8)> ByteSink for F {
    fn accept(&mut self, byte: u8) {
        self(byte)
    }
}

/// Receives the sentinel byte in interrupt context.
///
/// Runs inside the interrupt handler: it must not block and should do as
/// little as possible.
pub trait SignalHandler {
    /// Called once per sentinel occurrence.
    fn on_signal(&mut self, byte: u8);
}

impl<F: FnMut(u8)> SignalHandler for F {
    fn on_signal(&mut self, byte: u8) {
        self(byte)
    }
}

fn discard(_: u8) {}

/// Producer side of the receive pipeline. Owned by the UART interrupt handler.
///
/// The handler does not check for overrun: if more than `N - 1` bytes arrive
/// before the task drains them, the ring state is undefined.
pub struct RxIsr<'a, D, S, H = fn(u8), const N: usize = RX_BUFFER_SIZE> {
    producer: Producer<'a, N>,
    device: &'a D,
    scheduler: &'a S,
    on_signal: Option<H>,
    sentinel: u8,
}

impl<'a, D, S, const N: usize> RxIsr<'a, D, S, fn(u8), N>
where
    D: UartDevice,
    S: Scheduler,
{
    /// Creates the interrupt half with no signal handler registered.
    pub fn new(producer: Producer<'a, N>, device: &'a D, scheduler: &'a S) -> Self {
        Self {
            producer,
            device,
            scheduler,
            on_signal: None,
            sentinel: SIGINT_BYTE,
        }
    }
}

impl<'a, D, S, H, const N: usize> RxIsr<'a, D, S, H, N>
where
    D: UartDevice,
    S: Scheduler,
    H: SignalHandler,
{
    /// Registers `handler` for the sentinel byte.
    pub fn with_signal_handler<H2: SignalHandler>(self, handler: H2) -> RxIsr<'a, D, S, H2, N> {
        RxIsr {
            producer: self.producer,
            device: self.device,
            scheduler: self.scheduler,
            on_signal: Some(handler),
            sentinel: self.sentinel,
        }
    }

    /// Replaces the registered sentinel handler.
    pub fn set_signal_handler(&mut self, handler: H) {
        self.on_signal = Some(handler);
    }

    /// Unregisters the sentinel handler; the sentinel becomes ordinary data.
    pub fn clear_signal_handler(&mut self) {
        self.on_signal = None;
    }

    /// Uses `byte` as the sentinel instead of [`SIGINT_BYTE`].
    pub fn with_sentinel(mut self, byte: u8) -> Self {
        self.sentinel = byte;
        self
    }

    /// The current sentinel value.
    pub fn sentinel(&self) -> u8 {
        self.sentinel
    }

    /// Services the receive interrupt.
    ///
    /// Returns `false` without touching anything if no receive condition is
    /// pending. Otherwise masks and clears the source, moves every byte in the
    /// hardware FIFO into the ring, re-arms the source and posts the new `tail`
    /// to the scheduler.
    pub fn on_interrupt(&mut self) -> bool {
        if !self.device.rx_interrupt_pending() {
            return false;
        }

        self.device.disable_rx_interrupt();
        self.device.clear_rx_interrupt();

        let count = self.device.rx_fifo_count();
        for _ in 0..count {
            let byte = self.device.read_fifo();
            self.producer.push(byte);
            if byte == self.sentinel {
                if let Some(handler) = self.on_signal.as_mut() {
                    // Swallow the sentinel.
                    self.producer.retract();
                    handler.on_signal(byte);
                }
            }
        }

        self.device.clear_rx_interrupt();
        self.device.enable_rx_interrupt();

        let tail = self.producer.tail();
        trace!("rx: {} bytes, tail {}", count, tail);
        self.scheduler.post(Dispatch::rx_data(tail));
        true
    }
}

/// Consumer side of the receive pipeline. Runs as the deferred receive task.
pub struct RxTask<'a, K = fn(u8), const N: usize = RX_BUFFER_SIZE> {
    consumer: Consumer<'a, N>,
    sink: K,
}

impl<'a, const N: usize> RxTask<'a, fn(u8), N> {
    /// Creates the task half with a sink that drops every byte.
    pub fn new(consumer: Consumer<'a, N>) -> Self {
        Self {
            consumer,
            sink: discard,
        }
    }
}

impl<'a, K: ByteSink, const N: usize> RxTask<'a, K, N> {
    /// Registers `sink` for received bytes.
    pub fn with_sink<K2: ByteSink>(self, sink: K2) -> RxTask<'a, K2, N> {
        RxTask {
            consumer: self.consumer,
            sink,
        }
    }

    /// Replaces the registered sink.
    pub fn set_sink(&mut self, sink: K) {
        self.sink = sink;
    }

    /// The registered sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// The registered sink, mutably.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Index of the next byte the task will deliver.
    pub fn head(&self) -> usize {
        self.consumer.head()
    }

    /// Handles one scheduler dispatch and returns the number of bytes
    /// delivered.
    ///
    /// Dispatches whose signal is not [`RX_DATA_SIGNAL`] are ignored, as are
    /// received-data dispatches whose tail lies outside the ring.
    pub fn run(&mut self, dispatch: Dispatch) -> usize {
        if dispatch.signal != RX_DATA_SIGNAL {
            return 0;
        }
        if dispatch.param >= N {
            warn!("rx: tail {} outside ring of {}", dispatch.param, N);
            return 0;
        }
        let sink = &mut self.sink;
        self.consumer.drain_to(dispatch.param, |b| sink.accept(b))
    }

    /// Handles every dispatch pending in `queue`.
    pub fn run_pending<const Q: usize>(&mut self, queue: &DispatchQueue<Q>) -> usize {
        let mut delivered = 0;
        while let Some(dispatch) = queue.pop() {
            delivered += self.run(dispatch);
        }
        delivered
    }
}
