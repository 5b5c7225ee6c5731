//! Scripted hardware for unit tests.

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use crate::device::{DebugPin, Port, UartDevice};
use crate::platform::{IrqControl, SystemPrint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RxEvent {
    Disable,
    Enable,
    Clear,
}

/// A UART whose receive FIFO is fed by the test and whose transmit FIFOs are
/// recorded per port.
#[derive(Default)]
pub(crate) struct MockUart {
    rx_fifo: RefCell<VecDeque<u8>>,
    pending: Cell<bool>,
    rx_events: RefCell<Vec<RxEvent>>,
    tx: [RefCell<Vec<u8>>; 2],
    occupancy: RefCell<VecDeque<usize>>,
    occupancy_polls: Cell<usize>,
    divisors: [Cell<Option<u32>>; 2],
    framed_8n1: [Cell<bool>; 2],
    pin: Cell<Option<DebugPin>>,
}

impl MockUart {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bytes arrive on the wire and the receive interrupt becomes pending.
    pub(crate) fn receive(&self, bytes: &[u8]) {
        self.rx_fifo.borrow_mut().extend(bytes.iter().copied());
        self.pending.set(true);
    }

    /// Occupancy values returned by successive `tx_fifo_count` calls. Once
    /// the script runs out the FIFO reads as empty.
    pub(crate) fn script_occupancy(&self, samples: &[usize]) {
        self.occupancy.borrow_mut().extend(samples.iter().copied());
    }

    pub(crate) fn occupancy_polls(&self) -> usize {
        self.occupancy_polls.get()
    }

    pub(crate) fn sent(&self, port: Port) -> Vec<u8> {
        self.tx[port.index()].borrow().clone()
    }

    pub(crate) fn rx_events(&self) -> Vec<RxEvent> {
        self.rx_events.borrow().clone()
    }

    pub(crate) fn divisor(&self, port: Port) -> Option<u32> {
        self.divisors[port.index()].get()
    }

    pub(crate) fn framed_8n1(&self, port: Port) -> bool {
        self.framed_8n1[port.index()].get()
    }

    pub(crate) fn pin(&self) -> Option<DebugPin> {
        self.pin.get()
    }
}

impl UartDevice for MockUart {
    fn rx_interrupt_pending(&self) -> bool {
        self.pending.get()
    }

    fn disable_rx_interrupt(&self) {
        self.rx_events.borrow_mut().push(RxEvent::Disable);
    }

    fn enable_rx_interrupt(&self) {
        self.rx_events.borrow_mut().push(RxEvent::Enable);
    }

    fn clear_rx_interrupt(&self) {
        self.pending.set(false);
        self.rx_events.borrow_mut().push(RxEvent::Clear);
    }

    fn rx_fifo_count(&self) -> usize {
        self.rx_fifo.borrow().len()
    }

    fn read_fifo(&self) -> u8 {
        self.rx_fifo.borrow_mut().pop_front().unwrap_or(0)
    }

    fn tx_fifo_count(&self, _port: Port) -> usize {
        self.occupancy_polls.set(self.occupancy_polls.get() + 1);
        self.occupancy.borrow_mut().pop_front().unwrap_or(0)
    }

    fn write_fifo(&self, port: Port, byte: u8) {
        self.tx[port.index()].borrow_mut().push(byte);
    }

    fn set_clock_divisor(&self, port: Port, divisor: u32) {
        self.divisors[port.index()].set(Some(divisor));
    }

    fn set_frame_format_8n1(&self, port: Port) {
        self.framed_8n1[port.index()].set(true);
    }

    fn select_tx_pin(&self, pin: DebugPin) {
        self.pin.set(Some(pin));
    }
}

#[derive(Default)]
pub(crate) struct MockIrq {
    pub(crate) unmasked: Cell<bool>,
}

impl IrqControl for MockIrq {
    fn unmask_uart(&self) {
        self.unmasked.set(true);
    }
}

#[derive(Default)]
pub(crate) struct MockSystem {
    pub(crate) enabled: Cell<Option<bool>>,
    pub(crate) calls: Cell<usize>,
    pub(crate) putc: Cell<Option<fn(u8)>>,
}

impl SystemPrint for MockSystem {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(Some(enabled));
        self.calls.set(self.calls.get() + 1);
    }

    fn install_putc(&self, putc: fn(u8)) {
        self.putc.set(Some(putc));
    }
}
