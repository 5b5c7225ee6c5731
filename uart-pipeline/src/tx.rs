//! Raw transmit with FIFO-occupancy backpressure.
//!
//! A byte is only written once the transmit FIFO holds fewer than
//! [`TX_FIFO_THRESHOLD`] bytes. The blocking variants spin on the occupancy
//! register with no timeout: if the FIFO never drains they never return.
//!
//! Bytes are sent exactly as given, `\n` included. Newline translation is the
//! business of [`crate::console`] and [`crate::debug`].

use core::convert::Infallible;

use embedded_hal_0_2::serial as eh0;
use nb::Error::WouldBlock;

use crate::device::{Port, UartDevice, TX_FIFO_DEPTH};

/// A write is allowed while the transmit FIFO holds fewer bytes than this.
pub const TX_FIFO_THRESHOLD: usize = TX_FIFO_DEPTH - 2;

/// Returns `true` if the transmit FIFO of `port` can take another byte.
pub(crate) fn is_writable<D: UartDevice>(device: &D, port: Port) -> bool {
    device.tx_fifo_count(port) < TX_FIFO_THRESHOLD
}

/// Writes `byte` if the FIFO is below the threshold, `Err(WouldBlock)`
/// otherwise.
pub(crate) fn write_raw<D: UartDevice>(
    device: &D,
    port: Port,
    byte: u8,
) -> nb::Result<(), Infallible> {
    if !is_writable(device, port) {
        return Err(WouldBlock);
    }
    device.write_fifo(port, byte);
    Ok(())
}

/// Returns `Err(WouldBlock)` until the transmit FIFO of `port` is empty.
pub(crate) fn transmit_flushed<D: UartDevice>(
    device: &D,
    port: Port,
) -> nb::Result<(), Infallible> {
    if device.tx_fifo_count(port) == 0 {
        Ok(())
    } else {
        Err(WouldBlock)
    }
}

/// Sends `byte` on `port`, spinning until the FIFO has room.
pub fn transmit_byte<D: UartDevice>(device: &D, port: Port, byte: u8) {
    match nb::block!(write_raw(device, port, byte)) {
        Ok(()) => {}
        Err(e) => match e {},
    }
}

/// Raw transmitter bound to one port.
pub struct TxPort<'a, D> {
    device: &'a D,
    port: Port,
}

impl<'a, D: UartDevice> TxPort<'a, D> {
    /// Creates a transmitter for `port`.
    pub fn new(device: &'a D, port: Port) -> Self {
        Self { device, port }
    }

    /// The port this transmitter writes to.
    pub fn port(&self) -> Port {
        self.port
    }

    /// Is there room in the transmit FIFO?
    pub fn is_writable(&self) -> bool {
        is_writable(self.device, self.port)
    }

    /// Writes `byte` if the FIFO has room.
    pub fn write_raw(&self, byte: u8) -> nb::Result<(), Infallible> {
        write_raw(self.device, self.port, byte)
    }

    /// Writes `byte`, spinning until the FIFO has room.
    pub fn write_blocking(&self, byte: u8) {
        transmit_byte(self.device, self.port, byte);
    }

    /// Writes every byte of `data`, spinning as needed.
    pub fn write_full_blocking(&self, data: &[u8]) {
        for &byte in data {
            self.write_blocking(byte);
        }
    }
}

impl<D: UartDevice> eh0::Write<u8> for TxPort<'_, D> {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.write_raw(word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        transmit_flushed(self.device, self.port)
    }
}

impl<D: UartDevice> embedded_hal_nb::serial::ErrorType for TxPort<'_, D> {
    type Error = Infallible;
}

impl<D: UartDevice> embedded_hal_nb::serial::Write<u8> for TxPort<'_, D> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.write_raw(word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        transmit_flushed(self.device, self.port)
    }
}

impl<D: UartDevice> embedded_io::ErrorType for TxPort<'_, D> {
    type Error = Infallible;
}

impl<D: UartDevice> embedded_io::Write for TxPort<'_, D> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let Some((&first, rest)) = buf.split_first() else {
            return Ok(0);
        };
        // Blocks if and only if no bytes can be written.
        self.write_blocking(first);
        let mut written = 1;
        for &byte in rest {
            if self.write_raw(byte).is_err() {
                break;
            }
            written += 1;
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        nb::block!(transmit_flushed(self.device, self.port))
    }
}

impl<D: UartDevice> embedded_io::WriteReady for TxPort<'_, D> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_writable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockUart;

    #[test]
    fn threshold_leaves_headroom_in_fifo() {
        assert_eq!(TX_FIFO_THRESHOLD, 126);
    }

    #[test]
    fn waits_for_occupancy_below_threshold() {
        let uart = MockUart::new();
        uart.script_occupancy(&[128, 127, 126, 125]);

        transmit_byte(&uart, Port::Uart0, b'x');

        assert_eq!(uart.occupancy_polls(), 4);
        assert_eq!(uart.sent(Port::Uart0), b"x");
        assert!(uart.sent(Port::Uart1).is_empty());
    }

    #[test]
    fn non_blocking_write_reports_full_fifo() {
        let uart = MockUart::new();
        let tx = TxPort::new(&uart, Port::Uart1);
        uart.script_occupancy(&[TX_FIFO_THRESHOLD]);

        assert_eq!(tx.write_raw(b'a'), Err(WouldBlock));
        assert!(uart.sent(Port::Uart1).is_empty());
        assert_eq!(tx.write_raw(b'a'), Ok(()));
        assert_eq!(uart.sent(Port::Uart1), b"a");
    }

    #[test]
    fn raw_newline_is_one_byte() {
        let uart = MockUart::new();
        let tx = TxPort::new(&uart, Port::Uart0);

        tx.write_full_blocking(b"a\nb");
        assert_eq!(uart.sent(Port::Uart0), b"a\nb");
    }

    #[test]
    fn embedded_io_write_stops_at_full_fifo() {
        use embedded_io::Write;

        let uart = MockUart::new();
        let mut tx = TxPort::new(&uart, Port::Uart0);
        // First byte waits once, second goes through, third hits a full FIFO.
        uart.script_occupancy(&[127, 0, 0, 127]);

        assert_eq!(tx.write(b"abc"), Ok(2));
        assert_eq!(uart.sent(Port::Uart0), b"ab");
        assert_eq!(tx.write(b""), Ok(0));
    }

    #[test]
    fn flush_waits_for_empty_fifo() {
        use embedded_hal_nb::serial::Write;

        let uart = MockUart::new();
        let mut tx = TxPort::new(&uart, Port::Uart0);
        uart.script_occupancy(&[3]);

        assert_eq!(tx.flush(), Err(WouldBlock));
        assert_eq!(tx.flush(), Ok(()));
    }
}
