//! The UART register file as seen by the pipeline.
//!
//! Everything in this crate talks to hardware through [`UartDevice`]. The
//! memory-mapped implementation lives in [`crate::regs`]; tests substitute a
//! scripted device.

/// Depth of the hardware transmit FIFO.
pub const TX_FIFO_DEPTH: usize = 128;

/// Physical UART port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// UART0
    Uart0,
    /// UART1
    Uart1,
}

impl Port {
    /// The port the receive pipeline and the console are bound to.
    pub const MAIN: Port = Port::Uart0;
    /// The transmit-only debug port.
    pub const DEBUG: Port = Port::Uart1;

    /// Index of the port.
    pub const fn index(self) -> usize {
        match self {
            Port::Uart0 => 0,
            Port::Uart1 => 1,
        }
    }

    /// Returns the port with the given index, if there is one.
    pub const fn from_index(index: usize) -> Option<Port> {
        match index {
            0 => Some(Port::Uart0),
            1 => Some(Port::Uart1),
            _ => None,
        }
    }
}

/// Pin-mux register selecting the debug TX pin.
///
/// The value is the address of the IO_MUX register whose function field gets
/// switched to the UART1 TX function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebugPin(pub u32);

impl DebugPin {
    /// GPIO2, the usual UART1 TX pin.
    pub const GPIO2: DebugPin = DebugPin(0x6000_0838);
}

impl Default for DebugPin {
    fn default() -> Self {
        DebugPin::GPIO2
    }
}

/// Register-level operations the pipeline needs from the UART block.
///
/// All methods take `&self`: register access is interior-mutable, and the
/// receive interrupt and the transmit path use disjoint registers.
/// Receive-side methods always refer to [`Port::MAIN`].
pub trait UartDevice {
    /// Is a receive-FIFO-full or receive-new-data condition pending?
    fn rx_interrupt_pending(&self) -> bool;

    /// Masks the receive interrupt conditions.
    fn disable_rx_interrupt(&self);

    /// Unmasks the receive interrupt conditions.
    fn enable_rx_interrupt(&self);

    /// Clears the pending receive interrupt conditions.
    fn clear_rx_interrupt(&self);

    /// Number of bytes waiting in the receive FIFO.
    fn rx_fifo_count(&self) -> usize;

    /// Pops one byte from the receive FIFO.
    fn read_fifo(&self) -> u8;

    /// Number of bytes queued in the transmit FIFO of `port`.
    fn tx_fifo_count(&self, port: Port) -> usize;

    /// Pushes one byte into the transmit FIFO of `port`.
    fn write_fifo(&self, port: Port, byte: u8);

    /// Loads the baud clock divisor of `port`.
    fn set_clock_divisor(&self, port: Port, divisor: u32);

    /// Configures `port` for 8 data bits, no parity, 1 stop bit.
    fn set_frame_format_8n1(&self, port: Port);

    /// Routes the debug port's TX signal to `pin`.
    fn select_tx_pin(&self, pin: DebugPin);
}
