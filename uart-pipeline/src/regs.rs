//! Memory-mapped implementation of [`UartDevice`].
//!
//! Two identical UART blocks, UART0 at `0x6000_0000` and UART1 `0xF00` above
//! it. Only the registers the pipeline touches are described.

use vcell::VolatileCell;

use crate::device::{DebugPin, Port, UartDevice};

/// Base address of UART0.
pub const UART0_BASE: usize = 0x6000_0000;
/// Base address of UART1.
pub const UART1_BASE: usize = UART0_BASE + 0xF00;

/// Receive FIFO reached its full threshold.
pub const INT_RXFIFO_FULL: u32 = 1 << 0;
/// Receive FIFO holds new data (timeout condition).
pub const INT_RXFIFO_TOUT: u32 = 1 << 8;
/// The two conditions the receive interrupt serves.
pub const INT_RX_MASK: u32 = INT_RXFIFO_FULL | INT_RXFIFO_TOUT;

const STATUS_RXFIFO_CNT_MASK: u32 = 0x0000_00FF;
const STATUS_TXFIFO_CNT_MASK: u32 = 0x00FF_0000;
const STATUS_TXFIFO_CNT_SHIFT: u32 = 16;

/// CONF0 value for 8 data bits, no parity, 1 stop bit.
pub const CONF0_8N1: u32 = 0xC;

/// Largest value the CLKDIV register holds.
pub const CLKDIV_MAX: u32 = 0xF_FFFF;

const IO_MUX_FUNC_MASK: u32 = 0x130;
const FUNC_U1TXD_BK: u32 = 2;

/// UART register block.
#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - FIFO data
    pub fifo: VolatileCell<u32>,
    /// 0x04 - Raw interrupt status
    pub int_raw: VolatileCell<u32>,
    /// 0x08 - Masked interrupt status
    pub int_st: VolatileCell<u32>,
    /// 0x0C - Interrupt enable
    pub int_ena: VolatileCell<u32>,
    /// 0x10 - Interrupt clear
    pub int_clr: VolatileCell<u32>,
    /// 0x14 - Baud clock divisor
    pub clkdiv: VolatileCell<u32>,
    /// 0x18 - Autobaud
    pub autobaud: VolatileCell<u32>,
    /// 0x1C - FIFO status
    pub status: VolatileCell<u32>,
    /// 0x20 - Frame configuration
    pub conf0: VolatileCell<u32>,
}

impl RegisterBlock {
    fn modify<F: FnOnce(u32) -> u32>(cell: &VolatileCell<u32>, f: F) {
        cell.set(f(cell.get()));
    }
}

/// Encodes an IO_MUX function number into the register's split function field.
const fn mux_function_bits(func: u32) -> u32 {
    (((func & 0x4) << 2) | (func & 0x3)) << 4
}

/// Handle to both UART blocks.
pub struct Uart {
    _private: (),
}

impl Uart {
    /// Creates a handle to the UART registers.
    ///
    /// # Safety
    ///
    /// The caller must be running on the target and must not create handles
    /// that are used concurrently for the same registers outside the
    /// receive-interrupt/transmit split this crate follows.
    pub const unsafe fn steal() -> Self {
        Uart { _private: () }
    }

    fn block(&self, port: Port) -> &RegisterBlock {
        let base = match port {
            Port::Uart0 => UART0_BASE,
            Port::Uart1 => UART1_BASE,
        };
        // SAFETY: fixed peripheral address; the handle was created with `steal`.
        unsafe { &*(base as *const RegisterBlock) }
    }

    fn main(&self) -> &RegisterBlock {
        self.block(Port::MAIN)
    }
}

impl UartDevice for Uart {
    fn rx_interrupt_pending(&self) -> bool {
        self.main().int_st.get() & INT_RX_MASK != 0
    }

    fn disable_rx_interrupt(&self) {
        RegisterBlock::modify(&self.main().int_ena, |v| v & !INT_RX_MASK);
    }

    fn enable_rx_interrupt(&self) {
        RegisterBlock::modify(&self.main().int_ena, |v| v | INT_RX_MASK);
    }

    fn clear_rx_interrupt(&self) {
        self.main().int_clr.set(INT_RX_MASK);
    }

    fn rx_fifo_count(&self) -> usize {
        (self.main().status.get() & STATUS_RXFIFO_CNT_MASK) as usize
    }

    fn read_fifo(&self) -> u8 {
        (self.main().fifo.get() & 0xFF) as u8
    }

    fn tx_fifo_count(&self, port: Port) -> usize {
        ((self.block(port).status.get() & STATUS_TXFIFO_CNT_MASK) >> STATUS_TXFIFO_CNT_SHIFT)
            as usize
    }

    fn write_fifo(&self, port: Port, byte: u8) {
        self.block(port).fifo.set(byte as u32);
    }

    fn set_clock_divisor(&self, port: Port, divisor: u32) {
        self.block(port).clkdiv.set(divisor & CLKDIV_MAX);
    }

    fn set_frame_format_8n1(&self, port: Port) {
        self.block(port).conf0.set(CONF0_8N1);
    }

    fn select_tx_pin(&self, pin: DebugPin) {
        let reg = pin.0 as *mut u32;
        // SAFETY: `DebugPin` names an IO_MUX register; only its function field
        // is rewritten.
        unsafe {
            let v = reg.read_volatile();
            reg.write_volatile((v & !IO_MUX_FUNC_MASK) | mux_function_bits(FUNC_U1TXD_BK));
        }
    }
}
