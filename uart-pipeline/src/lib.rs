//! Interrupt-driven UART pipeline for a two-port microcontroller UART block
//!
//! The receive side is split in two: [`rx::RxIsr`] runs in the UART interrupt,
//! drains the hardware FIFO into a lock-free [`ring::RingBuffer`] and posts the
//! ring's new tail to a [`dispatch::Scheduler`]; [`rx::RxTask`] runs in
//! deferred context and hands the bytes to the registered sink. An
//! out-of-band sentinel byte (Ctrl-C by default) can be routed to a handler
//! inside the interrupt instead.
//!
//! The transmit side writes with FIFO-occupancy backpressure ([`tx`]), renders
//! formatted output with `\r\n` line endings on the main port ([`console`]) and
//! routes the platform's own print output to either port ([`debug`]).
//!
//! Hardware is reached through [`device::UartDevice`]; [`regs::Uart`] is the
//! memory-mapped implementation.
//!
//! # Crate features
//!
//! * **defmt** -
//!   Implement `defmt::Format` for public types and emit driver logs through
//!   `defmt`.

#![warn(missing_docs)]
#![no_std]

#[macro_use]
mod fmt;

pub mod console;
pub mod debug;
pub mod device;
pub mod dispatch;
mod error;
pub mod init;
pub mod platform;
pub mod regs;
pub mod ring;
pub mod rx;
pub mod tx;

#[cfg(test)]
mod mock;

pub use console::Console;
pub use debug::{DebugMux, DebugRoute};
pub use device::{DebugPin, Port, UartDevice};
pub use dispatch::{Dispatch, DispatchQueue, Scheduler};
pub use error::Error;
pub use init::{init_debug, init_rx, DebugConfig, MainConfig};
pub use ring::RingBuffer;
pub use rx::{ByteSink, RxIsr, RxTask, SignalHandler};
pub use tx::TxPort;
