//! Bring-up of the receive path and the debug port.

use fugit::HertzU32;

use crate::device::{DebugPin, Port, UartDevice};
use crate::dispatch::Scheduler;
use crate::platform::{IrqControl, SystemPrint};
use crate::regs::CLKDIV_MAX;
use crate::ring::RingBuffer;
use crate::rx::{RxIsr, RxTask};
use crate::Error;

/// Reference clock feeding both UART baud generators.
pub const UART_CLK_FREQ: HertzU32 = HertzU32::from_raw(80_000_000);

/// Debug port baud rate used when none is configured.
pub const DEFAULT_DEBUG_BAUDRATE: HertzU32 = HertzU32::from_raw(115_200);

/// Main port settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainConfig {
    /// Baud rate of the main port. Zero keeps whatever divisor is loaded.
    pub baudrate: HertzU32,
}

impl MainConfig {
    /// Configuration with the given baud rate.
    pub const fn new(baudrate: HertzU32) -> Self {
        Self { baudrate }
    }
}

impl Default for MainConfig {
    fn default() -> Self {
        Self::new(HertzU32::from_raw(0))
    }
}

/// Debug port settings.
///
/// A zero pin address means [`DebugPin::GPIO2`], a zero baud rate means
/// [`DEFAULT_DEBUG_BAUDRATE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugConfig {
    /// IO_MUX register of the TX pin.
    pub pin: DebugPin,
    /// Baud rate of the debug port.
    pub baudrate: HertzU32,
}

impl DebugConfig {
    /// Configuration with the given pin and baud rate.
    pub const fn new(pin: DebugPin, baudrate: HertzU32) -> Self {
        Self { pin, baudrate }
    }

    fn resolved(&self) -> (DebugPin, HertzU32) {
        let pin = if self.pin.0 == 0 {
            DebugPin::GPIO2
        } else {
            self.pin
        };
        let baudrate = if self.baudrate.to_Hz() == 0 {
            DEFAULT_DEBUG_BAUDRATE
        } else {
            self.baudrate
        };
        (pin, baudrate)
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self::new(DebugPin::GPIO2, DEFAULT_DEBUG_BAUDRATE)
    }
}

/// Computes the CLKDIV value for `baudrate` from `clock`.
///
/// Fails with [`Error::BadArgument`] if the quotient is zero or does not fit
/// the register.
pub fn clock_divisor(baudrate: HertzU32, clock: HertzU32) -> Result<u32, Error> {
    let divisor = clock
        .to_Hz()
        .checked_div(baudrate.to_Hz())
        .ok_or(Error::BadArgument)?;

    match divisor {
        1..=CLKDIV_MAX => Ok(divisor),
        _ => Err(Error::BadArgument),
    }
}

/// Sets up the receive path on [`Port::MAIN`].
///
/// Loads the baud divisor (unless `config.baudrate` is zero), clears and
/// enables the receive interrupt, unmasks the UART line at the interrupt
/// controller and splits `ring` between the two halves of the pipeline.
///
/// Nothing is touched if the baud rate is rejected.
#[allow(clippy::type_complexity)]
pub fn init_rx<'a, D, S, I, const N: usize>(
    ring: &'a mut RingBuffer<N>,
    device: &'a D,
    scheduler: &'a S,
    irq: &I,
    config: &MainConfig,
) -> Result<(RxIsr<'a, D, S, fn(u8), N>, RxTask<'a, fn(u8), N>), Error>
where
    D: UartDevice,
    S: Scheduler,
    I: IrqControl,
{
    if config.baudrate.to_Hz() != 0 {
        let divisor = clock_divisor(config.baudrate, UART_CLK_FREQ)?;
        debug!("rx init: {} baud, divisor {}", config.baudrate.to_Hz(), divisor);
        device.set_clock_divisor(Port::MAIN, divisor);
    }

    let (producer, consumer) = ring.split();

    device.clear_rx_interrupt();
    device.enable_rx_interrupt();
    irq.unmask_uart();

    Ok((RxIsr::new(producer, device, scheduler), RxTask::new(consumer)))
}

/// Sets up [`Port::DEBUG`] as a transmit-only port and installs `putc` as the
/// system print hook.
pub fn init_debug<D, P>(
    device: &D,
    system: &P,
    config: &DebugConfig,
    putc: fn(u8),
) -> Result<(), Error>
where
    D: UartDevice,
    P: SystemPrint,
{
    let (pin, baudrate) = config.resolved();
    let divisor = clock_divisor(baudrate, UART_CLK_FREQ)?;
    debug!(
        "debug init: pin {:x}, {} baud, divisor {}",
        pin.0,
        baudrate.to_Hz(),
        divisor
    );

    device.select_tx_pin(pin);
    device.set_clock_divisor(Port::DEBUG, divisor);
    device.set_frame_format_8n1(Port::DEBUG);
    system.install_putc(putc);
    Ok(())
}
