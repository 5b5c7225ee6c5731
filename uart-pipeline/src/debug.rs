//! System print routing.
//!
//! The platform's own print output (boot messages, SDK diagnostics) goes
//! through a per-character hook. [`DebugMux`] provides that hook and decides
//! which physical port, if any, receives it.
//!
//! The route lives in atomics, so a `static` mux can be shared between the
//! hook and whoever calls [`DebugMux::select_debug_route`]:
//!
//! ```ignore
//! static UART: Uart = unsafe { Uart::steal() };
//! static DEBUG: DebugMux<'static, Uart, Sdk> = DebugMux::new(&UART, &SDK);
//!
//! fn system_putc(c: u8) {
//!     DEBUG.putc(c)
//! }
//!
//! init_debug(&UART, &SDK, &DebugConfig::default(), system_putc)?;
//! DEBUG.select_debug_route(2)?;
//! ```

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::device::{Port, UartDevice};
use crate::platform::SystemPrint;
use crate::tx::transmit_byte;
use crate::Error;

/// Where system prints go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebugRoute {
    /// System prints are switched off.
    Disabled,
    /// System prints go to this port.
    Port(Port),
}

impl DebugRoute {
    /// Maps a mode number to a route: 0 disables, 1 and 2 select port
    /// `mode - 1`.
    pub const fn from_mode(mode: i32) -> Option<DebugRoute> {
        match mode {
            0 => Some(DebugRoute::Disabled),
            1 => Some(DebugRoute::Port(Port::Uart0)),
            2 => Some(DebugRoute::Port(Port::Uart1)),
            _ => None,
        }
    }

    /// The mode number selecting this route.
    pub const fn mode(self) -> i32 {
        match self {
            DebugRoute::Disabled => 0,
            DebugRoute::Port(port) => port.index() as i32 + 1,
        }
    }
}

impl TryFrom<i32> for DebugRoute {
    type Error = Error;

    fn try_from(mode: i32) -> Result<Self, Self::Error> {
        DebugRoute::from_mode(mode).ok_or(Error::InvalidRoute(mode))
    }
}

/// Routes system prints to one of the two ports.
///
/// Starts out enabled on [`Port::MAIN`], the platform's power-on behaviour.
pub struct DebugMux<'a, D, P> {
    device: &'a D,
    system: &'a P,
    enabled: AtomicBool,
    port: AtomicU8,
}

impl<'a, D, P> DebugMux<'a, D, P> {
    /// Creates a mux. Usable in a `static`.
    pub const fn new(device: &'a D, system: &'a P) -> Self {
        Self {
            device,
            system,
            enabled: AtomicBool::new(true),
            port: AtomicU8::new(Port::MAIN.index() as u8),
        }
    }
}

impl<'a, D: UartDevice, P: SystemPrint> DebugMux<'a, D, P> {
    /// Selects the route for system prints.
    ///
    /// Mode 0 switches system prints off. Modes 1 and 2 switch them on and
    /// bind them to port `mode - 1`. Any other mode is rejected and leaves the
    /// current route untouched.
    pub fn select_debug_route(&self, mode: i32) -> Result<(), Error> {
        let route = DebugRoute::try_from(mode).map_err(|e| {
            warn!("debug route: rejected mode {}", mode);
            e
        })?;

        match route {
            DebugRoute::Disabled => {
                self.system.set_enabled(false);
                self.enabled.store(false, Ordering::Release);
            }
            DebugRoute::Port(port) => {
                self.system.set_enabled(true);
                self.port.store(port.index() as u8, Ordering::Release);
                self.enabled.store(true, Ordering::Release);
            }
        }
        debug!("debug route: {}", route);
        Ok(())
    }

    /// The current route.
    pub fn route(&self) -> DebugRoute {
        if self.enabled.load(Ordering::Acquire) {
            DebugRoute::Port(self.port())
        } else {
            DebugRoute::Disabled
        }
    }

    /// The port system prints are bound to, whether or not they are enabled.
    pub fn port(&self) -> Port {
        Port::from_index(self.port.load(Ordering::Acquire) as usize).unwrap_or(Port::MAIN)
    }

    /// Character-output hook body.
    ///
    /// `\n` goes out as `\r\n` and `\r` is dropped, so both `\n` and `\r\n`
    /// line endings end up as a single `\r\n`.
    pub fn putc(&self, ch: u8) {
        let port = self.port();
        match ch {
            b'\n' => {
                transmit_byte(self.device, port, b'\r');
                transmit_byte(self.device, port, b'\n');
            }
            b'\r' => {}
            _ => transmit_byte(self.device, port, ch),
        }
    }

    /// A `fmt::Write` that prints through the mux. Writes are discarded while
    /// the route is disabled.
    pub fn writer(&self) -> DebugWriter<'_, 'a, D, P> {
        DebugWriter { mux: self }
    }
}

/// `fmt::Write` view of a [`DebugMux`].
pub struct DebugWriter<'m, 'a, D, P> {
    mux: &'m DebugMux<'a, D, P>,
}

impl<D: UartDevice, P: SystemPrint> fmt::Write for DebugWriter<'_, '_, D, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.mux.route() == DebugRoute::Disabled {
            return Ok(());
        }
        s.bytes().for_each(|b| self.mux.putc(b));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockSystem, MockUart};
    use core::fmt::Write;

    #[test]
    fn mode_mapping() {
        assert_eq!(DebugRoute::from_mode(0), Some(DebugRoute::Disabled));
        assert_eq!(DebugRoute::from_mode(1), Some(DebugRoute::Port(Port::Uart0)));
        assert_eq!(DebugRoute::from_mode(2), Some(DebugRoute::Port(Port::Uart1)));
        assert_eq!(DebugRoute::from_mode(3), None);
        assert_eq!(DebugRoute::from_mode(-1), None);
        for mode in 0..3 {
            assert_eq!(DebugRoute::try_from(mode).map(DebugRoute::mode), Ok(mode));
        }
    }

    #[test]
    fn selects_routes() {
        let uart = MockUart::new();
        let system = MockSystem::default();
        let mux = DebugMux::new(&uart, &system);
        assert_eq!(mux.route(), DebugRoute::Port(Port::Uart0));

        mux.select_debug_route(0).unwrap();
        assert_eq!(mux.route(), DebugRoute::Disabled);
        assert_eq!(system.enabled.get(), Some(false));

        mux.select_debug_route(1).unwrap();
        assert_eq!(mux.route(), DebugRoute::Port(Port::Uart0));
        assert_eq!(system.enabled.get(), Some(true));

        mux.select_debug_route(2).unwrap();
        assert_eq!(mux.route(), DebugRoute::Port(Port::Uart1));
        assert_eq!(system.enabled.get(), Some(true));
    }

    #[test]
    fn rejects_unknown_mode() {
        let uart = MockUart::new();
        let system = MockSystem::default();
        let mux = DebugMux::new(&uart, &system);

        mux.select_debug_route(2).unwrap();
        let calls = system.calls.get();

        let err = mux.select_debug_route(3).unwrap_err();
        assert_eq!(err, Error::InvalidRoute(3));
        assert!(err.code() < 0);
        assert_eq!(mux.select_debug_route(5), Err(Error::InvalidRoute(5)));
        assert_eq!(system.calls.get(), calls);
        assert_eq!(mux.route(), DebugRoute::Port(Port::Uart1));

        write!(mux.writer(), "ok").unwrap();
        assert_eq!(uart.sent(Port::Uart1), b"ok");
        assert!(uart.sent(Port::Uart0).is_empty());
    }

    #[test]
    fn putc_normalises_line_endings() {
        let uart = MockUart::new();
        let system = MockSystem::default();
        let mux = DebugMux::new(&uart, &system);

        for &c in b"a\r\nb\n" {
            mux.putc(c);
        }
        assert_eq!(uart.sent(Port::Uart0), b"a\r\nb\r\n");
    }

    #[test]
    fn disabled_route_discards_writes() {
        let uart = MockUart::new();
        let system = MockSystem::default();
        let mux = DebugMux::new(&uart, &system);

        mux.select_debug_route(0).unwrap();
        writeln!(mux.writer(), "hidden").unwrap();
        assert!(uart.sent(Port::Uart0).is_empty());
        assert!(uart.sent(Port::Uart1).is_empty());

        // Re-enabling keeps the port chosen by the mode.
        mux.select_debug_route(2).unwrap();
        writeln!(mux.writer(), "shown").unwrap();
        assert_eq!(uart.sent(Port::Uart1), b"shown\r\n");
    }
}
