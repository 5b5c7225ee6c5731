//! Platform services the pipeline relies on but does not implement.
//!
//! The deferred-task scheduler is described by [`crate::dispatch::Scheduler`].

/// The interrupt controller line the UART raises.
pub trait IrqControl {
    /// Unmasks the UART interrupt at the interrupt controller.
    fn unmask_uart(&self);
}

/// The platform's system print mechanism.
pub trait SystemPrint {
    /// Turns system print output on or off.
    fn set_enabled(&self, enabled: bool);

    /// Installs the per-character output hook system prints go through.
    fn install_putc(&self, putc: fn(u8));
}
