//! Formatted transmit on the main port.
//!
//! Output is rendered into a fixed [`PRINT_BUFFER_SIZE`]-byte buffer first and
//! only then sent, so a formatting failure transmits nothing. Every `\n` goes
//! out as `\r\n`.
//!
//! ```
//! # use uart_pipeline::{console::Console, uart_println};
//! # fn demo<D: uart_pipeline::device::UartDevice>(uart: &D) -> Result<(), uart_pipeline::Error> {
//! let mut console = Console::new(uart);
//! let sent = uart_println!(console, "value: {:02}", 7)?;
//! assert_eq!(sent, 10);
//! # Ok(())
//! # }
//! ```

use core::fmt;

use crate::device::{Port, UartDevice};
use crate::tx::transmit_byte;
use crate::Error;

/// Size of the render buffer.
pub const PRINT_BUFFER_SIZE: usize = 512;

/// `fmt::Write` into a byte slice that keeps counting past the end.
struct Render<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl fmt::Write for Render<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let start = self.len.min(self.buf.len());
        let n = bytes.len().min(self.buf.len() - start);
        self.buf[start..start + n].copy_from_slice(&bytes[..n]);
        self.len += bytes.len();
        Ok(())
    }
}

/// Renders `args` into `buf` and returns the full rendered length, which may
/// exceed `buf.len()`.
fn render(buf: &mut [u8], args: fmt::Arguments<'_>) -> Result<usize, Error> {
    let mut out = Render { buf, len: 0 };
    fmt::write(&mut out, args)?;
    Ok(out.len)
}

/// Formatted writer bound to [`Port::MAIN`].
pub struct Console<'a, D> {
    device: &'a D,
    buf: [u8; PRINT_BUFFER_SIZE],
}

impl<'a, D: UartDevice> Console<'a, D> {
    /// Creates a console on the main port.
    pub fn new(device: &'a D) -> Self {
        Self {
            device,
            buf: [0; PRINT_BUFFER_SIZE],
        }
    }

    /// Renders `args` and sends the result, `\n` translated to `\r\n`.
    ///
    /// Output longer than the buffer is cut to `PRINT_BUFFER_SIZE - 1` bytes.
    /// Returns the rendered length before truncation.
    pub fn print(&mut self, args: fmt::Arguments<'_>) -> Result<usize, Error> {
        let size = render(&mut self.buf, args).map_err(|e| {
            warn!("console: formatting failed");
            e
        })?;

        let emit = if size > PRINT_BUFFER_SIZE {
            PRINT_BUFFER_SIZE - 1
        } else {
            size
        };
        for &byte in &self.buf[..emit] {
            if byte == b'\n' {
                transmit_byte(self.device, Port::MAIN, b'\r');
            }
            transmit_byte(self.device, Port::MAIN, byte);
        }
        Ok(size)
    }
}

/// Prints to a [`Console`], returning the rendered byte count.
#[macro_export]
macro_rules! uart_print {
    ($console:expr, $($arg:tt)*) => {
        $console.print(::core::format_args!($($arg)*))
    };
}

/// Prints to a [`Console`] with a trailing newline, returning the rendered
/// byte count.
#[macro_export]
macro_rules! uart_println {
    ($console:expr) => {
        $console.print(::core::format_args!("\n"))
    };
    ($console:expr, $($arg:tt)*) => {
        $console.print(::core::format_args!("{}\n", ::core::format_args!($($arg)*)))
    };
}
