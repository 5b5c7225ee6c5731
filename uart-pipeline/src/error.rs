//! Error type for the pipeline.

use core::fmt;

/// Errors reported by the pipeline.
///
/// Receive overrun has no variant: it is not detected, see
/// [`crate::ring`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The text formatter failed while rendering a formatted transmit.
    Format,
    /// A debug route mode other than 0, 1 or 2 was requested.
    InvalidRoute(i32),
    /// A baud rate that yields no usable clock divisor.
    BadArgument,
}

impl Error {
    /// Negative status code for callers that speak integer return codes.
    pub const fn code(&self) -> i32 {
        match self {
            Error::Format | Error::InvalidRoute(_) => -1,
            Error::BadArgument => -2,
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Format
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format => f.write_str("formatting failed"),
            Error::InvalidRoute(mode) => write!(f, "invalid debug route mode {}", mode),
            Error::BadArgument => f.write_str("baud rate out of range"),
        }
    }
}
