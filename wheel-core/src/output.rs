//! Output sink trait and error types.

use core::future::Future;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Serial/USB I/O error.
    Io,
    /// Link not ready (e.g., host port not opened).
    NotReady,
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::NotReady => write!(f, "link not ready"),
        }
    }
}

/// Async trait for the serial link towards the console.
///
/// Implementations receive complete SLIP frames and must write them out in
/// order. This abstracts USB CDC-ACM, a hardware UART, or a test recorder.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait OutputSink {
    /// Write one framed packet.
    ///
    /// May wait until the transport accepts the data.
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the link is ready to accept data.
    fn is_ready(&self) -> bool;
}
