//! Encoder wheel box for ETC Eos consoles, on RP2040.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Reads three quadrature encoders (pan, tilt, level) and three mode buttons
//! 2. Turns rotation into OSC wheel messages for the console
//! 3. Sends them as SLIP frames over USB serial, answering the console's
//!    handshake and pinging it when it goes quiet
//!
//! # Hardware Configuration
//!
//! | Function       | GPIO   | Description |
//! |----------------|--------|-------------|
//! | Pan encoder    | 7, 6   | A, B (pull-up) |
//! | Tilt encoder   | 5, 4   | A, B (pull-up) |
//! | Level encoder  | 3, 2   | A, B (pull-up) |
//! | Level button   | 28     | Toggle level/iris (active high, pull-down) |
//! | Tilt button    | 27     | Reverse tilt (active high, pull-down) |
//! | Pan button     | 26     | Reverse pan (active high, pull-down) |
//! | LED            | 25     | On-board LED (lit while the console is connected) |
//!
//! # Architecture
//!
//! Three Embassy tasks:
//!
//! - **USB Task**: Manages the USB device stack
//! - **Inbound Task**: Copies USB serial packets into an [`InboundChannel`]
//! - **Bridge Task**: Polls the panel, drains the channel and drives the
//!   [`WheelBridge`]
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`reverse-pan`**, **`reverse-tilt`**, **`reverse-level`**: Flip the
//!   wiring direction of one encoder
//!
//! # Re-exports
//!
//! This crate re-exports the main items from [`wheel_core`] for convenience,
//! so consumers only need to depend on this crate.

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

// Re-export core types for convenience
pub use wheel_core::{
    BridgeConfig, BridgeError, Direction, Encoder, LinkState, ModeButtons, OutputError,
    OutputSink, Panel, WheelBridge, DEFAULT_CONFIG,
};

pub mod usb_serial;

pub use usb_serial::{
    configure_usb_serial, forward_inbound, InboundChannel, InboundChunk, UsbSerialOutput,
};

const fn wiring(reversed: bool) -> Direction {
    if reversed {
        Direction::Reverse
    } else {
        Direction::Forward
    }
}

/// Wiring direction of the pan encoder.
pub const PAN_DIRECTION: Direction = wiring(cfg!(feature = "reverse-pan"));
/// Wiring direction of the tilt encoder.
pub const TILT_DIRECTION: Direction = wiring(cfg!(feature = "reverse-tilt"));
/// Wiring direction of the level encoder.
pub const LEVEL_DIRECTION: Direction = wiring(cfg!(feature = "reverse-level"));
