//! Platform-agnostic core of the Eos wheel bridge.
//!
//! Three quadrature encoders (pan, tilt, level) and three mode buttons are
//! turned into OSC wheel messages for an ETC Eos console, sent as SLIP frames
//! over a serial link. Nothing here touches hardware directly: pins come in
//! through [`embedded_hal::digital::InputPin`] and frames go out through
//! [`OutputSink`], so the whole pipeline runs on host in tests.
//!
//! # Overview
//!
//! - [`encoder`]: Quadrature decoding ([`QuadratureState`], [`Encoder`])
//! - [`buttons`]: Debounced mode toggles ([`ModeButtons`], [`WheelModes`])
//! - [`translate`]: Rate scaling, spike rejection and axis routing ([`WheelTranslator`])
//! - [`dispatch`]: Console-specific addresses ([`ConsoleKind`])
//! - [`link`]: Handshake, ping and timeout ([`LinkMonitor`])
//! - [`output`]: Output sink trait ([`OutputSink`])
//! - [`bridge`]: Ties it together, one poll per loop iteration ([`WheelBridge`])
//! - [`config`]: Tunables ([`BridgeConfig`])
//!
//! # Example
//!
//! ```rust
//! use wheel_core::{LinkMonitor, LinkEvent, LinkState, DEFAULT_CONFIG};
//!
//! let mut link = LinkMonitor::new();
//! assert_eq!(link.on_packet(b"ETCOSC?", 0), Some(LinkEvent::Handshake));
//! assert_eq!(link.state(), LinkState::Connected);
//!
//! // Quiet for 2.6 s: ping once
//! assert_eq!(link.poll(2600, &DEFAULT_CONFIG), Some(LinkEvent::Ping));
//! assert_eq!(link.poll(2700, &DEFAULT_CONFIG), None);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log and derive `Format` through defmt (for embedded logging)
//! - **`log`**: Log through the `log` facade instead
//!
//! # Time
//!
//! All timestamps are `u32` milliseconds from a monotonic clock. Differences
//! use wrapping arithmetic, so the counter may roll over.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bridge;
pub mod buttons;
pub mod config;
pub mod dispatch;
pub mod encoder;
pub mod link;
pub mod output;
pub mod translate;

// Re-export main types at crate root
pub use bridge::{BridgeError, Panel, WheelBridge, MAX_PACKET_SIZE};
pub use buttons::{Debouncer, ModeButtons, WheelModes};
pub use config::{BridgeConfig, DEFAULT_CONFIG};
pub use dispatch::ConsoleKind;
pub use encoder::{Direction, Encoder, QuadratureState};
pub use link::{LinkEvent, LinkMonitor, LinkState};
pub use output::{OutputError, OutputSink};
pub use translate::{AxisRate, WheelAxis, WheelMove, WheelTarget, WheelTranslator};
