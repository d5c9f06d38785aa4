//! SLIP framing and OSC message encoding for the Eos wheel bridge.
//!
//! This crate provides the two wire layers the bridge speaks over its serial link:
//!
//! - **Framing**: SLIP (RFC 1055) packet delimiting
//!   - [`encode_frame()`] - Escape a payload and wrap it in `END` bytes
//!   - [`SlipDecoder`] - Byte-at-a-time frame reassembly
//!
//! - **Messages**: Minimal OSC 1.0 encoding
//!   - [`OscMessage`] - An address plus a single argument
//!   - [`OscArg`] - Float or string argument
//!   - [`peek_address()`] - Read the address of an inbound packet
//!
//! # Wire Format
//!
//! Each packet is sent double-ended, as OSC 1.1 recommends for serial links:
//!
//! ```text
//! END <escaped payload> END
//! ```
//!
//! An OSC message payload is:
//!
//! ```text
//! <address>\0 (padded to 4) ,<tag>\0 (padded to 4) <argument>
//! ```
//!
//! # Example
//!
//! ```
//! use osc_proto::{encode_frame, OscMessage, SlipDecoder};
//!
//! let mut payload = [0u8; 64];
//! let len = OscMessage::float("/eos/wheel/fine/pan", 25.0)
//!     .encode(&mut payload)
//!     .unwrap();
//!
//! let mut frame = [0u8; 130];
//! let framed = encode_frame(&payload[..len], &mut frame).unwrap();
//!
//! let mut decoder = SlipDecoder::<64>::new();
//! let mut decoded = None;
//! for &b in &frame[..framed] {
//!     if let Ok(Some(packet)) = decoder.push_byte(b) {
//!         decoded = Some(packet.len());
//!     }
//! }
//! assert_eq!(decoded, Some(len));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod message;
pub mod slip;

pub use message::{peek_address, EncodeError, OscArg, OscMessage, MAX_MESSAGE_SIZE};
pub use slip::{encode_frame, max_frame_len, SlipDecoder, SlipError, END, ESC, ESC_END, ESC_ESC};
