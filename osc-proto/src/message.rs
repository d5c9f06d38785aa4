//! Minimal OSC 1.0 message encoding.
//!
//! Only the pieces the bridge sends are supported: a single address with one
//! float (`,f`) or string (`,s`) argument.
//!
//! # Example
//!
//! ```
//! use osc_proto::OscMessage;
//!
//! let mut buf = [0u8; 32];
//! let len = OscMessage::string("/eos/ping", "box1_hello").encode(&mut buf).unwrap();
//! assert_eq!(&buf[..12], b"/eos/ping\0\0\0");
//! assert_eq!(len, 28);
//! ```

/// Largest message the bridge ever encodes.
///
/// Breakdown: longest address `/eos/wheel/coarse/iris` (24 padded) + tag (4) +
/// longest argument (12 for `box1_hello`) = 40. We use 64 for headroom.
pub const MAX_MESSAGE_SIZE: usize = 64;

/// A single OSC argument.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OscArg<'a> {
    /// 32-bit IEEE-754 float, tag `f`.
    Float(f32),
    /// NUL-terminated string, tag `s`.
    Str(&'a str),
}

impl OscArg<'_> {
    #[inline]
    const fn tag(&self) -> u8 {
        match self {
            Self::Float(_) => b'f',
            Self::Str(_) => b's',
        }
    }

    #[inline]
    const fn encoded_len(&self) -> usize {
        match self {
            Self::Float(_) => 4,
            Self::Str(s) => padded_len(s.len()),
        }
    }
}

/// An OSC message with one argument.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OscMessage<'a> {
    /// OSC address pattern, must start with `/`.
    pub address: &'a str,
    /// The message argument.
    pub arg: OscArg<'a>,
}

/// Error type for encoding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The output buffer is too small to hold the encoded bytes.
    BufferTooSmall,
    /// The address does not start with `/`.
    InvalidAddress,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::InvalidAddress => write!(f, "invalid OSC address"),
        }
    }
}

/// Length of an OSC string including its terminator, rounded up to 4 bytes.
#[inline]
const fn padded_len(len: usize) -> usize {
    (len + 4) & !3
}

/// Write `s` followed by NUL padding up to the next 4-byte boundary.
fn write_padded(buf: &mut [u8], s: &[u8]) -> usize {
    let len = padded_len(s.len());
    buf[..s.len()].copy_from_slice(s);
    buf[s.len()..len].fill(0);
    len
}

impl<'a> OscMessage<'a> {
    /// Message with a float argument.
    #[must_use]
    pub const fn float(address: &'a str, value: f32) -> Self {
        Self {
            address,
            arg: OscArg::Float(value),
        }
    }

    /// Message with a string argument.
    #[must_use]
    pub const fn string(address: &'a str, value: &'a str) -> Self {
        Self {
            address,
            arg: OscArg::Str(value),
        }
    }

    /// Number of bytes [`encode`](Self::encode) will write.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        padded_len(self.address.len()) + 4 + self.arg.encoded_len()
    }

    /// Encode into `buf`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::InvalidAddress`] if the address does not start with `/`,
    /// or [`EncodeError::BufferTooSmall`] if `buf` cannot hold the message.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        if !self.address.starts_with('/') {
            return Err(EncodeError::InvalidAddress);
        }
        if buf.len() < self.encoded_len() {
            return Err(EncodeError::BufferTooSmall);
        }

        let mut pos = write_padded(buf, self.address.as_bytes());
        pos += write_padded(&mut buf[pos..], &[b',', self.arg.tag()]);

        match self.arg {
            OscArg::Float(v) => {
                buf[pos..pos + 4].copy_from_slice(&v.to_be_bytes());
                pos += 4;
            }
            OscArg::Str(s) => {
                pos += write_padded(&mut buf[pos..], s.as_bytes());
            }
        }

        Ok(pos)
    }
}

/// Return the address of an OSC message packet, if it looks like one.
///
/// Bundles and non-OSC payloads (like the `ETCOSC?` handshake) return `None`.
#[must_use]
pub fn peek_address(packet: &[u8]) -> Option<&str> {
    if packet.first() != Some(&b'/') {
        return None;
    }
    let end = packet.iter().position(|&b| b == 0)?;
    core::str::from_utf8(&packet[..end]).ok()
}
