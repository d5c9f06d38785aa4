//! SLIP (RFC 1055) packet framing.
//!
//! Frames are written double-ended (`END` before and after the payload) so a
//! receiver that joined mid-stream discards at most one partial frame.

/// Frame delimiter.
pub const END: u8 = 0xC0;

/// Escape introducer.
pub const ESC: u8 = 0xDB;

/// Escaped `END` (follows `ESC`).
pub const ESC_END: u8 = 0xDC;

/// Escaped `ESC` (follows `ESC`).
pub const ESC_ESC: u8 = 0xDD;

/// Worst-case framed size of a payload of `len` bytes.
#[inline]
#[must_use]
pub const fn max_frame_len(len: usize) -> usize {
    2 * len + 2
}

/// Error type for SLIP framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlipError {
    /// The output buffer is too small for the framed payload.
    BufferTooSmall,
    /// An inbound frame exceeded the decoder capacity.
    Overflow,
    /// `ESC` was followed by something other than `ESC_END` / `ESC_ESC`.
    BadEscape,
}

impl core::fmt::Display for SlipError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Overflow => write!(f, "frame overflow"),
            Self::BadEscape => write!(f, "bad escape sequence"),
        }
    }
}

/// Escape `payload` into `buf` as a complete frame.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`SlipError::BufferTooSmall`] if `buf` cannot hold the frame.
pub fn encode_frame(payload: &[u8], buf: &mut [u8]) -> Result<usize, SlipError> {
    let mut pos = 0;
    let mut put = |byte: u8| -> Result<(), SlipError> {
        *buf.get_mut(pos).ok_or(SlipError::BufferTooSmall)? = byte;
        pos += 1;
        Ok(())
    };

    put(END)?;
    for &b in payload {
        match b {
            END => {
                put(ESC)?;
                put(ESC_END)?;
            }
            ESC => {
                put(ESC)?;
                put(ESC_ESC)?;
            }
            _ => put(b)?,
        }
    }
    put(END)?;

    Ok(pos)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Receiving,
    Escaping,
    /// Dropping bytes of a broken frame until the next `END`.
    Discarding,
}

/// Byte-at-a-time SLIP frame decoder holding up to `N` payload bytes.
pub struct SlipDecoder<const N: usize> {
    buffer: [u8; N],
    pos: usize,
    state: DecoderState,
}

impl<const N: usize> SlipDecoder<N> {
    /// Create a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; N],
            pos: 0,
            state: DecoderState::Receiving,
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.state = DecoderState::Receiving;
    }

    /// Number of payload bytes buffered for the frame in progress.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pos
    }

    /// Feed a byte to the decoder.
    ///
    /// Returns `Some(payload)` when an `END` completes a non-empty frame. Empty
    /// frames (back-to-back `END`s) are skipped.
    ///
    /// # Errors
    ///
    /// On [`SlipError::Overflow`] or [`SlipError::BadEscape`] the partial frame is
    /// dropped and everything up to the next `END` is ignored.
    pub fn push_byte(&mut self, byte: u8) -> Result<Option<&[u8]>, SlipError> {
        match (self.state, byte) {
            (DecoderState::Discarding, END) => {
                self.reset();
                Ok(None)
            }
            (DecoderState::Discarding, _) => Ok(None),
            (DecoderState::Escaping, END) => {
                self.reset();
                Err(SlipError::BadEscape)
            }
            (DecoderState::Escaping, ESC_END) => self.store(END),
            (DecoderState::Escaping, ESC_ESC) => self.store(ESC),
            (DecoderState::Escaping, _) => {
                self.discard();
                Err(SlipError::BadEscape)
            }
            (DecoderState::Receiving, END) => {
                let len = self.pos;
                self.reset();
                if len == 0 {
                    Ok(None)
                } else {
                    Ok(Some(&self.buffer[..len]))
                }
            }
            (DecoderState::Receiving, ESC) => {
                self.state = DecoderState::Escaping;
                Ok(None)
            }
            (DecoderState::Receiving, _) => self.store(byte),
        }
    }

    fn store(&mut self, byte: u8) -> Result<Option<&[u8]>, SlipError> {
        if self.pos >= N {
            self.discard();
            return Err(SlipError::Overflow);
        }
        self.buffer[self.pos] = byte;
        self.pos += 1;
        self.state = DecoderState::Receiving;
        Ok(None)
    }

    fn discard(&mut self) {
        self.pos = 0;
        self.state = DecoderState::Discarding;
    }
}

impl<const N: usize> Default for SlipDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn decode_all<const N: usize>(
        decoder: &mut SlipDecoder<N>,
        bytes: &[u8],
    ) -> Vec<Result<Vec<u8>, SlipError>> {
        let mut out = Vec::new();
        for &b in bytes {
            match decoder.push_byte(b) {
                Ok(Some(frame)) => out.push(Ok(frame.to_vec())),
                Ok(None) => {}
                Err(e) => out.push(Err(e)),
            }
        }
        out
    }

    #[test]
    fn test_encode_plain_payload() {
        let mut buf = [0u8; 16];
        let len = encode_frame(b"OK", &mut buf).unwrap();
        assert_eq!(&buf[..len], &[END, b'O', b'K', END]);
    }

    #[test]
    fn test_encode_escapes_specials() {
        let mut buf = [0u8; 16];
        let len = encode_frame(&[0x01, END, ESC, 0x02], &mut buf).unwrap();
        assert_eq!(
            &buf[..len],
            &[END, 0x01, ESC, ESC_END, ESC, ESC_ESC, 0x02, END]
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buf = [0u8; 3];
        assert_eq!(encode_frame(b"OK", &mut buf), Err(SlipError::BufferTooSmall));
    }

    #[test]
    fn test_encode_worst_case_fits_max_frame_len() {
        let payload = [END; 8];
        let mut buf = [0u8; max_frame_len(8)];
        assert_eq!(encode_frame(&payload, &mut buf), Ok(max_frame_len(8)));
    }

    #[test]
    fn test_decode_double_ended_frame() {
        let mut decoder = SlipDecoder::<32>::new();
        let frames = decode_all(&mut decoder, &[END, b'E', b'T', b'C', END]);
        assert_eq!(frames, std::vec![Ok(b"ETC".to_vec())]);
    }

    #[test]
    fn test_decode_single_ended_frames() {
        let mut decoder = SlipDecoder::<32>::new();
        let frames = decode_all(&mut decoder, &[b'a', END, b'b', END]);
        assert_eq!(frames, std::vec![Ok(b"a".to_vec()), Ok(b"b".to_vec())]);
    }

    #[test]
    fn test_decode_unescapes() {
        let mut decoder = SlipDecoder::<32>::new();
        let frames = decode_all(&mut decoder, &[ESC, ESC_END, ESC, ESC_ESC, END]);
        assert_eq!(frames, std::vec![Ok(std::vec![END, ESC])]);
    }

    #[test]
    fn test_decode_bad_escape_resyncs() {
        let mut decoder = SlipDecoder::<32>::new();
        let frames = decode_all(&mut decoder, &[b'x', ESC, b'q', b'y', END, b'z', END]);
        assert_eq!(
            frames,
            std::vec![Err(SlipError::BadEscape), Ok(b"z".to_vec())]
        );
    }

    #[test]
    fn test_decode_overflow_discards_rest_of_frame() {
        let mut decoder = SlipDecoder::<4>::new();
        let frames = decode_all(&mut decoder, b"abcdefg\xC0ok\xC0");
        assert_eq!(
            frames,
            std::vec![Err(SlipError::Overflow), Ok(b"ok".to_vec())]
        );
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_encode_then_decode_binary_payload() {
        let payload: Vec<u8> = (0u8..=255).collect();
        let mut buf = [0u8; max_frame_len(256)];
        let len = encode_frame(&payload, &mut buf).unwrap();

        let mut decoder = SlipDecoder::<256>::new();
        let frames = decode_all(&mut decoder, &buf[..len]);
        assert_eq!(frames, std::vec![Ok(payload)]);
    }
}
