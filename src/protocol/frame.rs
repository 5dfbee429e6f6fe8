//! Frame header layout and the frame type handed to callers.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                  Masking key (if MASK is set)                 |
//! +---------------------------------------------------------------+
//! |                          Payload data                         |
//! +---------------------------------------------------------------+
//! ```

use crate::error::{Error, Result};
use crate::protocol::OpCode;

pub const FIN_BIT: u8 = 0x80;
pub const OPCODE_MASK: u8 = 0x0F;
pub const MASK_BIT: u8 = 0x80;
pub const LEN7_MASK: u8 = 0x7F;

/// Largest payload that fits in the 7-bit length field.
pub const MAX_LEN7: usize = 125;
/// 7-bit marker for a 16-bit extended length.
pub const LEN16_MARKER: u8 = 126;
/// 7-bit marker for a 64-bit extended length.
pub const LEN64_MARKER: u8 = 127;

/// Maximum payload size for control frames (RFC 6455 §5.5).
pub const MAX_CONTROL_FRAME_PAYLOAD: usize = 125;

/// How the payload length is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    /// Length fits in the 7-bit field.
    Short(u8),
    /// Marker 126 followed by a big-endian `u16`.
    Extended16(u16),
    /// Marker 127 followed by a big-endian `u64`.
    Extended64(u64),
}

impl LengthField {
    /// Select the narrowest encoding for a payload of `len` bytes.
    #[must_use]
    pub fn for_len(len: usize) -> Self {
        if len <= MAX_LEN7 {
            LengthField::Short(len as u8)
        } else if let Ok(len) = u16::try_from(len) {
            LengthField::Extended16(len)
        } else {
            LengthField::Extended64(len as u64)
        }
    }

    /// Value of the 7-bit field (without the mask bit).
    #[must_use]
    pub const fn len7(self) -> u8 {
        match self {
            LengthField::Short(len) => len,
            LengthField::Extended16(_) => LEN16_MARKER,
            LengthField::Extended64(_) => LEN64_MARKER,
        }
    }

    /// Number of extended length bytes following the base header.
    #[must_use]
    pub const fn extended_len(self) -> usize {
        match self {
            LengthField::Short(_) => 0,
            LengthField::Extended16(_) => 2,
            LengthField::Extended64(_) => 8,
        }
    }
}

/// Fields parsed from an inbound frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub fin: bool,
    pub opcode: OpCode,
    pub masked: bool,
    /// Resolved payload length, after any extended length field.
    pub payload_len: u64,
}

impl FrameHeader {
    /// Parse the 2-byte base header.
    ///
    /// Returns the header with `payload_len` set to the raw 7-bit value; the
    /// caller resolves 126/127 by reading the extended field.
    ///
    /// # Errors
    ///
    /// - `Error::FragmentedFrame` if FIN is clear or the opcode is Continuation
    /// - `Error::ReservedOpcode` for a reserved opcode
    pub fn parse_base(base: [u8; 2]) -> Result<Self> {
        let fin = base[0] & FIN_BIT != 0;
        let raw_opcode = base[0] & OPCODE_MASK;

        if !fin || raw_opcode == OpCode::Continuation.as_u8() {
            return Err(Error::FragmentedFrame);
        }

        Ok(Self {
            fin,
            opcode: OpCode::from_u8(raw_opcode)?,
            masked: base[1] & MASK_BIT != 0,
            payload_len: u64::from(base[1] & LEN7_MASK),
        })
    }

    /// Bytes of extended length that follow the base header.
    #[must_use]
    pub const fn extended_len(&self) -> usize {
        match self.payload_len {
            126 => 2,
            127 => 8,
            _ => 0,
        }
    }
}

/// A complete frame received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame opcode.
    pub opcode: OpCode,
    payload: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn new(opcode: OpCode, payload: Vec<u8>) -> Self {
        Self { opcode, payload }
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Split into opcode and payload.
    #[must_use]
    pub fn into_parts(self) -> (OpCode, Vec<u8>) {
        (self.opcode, self.payload)
    }

    #[inline]
    #[must_use]
    pub const fn is_control(&self) -> bool {
        self.opcode.is_control()
    }

    /// Payload as UTF-8, for text frames.
    ///
    /// # Errors
    ///
    /// Returns `Utf8Error` if the peer sent invalid UTF-8.
    pub fn as_text(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.payload)
    }

    /// Status code carried by a Close frame.
    ///
    /// Only available when control payloads are preserved; the default
    /// decoder narrows every control payload to empty.
    #[must_use]
    pub fn close_code(&self) -> Option<u16> {
        match (self.opcode, self.payload.as_slice()) {
            (OpCode::Close, [hi, lo, ..]) => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}
