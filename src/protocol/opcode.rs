//! The 4-bit frame type carried in the low nibble of byte 0.

use std::fmt;

use crate::error::{Error, Result};

/// Frame type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// 0x0. Rejected in both directions: fragmentation is not supported.
    Continuation = 0x0,
    /// 0x1, UTF-8 payload.
    Text = 0x1,
    /// 0x2, opaque payload.
    Binary = 0x2,
    /// 0x8, may carry a status code.
    Close = 0x8,
    /// 0x9
    Ping = 0x9,
    /// 0xA
    Pong = 0xA,
}

const ALL: [OpCode; 6] = [
    OpCode::Continuation,
    OpCode::Text,
    OpCode::Binary,
    OpCode::Close,
    OpCode::Ping,
    OpCode::Pong,
];

impl OpCode {
    /// Decode a raw opcode value.
    ///
    /// # Errors
    ///
    /// `Error::ReservedOpcode` for the unassigned nibbles (0x3-0x7, 0xB-0xF);
    /// `Error::InvalidOpcode` for values wider than a nibble.
    pub fn from_u8(raw: u8) -> Result<Self> {
        if raw > 0x0F {
            return Err(Error::InvalidOpcode(raw));
        }
        ALL.into_iter()
            .find(|opcode| opcode.as_u8() == raw)
            .ok_or(Error::ReservedOpcode(raw))
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// High bit of the nibble set: Close, Ping, Pong.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.as_u8() & 0x8 != 0
    }

    /// Text or Binary.
    #[inline]
    #[must_use]
    pub const fn is_data(self) -> bool {
        matches!(self, OpCode::Text | OpCode::Binary)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Continuation => "Continuation",
            OpCode::Text => "Text",
            OpCode::Binary => "Binary",
            OpCode::Close => "Close",
            OpCode::Ping => "Ping",
            OpCode::Pong => "Pong",
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self> {
        Self::from_u8(raw)
    }
}

impl From<OpCode> for u8 {
    fn from(opcode: OpCode) -> Self {
        opcode.as_u8()
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
