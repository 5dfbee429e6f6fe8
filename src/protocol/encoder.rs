//! Outbound frame serialization.
//!
//! Client frames are always final (FIN set) and always masked.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::entropy::{Entropy, SystemEntropy};
use crate::protocol::frame::{FIN_BIT, LengthField, MASK_BIT, MAX_CONTROL_FRAME_PAYLOAD};
use crate::protocol::mask::apply_mask_fast;
use crate::protocol::OpCode;

/// Total wire size of a masked frame carrying `payload_len` bytes.
#[must_use]
pub fn wire_size(payload_len: usize) -> usize {
    2 + LengthField::for_len(payload_len).extended_len() + 4 + payload_len
}

/// Serialize a single masked, final frame with the given key.
///
/// Pure: the same inputs always give the same bytes.
#[must_use]
pub fn encode_frame(opcode: OpCode, payload: &[u8], mask: [u8; 4]) -> Bytes {
    let length = LengthField::for_len(payload.len());
    let mut buf = BytesMut::with_capacity(wire_size(payload.len()));

    buf.put_u8(FIN_BIT | opcode.as_u8());
    buf.put_u8(MASK_BIT | length.len7());
    match length {
        LengthField::Short(_) => {}
        LengthField::Extended16(len) => buf.put_u16(len),
        LengthField::Extended64(len) => buf.put_u64(len),
    }
    buf.put_slice(&mask);

    let start = buf.len();
    buf.put_slice(payload);
    apply_mask_fast(&mut buf[start..], mask);

    buf.freeze()
}

/// Frame encoder that draws a fresh mask key for every frame.
#[derive(Debug, Clone, Default)]
pub struct FrameEncoder<E = SystemEntropy> {
    entropy: E,
}

impl<E: Entropy> FrameEncoder<E> {
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    pub fn entropy_mut(&mut self) -> &mut E {
        &mut self.entropy
    }

    /// Encode `payload` as a single frame.
    ///
    /// # Errors
    ///
    /// - `Error::FragmentedFrame` for the Continuation opcode
    /// - `Error::ControlFrameTooLarge` for a control payload over 125 bytes
    /// - `Error::Entropy` if no mask key could be drawn
    pub fn encode(&mut self, opcode: OpCode, payload: &[u8]) -> Result<Bytes> {
        if opcode == OpCode::Continuation {
            return Err(Error::FragmentedFrame);
        }
        if opcode.is_control() && payload.len() > MAX_CONTROL_FRAME_PAYLOAD {
            return Err(Error::ControlFrameTooLarge(payload.len()));
        }
        let mask = self.entropy.mask_key()?;
        Ok(encode_frame(opcode, payload, mask))
    }
}
