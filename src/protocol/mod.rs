//! WebSocket protocol core: handshake, frame encoding and decoding (RFC 6455).

pub mod decoder;
pub mod encoder;
pub mod entropy;
pub mod frame;
pub mod handshake;
pub mod mask;
pub mod opcode;

pub use decoder::FrameDecoder;
pub use encoder::{FrameEncoder, encode_frame};
pub use entropy::{Entropy, FixedEntropy, SystemEntropy};
pub use frame::{Frame, FrameHeader, LengthField};
pub use handshake::{HandshakeRequest, HandshakeResponse, WS_GUID, compute_accept_key};
pub use mask::{apply_mask, apply_mask_fast};
pub use opcode::OpCode;
