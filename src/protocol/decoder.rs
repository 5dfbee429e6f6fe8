//! Inbound frame decoding straight off a blocking transport.

use std::io::Read;

use log::trace;

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::protocol::frame::{Frame, FrameHeader};
use crate::protocol::mask::apply_mask_fast;
use crate::transport::read_exact;

const STAGE: &str = "frame";

/// Reads one complete frame per call.
///
/// Only final Text, Binary, Close, Ping and Pong frames are accepted.
/// Control frame payloads are read off the wire and, unless
/// `preserve_control_payloads` is set, replaced by an empty payload.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    limits: Limits,
    preserve_control_payloads: bool,
}

impl FrameDecoder {
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            preserve_control_payloads: false,
        }
    }

    /// Deliver Close/Ping/Pong payloads as received.
    #[must_use]
    pub fn with_control_payloads(mut self, preserve: bool) -> Self {
        self.preserve_control_payloads = preserve;
        self
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Read the header and resolve the true payload length.
    ///
    /// # Errors
    ///
    /// - `Error::FragmentedFrame` for FIN=0 or a Continuation opcode
    /// - `Error::ReservedOpcode` for an unsupported opcode
    /// - `Error::PeerClosed` / `Error::Io` from the transport
    pub fn read_header<R: Read + ?Sized>(&self, io: &mut R) -> Result<FrameHeader> {
        let mut base = [0u8; 2];
        read_exact(io, &mut base, STAGE)?;
        let mut header = FrameHeader::parse_base(base)?;

        match header.extended_len() {
            2 => {
                let mut len = [0u8; 2];
                read_exact(io, &mut len, STAGE)?;
                header.payload_len = u64::from(u16::from_be_bytes(len));
            }
            8 => {
                let mut len = [0u8; 8];
                read_exact(io, &mut len, STAGE)?;
                header.payload_len = u64::from_be_bytes(len);
            }
            _ => {}
        }

        Ok(header)
    }

    /// Read one frame.
    ///
    /// # Errors
    ///
    /// Everything `read_header` reports, plus `Error::FrameTooLarge` when the
    /// declared length is over the limit or cannot be allocated. No payload
    /// is allocated in that case.
    pub fn decode<R: Read + ?Sized>(&self, io: &mut R) -> Result<Frame> {
        let header = self.read_header(io)?;
        self.limits.check_frame_size(header.payload_len)?;
        let payload_len = usize::try_from(header.payload_len).map_err(|_| Error::FrameTooLarge {
            size: header.payload_len,
            max: usize::MAX as u64,
        })?;

        let mask = if header.masked {
            let mut key = [0u8; 4];
            read_exact(io, &mut key, STAGE)?;
            Some(key)
        } else {
            None
        };

        let mut payload = Vec::new();
        payload
            .try_reserve_exact(payload_len)
            .map_err(|_| Error::FrameTooLarge {
                size: header.payload_len,
                max: self.limits.max_frame_size,
            })?;
        payload.resize(payload_len, 0);
        read_exact(io, &mut payload, STAGE)?;
        if let Some(key) = mask {
            apply_mask_fast(&mut payload, key);
        }

        trace!(
            "received {} frame, {} payload bytes, masked={}",
            header.opcode, payload_len, header.masked
        );

        if header.opcode.is_control() && !self.preserve_control_payloads {
            payload.clear();
        }
        Ok(Frame::new(header.opcode, payload))
    }
}
