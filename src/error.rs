//! Error types for the WebSocket client.
//!
//! Every failure the engine can report is a variant of [`Error`]. Variants are
//! grouped into coarse categories by [`Error::kind`] so callers can tell a dead
//! socket from a misbehaving peer without matching every variant.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Result type alias for WebSocket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The byte stream failed, hung up, or could not be set up.
    Transport,
    /// The HTTP upgrade exchange did not produce a WebSocket connection.
    Handshake,
    /// The peer sent a frame this client does not accept.
    Protocol,
    /// The caller used the client in a state that does not allow the operation.
    Usage,
}

/// Errors that can occur during WebSocket operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// I/O error reported by the transport.
    #[error("I/O error: {0}")]
    Io(String),

    /// The peer closed the stream before the expected bytes arrived.
    #[error("Peer hung up during {0}")]
    PeerClosed(&'static str),

    /// The entropy source could not produce random bytes.
    #[error("Entropy source failure: {0}")]
    Entropy(String),

    /// The upgrade response was not an acceptable `101 Switching Protocols`.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// The upgrade response head grew past the configured limit.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Bytes accumulated so far.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// `Sec-WebSocket-Accept` does not match the key that was sent.
    #[error("Sec-WebSocket-Accept mismatch: expected {expected}, got {actual}")]
    AcceptKeyMismatch {
        /// Value derived from the request key.
        expected: String,
        /// Value returned by the server.
        actual: String,
    },

    /// A value destined for a request header contains forbidden characters.
    #[error("Invalid value for header {header}: {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A non-final or continuation frame was received or requested.
    #[error("Fragmented frames are not supported")]
    FragmentedFrame,

    /// Reserved opcode used.
    #[error("Reserved opcode: {0:#x}")]
    ReservedOpcode(u8),

    /// Invalid opcode value.
    #[error("Invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    /// Declared frame payload exceeds the configured maximum.
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge {
        /// Declared payload length.
        size: u64,
        /// Maximum allowed payload length.
        max: u64,
    },

    /// Control frame payload too large (>125 bytes).
    #[error("Control frame payload too large: {0} bytes (max: 125)")]
    ControlFrameTooLarge(usize),

    /// Operation attempted while the connection is not open.
    #[error("Connection is not open (state: {0})")]
    NotOpen(ConnectionState),
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::PeerClosed(_) | Error::Entropy(_) => ErrorKind::Transport,
            Error::InvalidHandshake(_)
            | Error::HandshakeTooLarge { .. }
            | Error::AcceptKeyMismatch { .. }
            | Error::InvalidHeaderValue { .. } => ErrorKind::Handshake,
            Error::FragmentedFrame
            | Error::ReservedOpcode(_)
            | Error::InvalidOpcode(_)
            | Error::FrameTooLarge { .. }
            | Error::ControlFrameTooLarge(_) => ErrorKind::Protocol,
            Error::NotOpen(_) => ErrorKind::Usage,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<getrandom::Error> for Error {
    fn from(err: getrandom::Error) -> Self {
        Error::Entropy(err.to_string())
    }
}
