//! Configuration and limits for the WebSocket client.

use std::time::Duration;

/// Resource limits applied while talking to the peer.
///
/// These bound how much memory a misbehaving server can make the client
/// allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum payload length of a single inbound frame in bytes.
    ///
    /// Checked against the declared length before the payload is read.
    ///
    /// Default: 16 MB (16 * 1024 * 1024)
    pub max_frame_size: u64,

    /// Maximum size of the handshake response head in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024, // 16 MB
            max_handshake_size: 8192,
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_frame_size: u64, max_handshake_size: usize) -> Self {
        Self {
            max_frame_size,
            max_handshake_size,
        }
    }

    /// Limits that accept any frame the wire format can describe.
    ///
    /// Warning: Use only against trusted peers.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            max_frame_size: u64::MAX,
            max_handshake_size: 64 * 1024,
        }
    }

    /// Validate that a declared frame length is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameTooLarge`](crate::Error::FrameTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_frame_size(&self, size: u64) -> Result<(), crate::Error> {
        if size > self.max_frame_size {
            Err(crate::Error::FrameTooLarge {
                size,
                max: self.max_frame_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that the accumulated handshake response is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`](crate::Error::HandshakeTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_handshake_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_handshake_size {
            Err(crate::Error::HandshakeTooLarge {
                size,
                max: self.max_handshake_size,
            })
        } else {
            Ok(())
        }
    }
}

/// Socket timeouts applied by [`Client::connect`](crate::Client::connect).
///
/// The engine itself has no notion of time; these are handed to the
/// `TcpStream` and surface as I/O errors when they fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Maximum time a single read may block.
    ///
    /// Default: 60 seconds
    pub read: Duration,

    /// Maximum time a single write may block.
    ///
    /// Default: 60 seconds
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(60),
            write: Duration::from_secs(60),
        }
    }
}

impl Timeouts {
    /// Create new timeouts with custom values.
    #[must_use]
    pub const fn new(read: Duration, write: Duration) -> Self {
        Self { read, write }
    }
}

/// WebSocket client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Resource limits.
    pub limits: Limits,

    /// Fixed `Sec-WebSocket-Key` to send instead of a fresh nonce.
    ///
    /// Only useful for deterministic tests against a scripted peer.
    /// Default: None
    pub handshake_key: Option<String>,

    /// `Origin` header value, omitted when `None`.
    ///
    /// Default: None
    pub origin: Option<String>,

    /// Check `Sec-WebSocket-Accept` against the key that was sent.
    ///
    /// When disabled the handshake succeeds on the status line alone.
    ///
    /// Default: true
    pub verify_accept_key: bool,

    /// Deliver Close/Ping/Pong payloads instead of narrowing them to empty.
    ///
    /// Default: false
    pub preserve_control_payloads: bool,

    /// Size of each read while accumulating the handshake response.
    ///
    /// Default: 1024
    pub read_chunk_size: usize,

    /// Socket timeouts.
    ///
    /// If `None`, reads and writes block indefinitely.
    /// Default: None
    pub timeouts: Option<Timeouts>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            handshake_key: None,
            origin: None,
            verify_accept_key: true,
            preserve_control_payloads: false,
            read_chunk_size: 1024,
            timeouts: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Send a fixed `Sec-WebSocket-Key` instead of a random nonce.
    #[must_use]
    pub fn with_handshake_key(mut self, key: impl Into<String>) -> Self {
        self.handshake_key = Some(key.into());
        self
    }

    /// Send an `Origin` header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Enable or disable `Sec-WebSocket-Accept` verification.
    #[must_use]
    pub fn with_accept_verification(mut self, verify: bool) -> Self {
        self.verify_accept_key = verify;
        self
    }

    /// Deliver control frame payloads to the caller.
    #[must_use]
    pub fn with_control_payloads(mut self, preserve: bool) -> Self {
        self.preserve_control_payloads = preserve;
        self
    }

    /// Set handshake read chunk size. Zero is treated as one.
    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = if size == 0 { 1 } else { size };
        self
    }

    /// Set socket timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }
}
