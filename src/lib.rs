//! # wsframe - minimal blocking WebSocket client
//!
//! `wsframe` speaks the client side of RFC 6455 over one blocking byte
//! stream: it performs the HTTP upgrade handshake, then exchanges single,
//! unfragmented frames with the server.
//!
//! ## Features
//!
//! - **Handshake** with per-connection nonce and `Sec-WebSocket-Accept` check
//! - **Frame encoder** that always sets FIN and always masks
//! - **Frame decoder** that reads straight off the transport, one frame per call
//! - **Injectable entropy** for deterministic mask keys and nonces in tests
//! - **Generic transport**: anything `Read + Write`, with `TcpStream` built in
//!
//! Fragmented messages, extensions, TLS and server roles are not supported.
//! Control frames are surfaced to the caller, never answered automatically.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wsframe::Client;
//!
//! let mut client = Client::connect("localhost", 5000, "/")?;
//! client.send_text("Hello!")?;
//! let frame = client.receive()?;
//! println!("{}: {}", frame.opcode, String::from_utf8_lossy(frame.payload()));
//! # Ok::<(), wsframe::Error>(())
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod transport;

pub use config::{Config, Limits, Timeouts};
pub use connection::{Client, ConnectionState};
pub use error::{Error, ErrorKind, Result};
pub use protocol::{
    Entropy, FixedEntropy, Frame, FrameDecoder, FrameEncoder, OpCode, SystemEntropy,
    compute_accept_key,
};
pub use transport::Transport;
